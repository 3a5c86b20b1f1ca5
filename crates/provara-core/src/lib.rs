//! # provara-core — Foundational Types for the Provara Engine
//!
//! This crate is the bedrock of the Provara attestation and registry
//! engine. It defines the type-system primitives that enforce correctness
//! guarantees at compile time. Every other crate in the workspace depends
//! on `provara-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `EntityKey`,
//!    `VerificationId`, `SlotIndex` — validated constructors, no bare
//!    strings or integers crossing crate boundaries.
//!
//! 2. **`CanonicalBytes` newtype.** ALL digest and signature input flows
//!    through `CanonicalBytes::new()`. No raw `serde_json::to_vec()` for
//!    digests. Ever. This prevents the canonicalization split defect class
//!    by construction.
//!
//! 3. **Single `AttestationDomain` enum.** One definition, five oracle
//!    authorities, exhaustive `match` everywhere. Adding a domain forces
//!    every consumer — layouts, rulesets, key rings — to handle it.
//!
//! 4. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision, matching the JCS canonicalization rules.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `provara-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize` unless secrecy forbids it.

pub mod canonical;
pub mod digest;
pub mod domain;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use domain::{AttestationDomain, ATTESTATION_DOMAIN_COUNT};
pub use error::ProvaraError;
pub use identity::{EntityKey, SlotIndex, VerificationId};
pub use temporal::Timestamp;
