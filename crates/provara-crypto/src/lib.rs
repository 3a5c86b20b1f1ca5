//! # provara-crypto — Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for the Provara engine:
//!
//! - **Ed25519** authority signing and verification for oracle attestations.
//! - **`Hash32`** — the raw 32-byte hash used for tree roots, slot leaves,
//!   and composition lineage links.
//! - **Slot tree** — the fixed-depth Merkle tree with selective-disclosure
//!   openings, shared by document encoding and the entity registry.
//!
//! ## Hashing Discipline
//!
//! Two hash paths exist, deliberately separate:
//!
//! 1. Application values → `CanonicalBytes` → `ContentDigest`
//!    (in `provara-core`): content addressing of structured data.
//! 2. Tree material → domain-separated SHA-256 (`0x00` leaf, `0x01` node
//!    prefixes) → `Hash32` (here): authenticated-structure internals.
//!
//! The prefixes make a leaf hash unusable as an interior node and vice
//! versa, so no second-preimage can move material between tree levels.
//!
//! ## Crate Policy
//!
//! - Depends only on `provara-core` internally.
//! - No mocking of cryptographic operations in tests — all tests use real
//!   `CanonicalBytes`, real SHA-256, real Ed25519.
//! - `unsafe` prohibited.

pub mod hash32;
pub mod signing;
pub mod slot_tree;

pub use hash32::Hash32;
pub use signing::{verify, AuthorityKeypair, AuthorityPublicKey, AuthoritySignature};
pub use slot_tree::{empty_leaf_hash, leaf_hash, node_hash, SlotOpening, SlotTree};
