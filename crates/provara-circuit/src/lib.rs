//! # provara-circuit — Compliance Predicate Circuit
//!
//! Evaluates a domain's compliance predicates over selectively disclosed
//! document fields, gated by the attested Merkle root and the oracle
//! signature, and emits a public verdict:
//!
//! - **Predicates** (`predicate.rs`): the six composable predicate kinds
//!   (status-equality, status-exclusion, temporal-window, non-empty,
//!   count-threshold, pattern-match) and their fail-closed evaluation.
//! - **Rulesets** (`ruleset.rs`): the table-driven per-domain predicate
//!   sets — one generic evaluator parameterized by domain instead of one
//!   hand-written circuit per document type. Core predicates decide
//!   compliance; enhanced predicates report a separate pass count.
//! - **Output** (`output.rs`): the public, non-secret circuit output —
//!   verdict, pass counts, score, and designated disclosed-field hashes.
//! - **Prover** (`prover.rs`): `prove()` with refusal semantics — a caller
//!   cannot obtain a "compliant" proof from wrong data; cryptographic
//!   inconsistency aborts proof production entirely.
//! - **Policy** (`policy.rs`): the proof-backend gate. The transparent
//!   deterministic backend stands in for the external proving engine and
//!   is rejected in production mode.
//!
//! ## Refusal Semantics
//!
//! The circuit does not produce a "false" proof on bad input — it refuses
//! to produce one. A failed verification is therefore always visibly
//! distinct from a valid proof of non-compliance.

pub mod output;
pub mod policy;
pub mod predicate;
pub mod prover;
pub mod ruleset;

pub use output::PublicOutput;
pub use policy::{PolicyError, PolicyMode, ProofBackend, ProofPolicy};
pub use predicate::{FieldPattern, Predicate};
pub use prover::{prove, CircuitError, CircuitWitness, ComplianceProof, RevealedSlot};
pub use ruleset::PredicateSet;
