//! # provara-compose — Proof Composition Chain
//!
//! Chains independently generated domain proofs into one lineage-tracked
//! artifact: level 1 wraps a single domain proof, level *n* folds one more
//! into a valid level *n−1* composition. The top level's public output
//! aggregates every domain's compliance score and ANDs their verdicts,
//! while the lineage hashes let any observer verify which underlying
//! proofs contributed — without re-disclosing their private contents.
//!
//! - **Chain** (`chain.rs`): `CompositionPlan` (the fixed domain order) and
//!   `ProofComposer::compose` with strict ordering — composition is built
//!   level by level, never assembled out of order, even though the logical
//!   AND of verdicts is order-independent.
//! - **Archive** (`archive.rs`): retrieval of composed proofs by entity
//!   identity and by lineage hash, for audit without re-running
//!   verification.

pub mod archive;
pub mod chain;

pub use archive::ProofArchive;
pub use chain::{
    ComposedProof, CompositionError, CompositionPlan, LineageLink, ProofComposer,
};
