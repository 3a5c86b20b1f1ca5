//! # provara-registry — Proof-Gated Compliance Registry
//!
//! The persistent multi-entity registry: a Merkle tree keyed by entity
//! identity whose leaves are compliance-record hashes, updated only
//! alongside a valid circuit proof and a Merkle opening of the prior state.
//!
//! - **Records** (`record.rs`): `ComplianceRecord` — derived from a proof's
//!   public output, never from caller-supplied flags.
//! - **Registry** (`registry.rs`): the state machine — proof-gated
//!   insert/update with the vacant/occupied branch proven by opening,
//!   aggregate statistics, administrative resets with monotonic
//!   versioning, and the single-writer discipline.
//! - **Anchor** (`anchor.rs`): the append-only ledger commit boundary the
//!   registry pushes every accepted root transition into.
//!
//! ## Trust Model
//!
//! The registry never trusts a caller-supplied "is compliant" flag in
//! isolation. Every state-changing call is paired with a cryptographic
//! proof whose public output is the source of truth for the flags being
//! written, and a Merkle opening proving knowledge of the record being
//! replaced (or of the empty slot, for first insertion).

pub mod anchor;
pub mod record;
pub mod registry;

pub use anchor::{AnchorError, InMemoryLedger, LedgerAnchor, LedgerEntry};
pub use record::{ComplianceRecord, StatusFlags, RECORD_SCORE_FLOOR};
pub use registry::{
    ComplianceRegistry, PriorState, RegistryError, RegistryState, REGISTRY_TREE_DEPTH,
};
