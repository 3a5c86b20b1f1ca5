//! # provara-document — Field Layouts and the Document Merkle Builder
//!
//! Converts parsed compliance documents (arbitrary nested JSON objects)
//! into fixed-depth Merkle trees supporting selective disclosure:
//!
//! - **Layout** (`layout.rs`): the per-document-type mapping from semantic
//!   field name to tree slot, with encodings, mandatory flags, and field
//!   bundles. The `LayoutRegistry` is append-only — remapping a live field
//!   would invalidate historical proofs and is rejected.
//! - **Normalization** (`normalize.rs`): the deterministic value-to-string
//!   policy applied before hashing (truncation, stringification, count vs
//!   bundle encoding for arrays, canonical empty values).
//! - **Builder** (`builder.rs`): `build(layout, document)` — the pure
//!   function producing an immutable [`DocumentTree`] whose root is
//!   attested by the oracle and whose openings feed the compliance circuit.
//!
//! ## Determinism Invariant
//!
//! Two documents with identical normalized field values produce identical
//! roots. Every non-determinism source (map ordering, float formatting,
//! locale) is excluded by the normalization policy and the slot-tree
//! hashing discipline.
//!
//! ## Crate Policy
//!
//! - Building is a pure function of `(layout, document)` — no I/O, no
//!   clock, no randomness.
//! - Missing mandatory fields are reported all at once, before any hashing.

pub mod builder;
pub mod layout;
pub mod normalize;

pub use builder::{build, BuildError, BuiltSlot, DocumentTree};
pub use layout::{
    standard_layouts, DocumentLayout, FieldEncoding, FieldSpec, LayoutError, LayoutRegistry,
    SlotSpec,
};
pub use normalize::{FieldValue, MAX_FIELD_CHARS};
