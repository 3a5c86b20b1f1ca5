//! # Document Merkle Builder
//!
//! `build(layout, document)` — the pure function converting a parsed
//! document into its fixed-depth Merkle encoding. Each declared slot hashes
//! the normalized value of its field (or bundle); undeclared slots keep the
//! empty-leaf hash, so the tree shape is constant per layout.
//!
//! ## Failure Policy
//!
//! Missing optional fields substitute the canonical empty representation
//! and never fail. Missing *mandatory* fields are a hard failure raised
//! before any hashing, and the error lists every missing field at once —
//! compliance review workflows need the complete gap list, not the first
//! miss.

use serde_json::Value;
use thiserror::Error;

use provara_core::{AttestationDomain, SlotIndex};
use provara_crypto::slot_tree::SlotTreeError;
use provara_crypto::{leaf_hash, Hash32, SlotOpening, SlotTree};

use crate::layout::{DocumentLayout, FieldSpec, SlotSpec};
use crate::normalize::{join_bundle, normalize, FieldValue};

/// Error building a document tree.
#[derive(Error, Debug)]
pub enum BuildError {
    /// One or more mandatory fields are absent. Lists every missing field.
    #[error("document {document_type} is missing mandatory fields: {fields:?}")]
    MissingMandatoryFields {
        /// The document type being built.
        document_type: String,
        /// Every missing mandatory field name, sorted.
        fields: Vec<String>,
    },

    /// A field carried a value the normalization policy refuses.
    #[error("field {field:?} has unsupported value: {reason}")]
    UnsupportedValue {
        /// The offending field name.
        field: String,
        /// Why the value was refused.
        reason: String,
    },

    /// A disclosure request named a field the layout does not declare.
    #[error("unknown field {0:?} for this layout")]
    UnknownField(String),

    /// Tree construction failed (layout/tree depth mismatch).
    #[error(transparent)]
    Tree(#[from] SlotTreeError),
}

/// One built slot: the normalized value and its leaf hash.
#[derive(Debug, Clone)]
pub struct BuiltSlot {
    /// The slot index.
    pub index: SlotIndex,
    /// The revealed name (field name or bundle name).
    pub name: String,
    /// The normalized value that was hashed.
    pub normalized: String,
    /// The leaf hash stored in the tree.
    pub leaf: Hash32,
}

/// The Merkle encoding of one document: root, per-slot values, and the
/// tree needed to produce openings.
///
/// Immutable after construction; discarded after proof generation (only
/// the root and selected openings persist downstream).
#[derive(Debug, Clone)]
pub struct DocumentTree {
    domain: AttestationDomain,
    root: Hash32,
    slots: Vec<BuiltSlot>,
    tree: SlotTree,
}

impl DocumentTree {
    /// The document type this tree encodes.
    pub fn domain(&self) -> AttestationDomain {
        self.domain
    }

    /// The Merkle root over all slots.
    pub fn root(&self) -> Hash32 {
        self.root
    }

    /// The built slots, in index order.
    pub fn slots(&self) -> &[BuiltSlot] {
        &self.slots
    }

    /// The normalized value of a named slot.
    pub fn normalized(&self, name: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.normalized.as_str())
    }

    /// Produce the opening for a named slot together with its normalized
    /// value — the selective-disclosure unit handed to the circuit.
    pub fn open(&self, name: &str) -> Result<(String, SlotOpening), BuildError> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| BuildError::UnknownField(name.to_string()))?;
        let opening = self.tree.opening(slot.index)?;
        Ok((slot.normalized.clone(), opening))
    }
}

/// Build the Merkle encoding of a parsed document under a layout.
///
/// Pure function of `(layout, document)`: same normalized field values,
/// same root — the determinism requirement regression tests rely on.
///
/// # Errors
///
/// [`BuildError::MissingMandatoryFields`] if any mandatory field is absent
/// (listing all of them, checked before any hashing);
/// [`BuildError::UnsupportedValue`] for values the normalization policy
/// refuses (e.g. floats).
pub fn build(layout: &DocumentLayout, document: &Value) -> Result<DocumentTree, BuildError> {
    // Validation pass: collect every missing mandatory field first.
    let mut missing: Vec<String> = Vec::new();
    for (_, spec) in layout.slots() {
        for field in spec.mandatory_fields() {
            if extract(document, field)?.is_missing() {
                missing.push(field.name.clone());
            }
        }
    }
    if !missing.is_empty() {
        missing.sort();
        return Err(BuildError::MissingMandatoryFields {
            document_type: layout.domain.to_string(),
            fields: missing,
        });
    }

    // Encoding pass: normalize and hash every declared slot.
    let mut tree = SlotTree::new(layout.depth)?;
    let mut slots = Vec::new();
    for (index, spec) in layout.slots() {
        let normalized = match spec {
            SlotSpec::Field(field) => {
                let value = extract(document, field)?;
                normalize(&value, field.encoding)
            }
            SlotSpec::Bundle { members, .. } => {
                let parts: Result<Vec<String>, BuildError> = members
                    .iter()
                    .map(|m| Ok(normalize(&extract(document, m)?, m.encoding)))
                    .collect();
                join_bundle(&parts?)
            }
        };
        let leaf = leaf_hash(normalized.as_bytes());
        tree.set_leaf(*index, leaf)?;
        slots.push(BuiltSlot {
            index: *index,
            name: spec.name().to_string(),
            normalized,
            leaf,
        });
    }

    let root = tree.root();
    Ok(DocumentTree {
        domain: layout.domain,
        root,
        slots,
        tree,
    })
}

/// Extract a field's raw value from the parsed document by dotted path.
fn extract(document: &Value, field: &FieldSpec) -> Result<FieldValue, BuildError> {
    let mut current = document;
    for segment in field.path.split('.') {
        match current.get(segment) {
            Some(v) => current = v,
            None => return Ok(FieldValue::Missing),
        }
    }
    to_field_value(current, &field.name)
}

/// Convert a JSON value into a `FieldValue`, refusing what the
/// normalization policy cannot represent deterministically.
fn to_field_value(value: &Value, field_name: &str) -> Result<FieldValue, BuildError> {
    match value {
        Value::Null => Ok(FieldValue::Missing),
        Value::String(s) => Ok(FieldValue::Text(s.clone())),
        Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
        Value::Number(n) => n.as_i64().map(FieldValue::Integer).ok_or_else(|| {
            BuildError::UnsupportedValue {
                field: field_name.to_string(),
                reason: format!("non-integer number {n} (floats are not permitted)"),
            }
        }),
        Value::Array(items) => {
            let mut elements = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => elements.push(s.clone()),
                    Value::Number(n) if n.as_i64().is_some() => elements.push(n.to_string()),
                    Value::Bool(b) => elements.push(b.to_string()),
                    other => {
                        return Err(BuildError::UnsupportedValue {
                            field: field_name.to_string(),
                            reason: format!("array element {other} is not a scalar"),
                        })
                    }
                }
            }
            Ok(FieldValue::List(elements))
        }
        Value::Object(_) => Err(BuildError::UnsupportedValue {
            field: field_name.to_string(),
            reason: "nested object where a scalar field was declared".to_string(),
        }),
    }
}
