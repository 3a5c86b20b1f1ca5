//! # Value Normalization Policy
//!
//! The deterministic mapping from raw document field values to the strings
//! that get leaf-hashed into a document tree. Normalization runs before any
//! cryptographic work, and its output is the only representation the
//! circuit ever sees for a revealed field.
//!
//! ## Rules
//!
//! - Strings are truncated to [`MAX_FIELD_CHARS`] characters (the in-circuit
//!   hash input bound of the external proving engine).
//! - Integers and booleans are stringified deterministically (`42`, `true`).
//! - Floats are rejected — the same policy as canonical serialization.
//! - Arrays encode either as their element count (existence checks) or as a
//!   bundled value, per the layout's encoding declaration.
//! - Missing/null fields substitute the canonical empty representation for
//!   their encoding: `"0"` for counts, `"false"` for booleans, `""`
//!   otherwise. Mandatory fields never reach this path — they are rejected
//!   by the builder first.
//! - Bundled components are joined with the 0x1F unit separator, so
//!   `["a", "bc"]` and `["ab", "c"]` normalize differently.

use crate::layout::FieldEncoding;

/// Maximum characters of a string field that participate in hashing.
pub const MAX_FIELD_CHARS: usize = 128;

/// The unit separator joining bundled field components before hashing.
pub const BUNDLE_SEPARATOR: char = '\u{1f}';

/// A raw document field value, extracted from the parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A string value.
    Text(String),
    /// An integer value (floats are rejected at extraction).
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
    /// An array of stringified scalar elements.
    List(Vec<String>),
    /// The field is absent or null in the document.
    Missing,
}

impl FieldValue {
    /// Whether the value is absent.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Normalize a field value under its declared encoding.
///
/// This is total: every `(value, encoding)` pair has a deterministic
/// normalized string, including `Missing` (the canonical empty value).
pub fn normalize(value: &FieldValue, encoding: FieldEncoding) -> String {
    match value {
        FieldValue::Missing => canonical_empty(encoding),
        FieldValue::Text(s) => truncate_chars(s, MAX_FIELD_CHARS),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
        FieldValue::List(items) => match encoding {
            FieldEncoding::Count => items.len().to_string(),
            _ => {
                let joined: Vec<String> = items
                    .iter()
                    .map(|s| truncate_chars(s, MAX_FIELD_CHARS))
                    .collect();
                joined.join(&BUNDLE_SEPARATOR.to_string())
            }
        },
    }
}

/// The canonical empty representation for an encoding.
pub fn canonical_empty(encoding: FieldEncoding) -> String {
    match encoding {
        FieldEncoding::Count => "0".to_string(),
        FieldEncoding::Boolean => "false".to_string(),
        FieldEncoding::Pattern | FieldEncoding::Enum | FieldEncoding::Opaque => String::new(),
    }
}

/// Join already-normalized bundle components into the single bundled value.
pub fn join_bundle(parts: &[String]) -> String {
    parts.join(&BUNDLE_SEPARATOR.to_string())
}

/// Truncate a string to at most `max` characters (not bytes).
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
