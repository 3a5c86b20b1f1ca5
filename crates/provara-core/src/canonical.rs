//! # Canonical Serialization — JCS-Compatible Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes used in
//! digest computation and signing across the Provara engine.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which applies value
//! coercion (float rejection) before RFC 8785 (JCS) serialization.
//!
//! Attestation messages, record leaves, proof statements, and composed
//! lineage digests are all hashed or signed over `CanonicalBytes`. Any
//! function requiring canonical input must accept `&CanonicalBytes`, and
//! the only way to produce one is through the correct pipeline — two code
//! paths can therefore never disagree about the byte encoding of the same
//! value.
//!
//! ## Coercion Rules
//!
//! 1. **Reject floats** — predicate thresholds and scores are integers;
//!    floats have non-deterministic canonical-number edge cases.
//! 2. **Object keys are strings** — guaranteed by `serde_json::Map`.
//! 3. **Timestamps serialize as ISO8601 `Z` strings** — enforced by the
//!    [`Timestamp`](crate::temporal::Timestamp) type, not here.
//!
//! After coercion, serialization uses `serde_jcs`: sorted keys, compact
//! separators, deterministic byte sequence.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization with Provara's
/// value-coercion rules.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - All numeric values are integers, never floats.
/// - All object keys are strings.
/// - Serialization is RFC 8785 compliant: sorted keys, compact separators.
///
/// These invariants are enforced by the constructor and cannot be violated
/// by downstream code because the inner `Vec<u8>` is private.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// This is the ONLY way to construct `CanonicalBytes`. All digest and
    /// signature computation in the workspace must flow through here.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains
    /// non-integer numbers. Returns
    /// `CanonicalizationError::SerializationFailed` if JCS serialization
    /// fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest or signature computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively reject non-integer numbers anywhere in the value tree.
///
/// Integers representable as `i64`/`u64` pass; everything `is_f64`-only is
/// refused. Null, bool, and string values pass through untouched.
fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Object(map) => {
            for v in map.values() {
                reject_floats(v)?;
            }
            Ok(())
        }
        Value::Array(arr) => {
            for v in arr {
                reject_floats(v)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_keys_compact_separators() {
        let data = serde_json::json!({"root": "ab12", "domain": "legal_entity"});
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"domain":"legal_entity","root":"ab12"}"#);
    }

    #[test]
    fn test_nested_objects_sorted() {
        let data = serde_json::json!({
            "output": {"score": 100, "compliant": true},
            "level": 2
        });
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"level":2,"output":{"compliant":true,"score":100}}"#);
    }

    #[test]
    fn test_float_rejection() {
        let data = serde_json::json!({"score": 99.5});
        let result = CanonicalBytes::new(&data);
        match result.unwrap_err() {
            CanonicalizationError::FloatRejected(f) => assert_eq!(f, 99.5),
            other => panic!("expected FloatRejected, got: {other}"),
        }
    }

    #[test]
    fn test_deeply_nested_float_rejected() {
        let data = serde_json::json!({"a": {"b": [{"c": 0.25}]}});
        assert!(CanonicalBytes::new(&data).is_err());
    }

    #[test]
    fn test_integers_accepted() {
        let data = serde_json::json!({"count": 42, "delta": -7, "big": 9999999999i64});
        let cb = CanonicalBytes::new(&data).expect("integers should be accepted");
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"big":9999999999,"count":42,"delta":-7}"#);
    }

    #[test]
    fn test_null_and_bool_passthrough() {
        let data = serde_json::json!({"flag": true, "missing": null});
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"flag":true,"missing":null}"#);
    }

    #[test]
    fn test_empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert!(!cb.is_empty());
        assert_eq!(cb.len(), 2);
    }

    #[test]
    fn test_unicode_passthrough() {
        let data = serde_json::json!({"name": "Soci\u{00e9}t\u{00e9} G\u{00e9}n\u{00e9}rale"});
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert!(s.contains('\u{00e9}'));
    }
}
