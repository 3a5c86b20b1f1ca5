//! # Hash32 — Raw Tree-Level Hash
//!
//! `Hash32` is the 32-byte hash that circulates through the
//! authenticated-structure layer: slot-tree leaves and roots, opening
//! sibling paths, and composition lineage links.
//!
//! It is distinct from `provara_core::ContentDigest` on purpose: a
//! `ContentDigest` is algorithm-tagged and may only be computed from
//! `CanonicalBytes`, while `Hash32` values are produced by the
//! domain-separated tree hashing in [`crate::slot_tree`] over material that
//! has already been digested or normalized. Keeping the types separate
//! prevents a tree-interior hash from being mistaken for a content address.
//!
//! ## Serde
//!
//! Serializes as a 64-character lowercase hex string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use provara_core::error::CryptoError;

/// A raw 32-byte hash used in tree and lineage structures.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    /// Wrap raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.trim().to_lowercase();
        if hex.len() != 64 {
            return Err(CryptoError::DigestError(format!(
                "hash hex must be 64 chars, got {}",
                hex.len()
            )));
        }
        let bytes = hex_to_bytes(&hex).map_err(CryptoError::DigestError)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Adopt the bytes of a `ContentDigest` as a tree-level hash.
    ///
    /// Used where canonically-digested application data (a compliance
    /// record, a proof statement) becomes tree or lineage material.
    pub fn from_digest(digest: &provara_core::ContentDigest) -> Self {
        Self(digest.bytes)
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash32({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// First four bytes as hex, for debug output.
pub(crate) fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

/// Decode an even-length hex string.
pub(crate) fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}
