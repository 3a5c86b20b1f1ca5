//! # Identity Newtypes
//!
//! Newtype wrappers for the identifier namespaces of the engine. These
//! prevent accidental identifier confusion — you cannot pass a slot index
//! where a verification id is expected, and an entity key is always
//! normalized before it is hashed into the registry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canonical::CanonicalBytes;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::ProvaraError;

/// The identity under which an entity is tracked in the registry.
///
/// Construction normalizes the raw identity string (trim, collapse inner
/// whitespace, uppercase) so that `"Acme  Exports "` and `"ACME EXPORTS"`
/// resolve to the same registry slot. The registry itself only ever sees
/// the digest of the normalized key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    /// Normalize and wrap a raw entity identity.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the normalized key is empty.
    pub fn new(raw: &str) -> Result<Self, ProvaraError> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        if normalized.is_empty() {
            return Err(ProvaraError::Validation(
                "entity key must not be empty".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    /// The normalized key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The content digest of the normalized key — the value the registry
    /// and public outputs carry instead of the raw identity.
    pub fn digest(&self) -> ContentDigest {
        let cb = CanonicalBytes::new(&self.0).expect("plain strings always canonicalize");
        sha256_digest(&cb)
    }

    /// Hex form of [`EntityKey::digest()`].
    pub fn digest_hex(&self) -> String {
        self.digest().to_hex()
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one verification attempt (document build through
/// registry commit). Carried on proof artifacts for audit correlation;
/// excluded from all digests so proofs stay deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationId(pub Uuid);

impl VerificationId {
    /// Generate a new random verification identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VerificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VerificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verification:{}", self.0)
    }
}

/// Index of a slot in a fixed-depth tree.
///
/// Bounded by the owning tree's depth (`index < 2^depth`); the bound is
/// checked wherever a `SlotIndex` meets a concrete tree or layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SlotIndex(pub u16);

impl SlotIndex {
    /// The index as a usize for tree addressing.
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot:{}", self.0)
    }
}
