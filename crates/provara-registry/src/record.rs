//! # Compliance Records
//!
//! The per-entity leaf content of the registry tree. A record is only ever
//! derived from a circuit proof's public output: [`ComplianceRecord::first`]
//! for a proven-vacant insertion, [`ComplianceRecord::updated`] for a
//! proven-occupied update, [`ComplianceRecord::reset`] for the
//! administrative zeroing path. Records are never deleted.

use serde::{Deserialize, Serialize};

use provara_core::error::CanonicalizationError;
use provara_core::{sha256_digest, CanonicalBytes, Timestamp};
use provara_crypto::{leaf_hash, Hash32};

use provara_circuit::PublicOutput;

/// The score floor for tracked entities: recomputation on a later
/// verification never writes below this, so a tracked-but-failing entity
/// stays distinguishable from a reset one. Only [`ComplianceRecord::reset`]
/// writes 0.
pub const RECORD_SCORE_FLOOR: u8 = 10;

/// The compliance status bits carried on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    /// Every core predicate passed at the last verification.
    pub compliant: bool,
    /// Every enhanced predicate also passed.
    pub enhanced_clear: bool,
}

impl StatusFlags {
    fn from_output(output: &PublicOutput) -> Self {
        Self {
            compliant: output.compliant,
            enhanced_clear: output.enhanced_passed == output.enhanced_total,
        }
    }

    /// The zeroed flags written by a reset.
    pub fn cleared() -> Self {
        Self {
            compliant: false,
            enhanced_clear: false,
        }
    }
}

/// One entity's compliance record — the preimage of a registry leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// SHA-256 of the normalized entity key (hex).
    pub entity_key_hash: String,
    /// Status bits from the latest verification.
    pub status: StatusFlags,
    /// Compliance score from the latest verification (0–100).
    pub score: u8,
    /// Number of accepted verifications for this entity (≥ 1).
    pub verification_count: u64,
    /// When the entity was first verified.
    pub first_verified_at: Timestamp,
    /// When the entity was last verified or reset.
    pub last_verified_at: Timestamp,
    /// Record version, incremented by every update and reset.
    pub version: u64,
}

impl ComplianceRecord {
    /// The record written on an entity's first (proven-vacant) insertion.
    pub fn first(output: &PublicOutput) -> Self {
        Self {
            entity_key_hash: output.entity_key_hash.clone(),
            status: StatusFlags::from_output(output),
            score: output.score,
            verification_count: 1,
            first_verified_at: output.verified_at,
            last_verified_at: output.verified_at,
            version: 1,
        }
    }

    /// The record written when a tracked entity is re-verified.
    ///
    /// The score is recomputed from the new output but clamped at
    /// [`RECORD_SCORE_FLOOR`]; `first_verified_at` is preserved.
    pub fn updated(&self, output: &PublicOutput) -> Self {
        Self {
            entity_key_hash: self.entity_key_hash.clone(),
            status: StatusFlags::from_output(output),
            score: output.score.max(RECORD_SCORE_FLOOR),
            verification_count: self.verification_count + 1,
            first_verified_at: self.first_verified_at,
            last_verified_at: output.verified_at,
            version: self.version + 1,
        }
    }

    /// The record written by an administrative entity reset: flags and
    /// score zeroed, counters and history retained, version bumped.
    pub fn reset(&self, at: Timestamp) -> Self {
        Self {
            entity_key_hash: self.entity_key_hash.clone(),
            status: StatusFlags::cleared(),
            score: 0,
            verification_count: self.verification_count,
            first_verified_at: self.first_verified_at,
            last_verified_at: at,
            version: self.version + 1,
        }
    }

    /// The registry-tree leaf hash of this record.
    pub fn leaf(&self) -> Result<Hash32, CanonicalizationError> {
        let cb = CanonicalBytes::new(self)?;
        let digest = sha256_digest(&cb);
        Ok(leaf_hash(&digest.bytes))
    }
}
