//! # Public Output
//!
//! The public, non-secret result a compliance proof carries: the overall
//! verdict, per-tier pass counts, the compliance score, and only the
//! disclosed-field hashes the caller designated. No private leaf value
//! beyond what the predicates needed ever appears here — names and other
//! designated fields are disclosed as salt-free SHA-256 value hashes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use provara_core::error::CanonicalizationError;
use provara_core::{sha256_digest, AttestationDomain, CanonicalBytes, ContentDigest, Timestamp};

/// The public output of one compliance circuit evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicOutput {
    /// The domain evaluated.
    pub domain: AttestationDomain,
    /// SHA-256 of the normalized entity key (hex) — the registry identity.
    pub entity_key_hash: String,
    /// Overall verdict: every core predicate passed.
    pub compliant: bool,
    /// Core predicates passed.
    pub core_passed: u32,
    /// Core predicates evaluated.
    pub core_total: u32,
    /// Enhanced predicates passed (never blocks `compliant`).
    pub enhanced_passed: u32,
    /// Enhanced predicates evaluated.
    pub enhanced_total: u32,
    /// Percentage of all evaluated predicates that passed, rounded.
    pub score: u8,
    /// Designated disclosed fields: name → SHA-256 value hash (hex).
    pub disclosed: BTreeMap<String, String>,
    /// The evaluation time the temporal predicates used.
    pub verified_at: Timestamp,
}

impl PublicOutput {
    /// Compute the score from pass counts: `round(passed / total * 100)`,
    /// or 0 when nothing was evaluated.
    pub fn compute_score(passed: u32, total: u32) -> u8 {
        if total == 0 {
            return 0;
        }
        (((passed as u64) * 100 + (total as u64) / 2) / total as u64) as u8
    }

    /// The canonical content digest of this output.
    ///
    /// Bound into the proof statement, so a proof cannot be replayed
    /// against a different verdict.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        let cb = CanonicalBytes::new(self)?;
        Ok(sha256_digest(&cb))
    }
}
