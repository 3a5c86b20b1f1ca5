//! # Proof Archive
//!
//! Retrieval of composed proofs by entity identity and by lineage hash —
//! the audit/export boundary. An auditor holding only a lineage hash from
//! a published artifact can fetch the composed proof that produced it
//! without re-running any verification.
//!
//! The archive is content-keyed: a composed proof is stored under its own
//! digest and indexed by every lineage link it carries. Storage is
//! append-only; storing the same proof twice is a no-op.

use std::collections::BTreeMap;

use crate::chain::{ComposedProof, CompositionError};

/// An in-memory, append-only archive of composed proofs.
#[derive(Debug, Default)]
pub struct ProofArchive {
    /// Composed-proof digest (hex) → proof.
    proofs: BTreeMap<String, ComposedProof>,
    /// Entity key hash → composed-proof digests, in storage order.
    by_entity: BTreeMap<String, Vec<String>>,
    /// Any lineage link digest (hex) → composed-proof digest.
    by_lineage: BTreeMap<String, String>,
}

impl ProofArchive {
    /// An empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of archived composed proofs.
    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    /// Whether the archive is empty.
    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    /// Archive a composed proof after checking its integrity.
    pub fn store(&mut self, proof: ComposedProof) -> Result<(), CompositionError> {
        proof.verify_integrity()?;
        let key = proof.digest.to_hex();
        if self.proofs.contains_key(&key) {
            return Ok(());
        }
        self.by_entity
            .entry(proof.entity_key_hash.clone())
            .or_default()
            .push(key.clone());
        for link in &proof.lineage {
            self.by_lineage.insert(link.digest.to_hex(), key.clone());
        }
        self.proofs.insert(key, proof);
        Ok(())
    }

    /// Every archived composed proof for an entity, in storage order.
    pub fn find_by_entity(&self, entity_key_hash: &str) -> Vec<&ComposedProof> {
        self.by_entity
            .get(entity_key_hash)
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| self.proofs.get(k))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The composed proof carrying a given lineage link hash (hex), or the
    /// proof whose own digest it is.
    pub fn find_by_lineage(&self, lineage_hash_hex: &str) -> Option<&ComposedProof> {
        if let Some(proof) = self.proofs.get(lineage_hash_hex) {
            return Some(proof);
        }
        self.by_lineage
            .get(lineage_hash_hex)
            .and_then(|k| self.proofs.get(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::LineageLink;
    use provara_crypto::Hash32;
    use std::collections::BTreeMap as Map;

    fn composed(level: u8, entity: &str, seed: u8) -> ComposedProof {
        let lineage: Vec<LineageLink> = (1..=level)
            .map(|l| LineageLink {
                level: l,
                digest: Hash32([seed + l; 32]),
            })
            .collect();
        let mut scores = Map::new();
        for l in 1..=level {
            scores.insert(format!("domain_{l}"), 80 + l);
        }
        // Recompute the digest through the same path compose() uses, by
        // round-tripping through verify_integrity's expectation.
        let mut proof = ComposedProof {
            level,
            entity_key_hash: entity.to_string(),
            lineage,
            domain_scores: scores,
            overall_compliant: true,
            digest: Hash32([0; 32]),
        };
        // Fix up the digest so integrity holds.
        proof.digest = recompute(&proof);
        proof
    }

    fn recompute(p: &ComposedProof) -> Hash32 {
        use provara_core::{sha256_digest, CanonicalBytes};
        let lineage_hex: Vec<serde_json::Value> = p
            .lineage
            .iter()
            .map(|l| serde_json::json!({"level": l.level, "digest": l.digest.to_hex()}))
            .collect();
        let statement = serde_json::json!({
            "level": p.level,
            "entity": p.entity_key_hash,
            "lineage": lineage_hex,
            "scores": p.domain_scores,
            "overall_compliant": p.overall_compliant,
        });
        Hash32::from_digest(&sha256_digest(&CanonicalBytes::new(&statement).unwrap()))
    }

    #[test]
    fn test_store_and_find_by_entity() {
        let mut archive = ProofArchive::new();
        archive.store(composed(2, "entity-a", 10)).unwrap();
        archive.store(composed(1, "entity-a", 40)).unwrap();
        archive.store(composed(1, "entity-b", 70)).unwrap();

        assert_eq!(archive.len(), 3);
        assert_eq!(archive.find_by_entity("entity-a").len(), 2);
        assert_eq!(archive.find_by_entity("entity-b").len(), 1);
        assert!(archive.find_by_entity("entity-c").is_empty());
    }

    #[test]
    fn test_find_by_lineage_hash() {
        let mut archive = ProofArchive::new();
        let proof = composed(2, "entity-a", 10);
        let link_hex = proof.lineage[0].digest.to_hex();
        let own_hex = proof.digest.to_hex();
        archive.store(proof.clone()).unwrap();

        assert_eq!(archive.find_by_lineage(&link_hex), Some(&proof));
        assert_eq!(archive.find_by_lineage(&own_hex), Some(&proof));
        assert!(archive.find_by_lineage(&"00".repeat(32)).is_none());
    }

    #[test]
    fn test_duplicate_store_is_noop() {
        let mut archive = ProofArchive::new();
        let proof = composed(1, "entity-a", 10);
        archive.store(proof.clone()).unwrap();
        archive.store(proof).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.find_by_entity("entity-a").len(), 1);
    }

    #[test]
    fn test_tampered_proof_refused() {
        let mut archive = ProofArchive::new();
        let mut proof = composed(1, "entity-a", 10);
        proof.overall_compliant = false; // digest no longer matches
        assert!(archive.store(proof).is_err());
        assert!(archive.is_empty());
    }
}
