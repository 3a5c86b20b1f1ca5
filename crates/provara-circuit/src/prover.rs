//! # Compliance Prover
//!
//! `prove()` — the circuit's evaluation contract. Four gates, in order:
//!
//! 1. Every revealed field's Merkle opening must resolve to the attested
//!    root (`InvalidWitness`, listing every bad slot).
//! 2. The attestation signature must verify against the domain's known
//!    public key (`InvalidAttestation`).
//! 3. Every field referenced by a core predicate must be revealed and
//!    non-placeholder (`MissingMandatoryFields`, listing every gap).
//! 4. The predicate set is evaluated and the public output emitted.
//!
//! A failure at gates 1–3 refuses to produce a proof. Only gate 4 can
//! produce a `compliant = false` output — a negative-but-valid verdict is
//! a different artifact from a refusal, and callers must treat them
//! differently (a refusal is never retried with the same inputs).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use provara_core::error::CanonicalizationError;
use provara_core::{
    sha256_digest, sha256_hex, CanonicalBytes, EntityKey, Timestamp, VerificationId,
};
use provara_crypto::{leaf_hash, Hash32, SlotOpening};
use provara_oracle::{verify_attestation, Attestation, PublicKeyResolver};

use crate::output::PublicOutput;
use crate::policy::ProofBackend;
use crate::predicate::is_placeholder;
use crate::ruleset::PredicateSet;

/// Circuit-level refusal.
#[derive(Error, Debug)]
pub enum CircuitError {
    /// One or more openings do not resolve to the attested root.
    #[error("invalid witness: openings failed for slots {slots:?}")]
    InvalidWitness {
        /// Every revealed field whose opening failed.
        slots: Vec<String>,
    },

    /// The attestation does not verify against the domain's known key.
    #[error("invalid attestation: {0}")]
    InvalidAttestation(String),

    /// Fields required by core predicates were not revealed.
    #[error("domain {domain} is missing mandatory fields: {fields:?}")]
    MissingMandatoryFields {
        /// The domain being proven.
        domain: String,
        /// Every missing field name, sorted.
        fields: Vec<String>,
    },

    /// A disclosure request named a field that was not revealed.
    #[error("cannot disclose unrevealed field {0:?}")]
    UnknownDisclosedField(String),

    /// The ruleset does not match the attestation's domain.
    #[error("ruleset domain {ruleset} does not match attestation domain {attestation}")]
    DomainMismatch {
        /// The ruleset's domain.
        ruleset: String,
        /// The attestation's domain.
        attestation: String,
    },

    /// Canonicalization of the output or statement failed.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}

/// One selectively disclosed slot: the revealed normalized value and its
/// Merkle opening against the attested root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealedSlot {
    /// The slot's revealed name (field or bundle name).
    pub name: String,
    /// The normalized value, exactly as hashed into the tree.
    pub value: String,
    /// The opening proving the value's membership.
    pub opening: SlotOpening,
}

/// The witness side of a proof attempt: all revealed slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitWitness {
    /// Revealed slots, in any order.
    pub revealed: Vec<RevealedSlot>,
}

impl CircuitWitness {
    /// A witness over the given revealed slots.
    pub fn new(revealed: Vec<RevealedSlot>) -> Self {
        Self { revealed }
    }

    /// The revealed name → value map predicates evaluate over.
    fn field_map(&self) -> std::collections::BTreeMap<String, String> {
        self.revealed
            .iter()
            .map(|slot| (slot.name.clone(), slot.value.clone()))
            .collect()
    }
}

/// A compliance proof: the attestation it was evaluated against, the public
/// output, and the backend-tagged statement digest.
///
/// The transparent backend's "proof" is the canonical statement digest —
/// recomputable by any verifier from the public fields, refusing any
/// mutation of root, domain, or output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceProof {
    /// Audit correlation id (excluded from the statement digest).
    pub id: VerificationId,
    /// The backend that produced this proof.
    pub backend: ProofBackend,
    /// The attestation the circuit consumed.
    pub attestation: Attestation,
    /// The public output the circuit emitted.
    pub public_output: PublicOutput,
    /// Digest of the canonical proof statement.
    pub statement_digest: Hash32,
}

impl ComplianceProof {
    /// The proof's statement digest — its identity in lineage chains.
    pub fn digest(&self) -> Hash32 {
        self.statement_digest
    }

    /// Verify this proof: recompute the statement digest from the public
    /// fields and re-verify the attestation against the resolver's known
    /// key for the domain.
    pub fn verify(&self, resolver: &dyn PublicKeyResolver) -> Result<(), CircuitError> {
        if self.public_output.domain != self.attestation.domain {
            return Err(CircuitError::DomainMismatch {
                ruleset: self.public_output.domain.to_string(),
                attestation: self.attestation.domain.to_string(),
            });
        }
        let expected = statement_digest(&self.attestation, &self.public_output, self.backend)?;
        if expected != self.statement_digest {
            return Err(CircuitError::InvalidWitness {
                slots: vec!["statement_digest".to_string()],
            });
        }
        verify_attestation(&self.attestation, resolver)
            .map_err(|e| CircuitError::InvalidAttestation(e.to_string()))?;
        Ok(())
    }
}

/// Compute the canonical statement digest binding attestation, output, and
/// backend together.
fn statement_digest(
    attestation: &Attestation,
    output: &PublicOutput,
    backend: ProofBackend,
) -> Result<Hash32, CanonicalizationError> {
    let statement = serde_json::json!({
        "backend": backend.name(),
        "domain": attestation.domain.as_str(),
        "root": attestation.root.to_hex(),
        "output": output.digest()?.to_hex(),
    });
    let cb = CanonicalBytes::new(&statement)?;
    Ok(Hash32::from_digest(&sha256_digest(&cb)))
}

/// Evaluate a domain's compliance predicates over revealed fields and
/// produce a proof.
///
/// See the module docs for the gate order and refusal semantics. The
/// returned output equals `proof.public_output`; it is returned separately
/// so callers that only need the verdict avoid cloning the proof.
pub fn prove(
    resolver: &dyn PublicKeyResolver,
    attestation: &Attestation,
    witness: &CircuitWitness,
    ruleset: &PredicateSet,
    entity_key: &EntityKey,
    disclose: &[&str],
    now: Timestamp,
) -> Result<(ComplianceProof, PublicOutput), CircuitError> {
    if ruleset.domain != attestation.domain {
        return Err(CircuitError::DomainMismatch {
            ruleset: ruleset.domain.to_string(),
            attestation: attestation.domain.to_string(),
        });
    }

    // Gate 1: every opening must resolve to the attested root.
    let mut bad_slots: Vec<String> = Vec::new();
    for slot in &witness.revealed {
        let leaf = leaf_hash(slot.value.as_bytes());
        if !slot.opening.verify(&leaf, &attestation.root) {
            bad_slots.push(slot.name.clone());
        }
    }
    if !bad_slots.is_empty() {
        bad_slots.sort();
        return Err(CircuitError::InvalidWitness { slots: bad_slots });
    }

    // Gate 2: the oracle signature must verify against the known key.
    verify_attestation(attestation, resolver)
        .map_err(|e| CircuitError::InvalidAttestation(e.to_string()))?;

    // Gate 3: all core-predicate fields must be revealed, non-placeholder.
    let fields = witness.field_map();
    let mut missing: Vec<String> = ruleset
        .mandatory_fields()
        .into_iter()
        .filter(|name| fields.get(name).map_or(true, |v| is_placeholder(v)))
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(CircuitError::MissingMandatoryFields {
            domain: ruleset.domain.to_string(),
            fields: missing,
        });
    }

    // Gate 4: predicate evaluation.
    let core_total = ruleset.core.len() as u32;
    let core_passed = ruleset
        .core
        .iter()
        .filter(|p| p.evaluate(&fields, now))
        .count() as u32;
    let enhanced_total = ruleset.enhanced.len() as u32;
    let enhanced_passed = ruleset
        .enhanced
        .iter()
        .filter(|p| p.evaluate(&fields, now))
        .count() as u32;
    let compliant = core_passed == core_total;

    // Disclosed fields are published as value hashes, never raw values.
    let mut disclosed = std::collections::BTreeMap::new();
    for name in disclose {
        let value = fields
            .get(*name)
            .ok_or_else(|| CircuitError::UnknownDisclosedField(name.to_string()))?;
        let cb = CanonicalBytes::new(value)?;
        disclosed.insert(name.to_string(), sha256_hex(&cb));
    }

    let output = PublicOutput {
        domain: ruleset.domain,
        entity_key_hash: entity_key.digest_hex(),
        compliant,
        core_passed,
        core_total,
        enhanced_passed,
        enhanced_total,
        score: PublicOutput::compute_score(
            core_passed + enhanced_passed,
            core_total + enhanced_total,
        ),
        disclosed,
        verified_at: now,
    };

    let digest = statement_digest(attestation, &output, ProofBackend::Transparent)?;
    tracing::info!(
        domain = %ruleset.domain,
        compliant,
        core = format_args!("{core_passed}/{core_total}"),
        enhanced = format_args!("{enhanced_passed}/{enhanced_total}"),
        "compliance proof produced"
    );

    let proof = ComplianceProof {
        id: VerificationId::new(),
        backend: ProofBackend::Transparent,
        attestation: attestation.clone(),
        public_output: output.clone(),
        statement_digest: digest,
    };
    Ok((proof, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use provara_core::AttestationDomain;
    use provara_document::{build, DocumentTree, LayoutRegistry};
    use provara_oracle::{DeploymentContext, OracleAttestationService};

    fn noon() -> Timestamp {
        Timestamp::parse("2026-06-15T12:00:00Z").unwrap()
    }

    fn legal_entity_doc(status: &str) -> serde_json::Value {
        serde_json::json!({
            "lei": "549300EXAMPLE00LEI00",
            "entity": {
                "legalName": "ACME EXPORTS PRIVATE LIMITED",
                "status": status,
                "jurisdiction": "IN",
                "legalAddress": {
                    "street": "12 Industrial Estate",
                    "city": "Coimbatore",
                    "region": "TN",
                    "country": "IN"
                },
                "hqAddress": {
                    "street": "12 Industrial Estate",
                    "city": "Coimbatore",
                    "country": "IN"
                }
            },
            "registration": {
                "status": "ISSUED",
                "conformityFlag": "",
                "nextRenewalDate": "2026-11-30"
            }
        })
    }

    fn witness_for(tree: &DocumentTree, ruleset: &PredicateSet) -> CircuitWitness {
        let revealed = ruleset
            .all_fields()
            .into_iter()
            .filter_map(|name| {
                tree.open(&name).ok().map(|(value, opening)| RevealedSlot {
                    name,
                    value,
                    opening,
                })
            })
            .collect();
        CircuitWitness::new(revealed)
    }

    struct Setup {
        svc: OracleAttestationService,
        tree: DocumentTree,
        ruleset: PredicateSet,
        entity: EntityKey,
    }

    fn setup(status: &str) -> Setup {
        let layout = LayoutRegistry::builtin()
            .layout(AttestationDomain::LegalEntity)
            .unwrap()
            .clone();
        let tree = build(&layout, &legal_entity_doc(status)).unwrap();
        Setup {
            svc: OracleAttestationService::new(DeploymentContext::local_dev()),
            tree,
            ruleset: PredicateSet::standard(AttestationDomain::LegalEntity),
            entity: EntityKey::new("Acme Exports").unwrap(),
        }
    }

    #[test]
    fn test_compliant_entity_proves() {
        let s = setup("ACTIVE");
        let att = s.svc.attest(AttestationDomain::LegalEntity, s.tree.root()).unwrap();
        let witness = witness_for(&s.tree, &s.ruleset);
        let (proof, output) = prove(
            s.svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &["legal_name"],
            noon(),
        )
        .unwrap();

        assert!(output.compliant);
        assert_eq!(output.core_passed, output.core_total);
        // The empty conformity flag fails only the enhanced tier.
        assert!(output.enhanced_passed < output.enhanced_total);
        assert_eq!(proof.public_output, output);
        proof.verify(s.svc.context().public_keys.as_ref()).unwrap();
    }

    #[test]
    fn test_noncompliant_entity_still_proves() {
        let s = setup("INACTIVE");
        let att = s.svc.attest(AttestationDomain::LegalEntity, s.tree.root()).unwrap();
        let witness = witness_for(&s.tree, &s.ruleset);
        let (proof, output) = prove(
            s.svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &[],
            noon(),
        )
        .unwrap();

        // A negative verdict is a valid proof, not a refusal.
        assert!(!output.compliant);
        assert_eq!(output.core_passed, output.core_total - 1);
        proof.verify(s.svc.context().public_keys.as_ref()).unwrap();
    }

    #[test]
    fn test_tampered_reveal_refused_with_slot_names() {
        let s = setup("INACTIVE");
        let att = s.svc.attest(AttestationDomain::LegalEntity, s.tree.root()).unwrap();
        let mut witness = witness_for(&s.tree, &s.ruleset);
        // Claim ACTIVE without an opening for it.
        for slot in &mut witness.revealed {
            if slot.name == "entity_status" {
                slot.value = "ACTIVE".to_string();
            }
        }
        let err = prove(
            s.svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &[],
            noon(),
        )
        .unwrap_err();
        match err {
            CircuitError::InvalidWitness { slots } => {
                assert_eq!(slots, vec!["entity_status"]);
            }
            other => panic!("expected InvalidWitness, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_key_signature_always_refused() {
        let s = setup("ACTIVE");
        let att = s.svc.attest(AttestationDomain::LegalEntity, s.tree.root()).unwrap();
        let witness = witness_for(&s.tree, &s.ruleset);
        // A verifier with a different known key for the domain.
        let other = DeploymentContext::local_dev();
        let err = prove(
            other.public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &[],
            noon(),
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidAttestation(_)));
    }

    #[test]
    fn test_missing_mandatory_fields_all_listed() {
        let s = setup("ACTIVE");
        let att = s.svc.attest(AttestationDomain::LegalEntity, s.tree.root()).unwrap();
        // Reveal nothing the core predicates need except the LEI.
        let mut witness = witness_for(&s.tree, &s.ruleset);
        witness.revealed.retain(|slot| slot.name == "lei");
        let err = prove(
            s.svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &[],
            noon(),
        )
        .unwrap_err();
        match err {
            CircuitError::MissingMandatoryFields { domain, fields } => {
                assert_eq!(domain, "legal_entity");
                assert_eq!(
                    fields,
                    vec!["entity_status", "legal_name", "registration_status"]
                );
            }
            other => panic!("expected MissingMandatoryFields, got {other:?}"),
        }
    }

    #[test]
    fn test_domain_mismatch_refused() {
        let s = setup("ACTIVE");
        let att = s.svc.attest(AttestationDomain::TradeLicense, s.tree.root()).unwrap();
        let witness = witness_for(&s.tree, &s.ruleset);
        let err = prove(
            s.svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &[],
            noon(),
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::DomainMismatch { .. }));
    }

    #[test]
    fn test_disclosed_fields_are_hashes() {
        let s = setup("ACTIVE");
        let att = s.svc.attest(AttestationDomain::LegalEntity, s.tree.root()).unwrap();
        let witness = witness_for(&s.tree, &s.ruleset);
        let (_, output) = prove(
            s.svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &["legal_name"],
            noon(),
        )
        .unwrap();
        let disclosed = output.disclosed.get("legal_name").unwrap();
        assert_eq!(disclosed.len(), 64);
        assert!(!disclosed.contains("ACME"));
    }

    #[test]
    fn test_disclosing_unrevealed_field_refused() {
        let s = setup("ACTIVE");
        let att = s.svc.attest(AttestationDomain::LegalEntity, s.tree.root()).unwrap();
        let witness = witness_for(&s.tree, &s.ruleset);
        let err = prove(
            s.svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &["headquarters_address"],
            noon(),
        )
        .unwrap_err();
        assert!(matches!(err, CircuitError::UnknownDisclosedField(_)));
    }

    #[test]
    fn test_proof_verify_rejects_tampered_output() {
        let s = setup("INACTIVE");
        let att = s.svc.attest(AttestationDomain::LegalEntity, s.tree.root()).unwrap();
        let witness = witness_for(&s.tree, &s.ruleset);
        let (mut proof, _) = prove(
            s.svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &s.ruleset,
            &s.entity,
            &[],
            noon(),
        )
        .unwrap();
        // Flip the verdict in the emitted output.
        proof.public_output.compliant = true;
        assert!(proof.verify(s.svc.context().public_keys.as_ref()).is_err());
    }

    #[test]
    fn test_expired_trade_license_fails_core() {
        let layout = LayoutRegistry::builtin()
            .layout(AttestationDomain::TradeLicense)
            .unwrap()
            .clone();
        let doc = serde_json::json!({
            "entity": {"name": "Acme Exports"},
            "license": {
                "iec": "0596001234",
                "status": "ISSUED",
                "issueDate": "2020-01-01",
                "expiryDate": "2021-01-01",
                "categories": ["agro", "textiles"]
            }
        });
        let tree = build(&layout, &doc).unwrap();
        let svc = OracleAttestationService::new(DeploymentContext::local_dev());
        let att = svc.attest(AttestationDomain::TradeLicense, tree.root()).unwrap();
        let ruleset = PredicateSet::standard(AttestationDomain::TradeLicense);
        let witness = witness_for(&tree, &ruleset);
        let entity = EntityKey::new("Acme Exports").unwrap();
        let (_, output) = prove(
            svc.context().public_keys.as_ref(),
            &att,
            &witness,
            &ruleset,
            &entity,
            &[],
            noon(),
        )
        .unwrap();
        assert!(!output.compliant);
    }
}
