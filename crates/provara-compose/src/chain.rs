//! # Composition Chain
//!
//! Strictly ordered folding of domain proofs. The plan fixes the domain
//! order for a use case; level *i* must be built from the level *i−1*
//! composed proof, and every deviation — wrong level, wrong prior, wrong
//! domain — is a fatal [`CompositionError::OutOfOrder`] requiring a
//! restart from level 1.
//!
//! ## Lineage
//!
//! Each accepted level appends one [`LineageLink`]:
//!
//! - level 1: `H(empty ‖ proof_digest)`
//! - level n: `H(prior_composed_digest ‖ proof_digest)`
//!
//! using the interior-node hash of the tree layer, so a link is derivable
//! only by having validly composed the previous level. Lineage is
//! append-only within one composition run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use provara_core::error::CanonicalizationError;
use provara_core::{sha256_digest, AttestationDomain, CanonicalBytes};
use provara_crypto::{empty_leaf_hash, node_hash, Hash32};
use provara_oracle::PublicKeyResolver;

use provara_circuit::{CircuitError, ComplianceProof, PolicyError, ProofPolicy};

/// Error in proof composition.
#[derive(Error, Debug)]
pub enum CompositionError {
    /// Out-of-order composition: wrong level, wrong prior, or a domain out
    /// of plan order. Fatal — restart from level 1.
    #[error("composition out of order: {0}")]
    OutOfOrder(String),

    /// The prior composed proof fails its own integrity recomputation.
    #[error("prior composed proof is tampered: {0}")]
    TamperedPrior(String),

    /// The domain proof attests a different entity than the chain.
    #[error("entity mismatch: chain is for {chain}, proof attests {proof}")]
    EntityMismatch {
        /// The chain's entity key hash.
        chain: String,
        /// The proof's entity key hash.
        proof: String,
    },

    /// A composition plan must name at least one domain, each once.
    #[error("invalid composition plan: {0}")]
    InvalidPlan(String),

    /// The folded domain proof failed verification.
    #[error("domain proof rejected: {0}")]
    Proof(#[from] CircuitError),

    /// The proof backend is not acceptable under the policy.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Canonicalization of the composed digest failed.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}

/// The fixed domain order for one composition use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionPlan {
    domains: Vec<AttestationDomain>,
}

impl CompositionPlan {
    /// A plan over the given domain order.
    ///
    /// # Errors
    ///
    /// Rejects empty plans and repeated domains.
    pub fn new(domains: Vec<AttestationDomain>) -> Result<Self, CompositionError> {
        if domains.is_empty() {
            return Err(CompositionError::InvalidPlan(
                "plan must name at least one domain".to_string(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for d in &domains {
            if !seen.insert(*d) {
                return Err(CompositionError::InvalidPlan(format!(
                    "domain {d} appears more than once"
                )));
            }
        }
        Ok(Self { domains })
    }

    /// The standard full plan: every domain in canonical order.
    pub fn standard() -> Self {
        Self {
            domains: AttestationDomain::all_domains().to_vec(),
        }
    }

    /// The planned domains, in order.
    pub fn domains(&self) -> &[AttestationDomain] {
        &self.domains
    }

    /// The number of levels in a complete composition.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether the plan is empty (never true for a constructed plan).
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// The domain required at a 1-based level.
    pub fn domain_at(&self, level: u8) -> Option<AttestationDomain> {
        if level == 0 {
            return None;
        }
        self.domains.get(level as usize - 1).copied()
    }
}

/// One retained lineage hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageLink {
    /// The 1-based composition level this link was produced at.
    pub level: u8,
    /// The link hash chaining the prior composition to the folded proof.
    pub digest: Hash32,
}

/// A composed, lineage-tracked multi-domain proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedProof {
    /// The composition level (number of folded domain proofs).
    pub level: u8,
    /// The entity every folded proof attests.
    pub entity_key_hash: String,
    /// One link per level, append-only.
    pub lineage: Vec<LineageLink>,
    /// Per-domain compliance scores from each folded public output.
    pub domain_scores: BTreeMap<String, u8>,
    /// AND of every folded domain's compliance verdict.
    pub overall_compliant: bool,
    /// Canonical digest of this composed proof.
    pub digest: Hash32,
}

impl ComposedProof {
    /// Recompute the canonical digest of the given composition fields.
    fn compute_digest(
        level: u8,
        entity_key_hash: &str,
        lineage: &[LineageLink],
        domain_scores: &BTreeMap<String, u8>,
        overall_compliant: bool,
    ) -> Result<Hash32, CanonicalizationError> {
        let lineage_hex: Vec<serde_json::Value> = lineage
            .iter()
            .map(|l| serde_json::json!({"level": l.level, "digest": l.digest.to_hex()}))
            .collect();
        let statement = serde_json::json!({
            "level": level,
            "entity": entity_key_hash,
            "lineage": lineage_hex,
            "scores": domain_scores,
            "overall_compliant": overall_compliant,
        });
        let cb = CanonicalBytes::new(&statement)?;
        Ok(Hash32::from_digest(&sha256_digest(&cb)))
    }

    /// Verify this proof's internal consistency: lineage shape and the
    /// composed digest recomputation.
    pub fn verify_integrity(&self) -> Result<(), CompositionError> {
        if self.lineage.len() != self.level as usize {
            return Err(CompositionError::TamperedPrior(format!(
                "level {} carries {} lineage links",
                self.level,
                self.lineage.len()
            )));
        }
        for (i, link) in self.lineage.iter().enumerate() {
            if link.level as usize != i + 1 {
                return Err(CompositionError::TamperedPrior(format!(
                    "lineage link {} claims level {}",
                    i + 1,
                    link.level
                )));
            }
        }
        if self.domain_scores.len() != self.level as usize {
            return Err(CompositionError::TamperedPrior(format!(
                "level {} carries {} domain scores",
                self.level,
                self.domain_scores.len()
            )));
        }
        let expected = Self::compute_digest(
            self.level,
            &self.entity_key_hash,
            &self.lineage,
            &self.domain_scores,
            self.overall_compliant,
        )?;
        if expected != self.digest {
            return Err(CompositionError::TamperedPrior(
                "composed digest does not match its fields".to_string(),
            ));
        }
        Ok(())
    }
}

/// The composer for one plan and deployment.
pub struct ProofComposer {
    plan: CompositionPlan,
    resolver: std::sync::Arc<dyn PublicKeyResolver>,
    policy: ProofPolicy,
}

impl ProofComposer {
    /// Create a composer over a plan, verifier keys, and backend policy.
    pub fn new(
        plan: CompositionPlan,
        resolver: std::sync::Arc<dyn PublicKeyResolver>,
        policy: ProofPolicy,
    ) -> Self {
        Self {
            plan,
            resolver,
            policy,
        }
    }

    /// The composer's plan.
    pub fn plan(&self) -> &CompositionPlan {
        &self.plan
    }

    /// Fold one domain proof into the chain at `level`.
    ///
    /// Level 1 wraps a single domain proof (`prior` must be `None`);
    /// level *n* > 1 requires the level *n−1* composed proof. The folded
    /// proof's domain must be exactly the plan's domain for `level`.
    pub fn compose(
        &self,
        level: u8,
        prior: Option<&ComposedProof>,
        proof: &ComplianceProof,
    ) -> Result<ComposedProof, CompositionError> {
        let planned_domain = self.plan.domain_at(level).ok_or_else(|| {
            CompositionError::OutOfOrder(format!(
                "level {level} is outside the {}-domain plan",
                self.plan.len()
            ))
        })?;

        // Level/prior pairing.
        let prior = match (level, prior) {
            (1, None) => None,
            (1, Some(_)) => {
                return Err(CompositionError::OutOfOrder(
                    "level 1 wraps a single domain proof and takes no prior".to_string(),
                ))
            }
            (_, None) => {
                return Err(CompositionError::OutOfOrder(format!(
                    "level {level} requires the level {} composed proof",
                    level - 1
                )))
            }
            (_, Some(p)) => {
                if p.level != level - 1 {
                    return Err(CompositionError::OutOfOrder(format!(
                        "level {level} requires a level {} prior, got level {}",
                        level - 1,
                        p.level
                    )));
                }
                p.verify_integrity()?;
                Some(p)
            }
        };

        // The folded proof itself must be valid and policy-acceptable.
        self.policy.validate(proof.backend)?;
        proof.verify(self.resolver.as_ref())?;

        let output = &proof.public_output;
        if output.domain != planned_domain {
            return Err(CompositionError::OutOfOrder(format!(
                "level {level} expects domain {planned_domain}, got {}",
                output.domain
            )));
        }
        if let Some(p) = prior {
            if p.entity_key_hash != output.entity_key_hash {
                return Err(CompositionError::EntityMismatch {
                    chain: p.entity_key_hash.clone(),
                    proof: output.entity_key_hash.clone(),
                });
            }
        }

        // Chain the lineage link.
        let link_digest = match prior {
            None => node_hash(&empty_leaf_hash(), &proof.digest()),
            Some(p) => node_hash(&p.digest, &proof.digest()),
        };
        let mut lineage = prior.map(|p| p.lineage.clone()).unwrap_or_default();
        lineage.push(LineageLink {
            level,
            digest: link_digest,
        });

        let mut domain_scores = prior.map(|p| p.domain_scores.clone()).unwrap_or_default();
        domain_scores.insert(output.domain.as_str().to_string(), output.score);
        let overall_compliant =
            prior.map(|p| p.overall_compliant).unwrap_or(true) && output.compliant;

        let digest = ComposedProof::compute_digest(
            level,
            &output.entity_key_hash,
            &lineage,
            &domain_scores,
            overall_compliant,
        )?;
        tracing::info!(
            level,
            domain = %output.domain,
            overall_compliant,
            "composition level completed"
        );
        Ok(ComposedProof {
            level,
            entity_key_hash: output.entity_key_hash.clone(),
            lineage,
            domain_scores,
            overall_compliant,
            digest,
        })
    }
}
