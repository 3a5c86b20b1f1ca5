//! # Oracle Attestation
//!
//! `attest(domain, root)` — sign a document Merkle root under the domain's
//! authority key, producing the [`Attestation`] consumed exactly once per
//! proof. The oracle persists nothing; the registry, not the oracle, is
//! the stateful component.
//!
//! ## Message Format
//!
//! The signed message is the canonical JCS encoding of
//! `{"domain": <id>, "root": <hex>}`. Embedding the domain makes key
//! scoping structural: the same root signed by two authorities produces
//! two incompatible messages, and verification always rebuilds the message
//! from the attestation's own public fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use provara_core::error::CryptoError;
use provara_core::{AttestationDomain, CanonicalBytes};
use provara_crypto::{verify, AuthorityPublicKey, AuthoritySignature, Hash32};

use crate::context::DeploymentContext;
use crate::keys::PublicKeyResolver;

/// Error in oracle operations.
#[derive(Error, Debug)]
pub enum OracleError {
    /// No key is registered for the requested domain.
    #[error("no oracle key registered for domain {0}")]
    UnknownDomain(AttestationDomain),

    /// The attestation's signer is not the domain's known authority key.
    #[error("attestation signer {signer} is not the known {domain} authority key")]
    SignerMismatch {
        /// The domain whose authority was expected.
        domain: AttestationDomain,
        /// The unexpected signer key (hex).
        signer: String,
    },

    /// Signature creation or verification failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The attestation message could not be canonicalized.
    #[error("attestation message canonicalization failed: {0}")]
    Canonicalization(#[from] provara_core::error::CanonicalizationError),
}

/// A signed binding of a document Merkle root to a data-source authority.
///
/// Consumed exactly once per proof; never mutated. `Verify(signer, root,
/// signature)` must hold before the circuit accepts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attestation {
    /// The attested domain (names the authority whose key signed).
    pub domain: AttestationDomain,
    /// The attested document Merkle root.
    pub root: Hash32,
    /// Signature over the canonical `{domain, root}` message.
    pub signature: AuthoritySignature,
    /// The signing authority's public key.
    pub signer_key: AuthorityPublicKey,
}

/// Build the canonical message an attestation signs.
fn attestation_message(
    domain: AttestationDomain,
    root: &Hash32,
) -> Result<CanonicalBytes, provara_core::error::CanonicalizationError> {
    CanonicalBytes::new(&serde_json::json!({
        "domain": domain.as_str(),
        "root": root.to_hex(),
    }))
}

/// The oracle attestation service for one deployment.
///
/// Stateless apart from the injected context; the same `(domain, root)`
/// pair may be attested any number of times, and every resulting
/// attestation verifies against the same root.
#[derive(Debug, Clone)]
pub struct OracleAttestationService {
    ctx: DeploymentContext,
}

impl OracleAttestationService {
    /// Create the service over a deployment context.
    pub fn new(ctx: DeploymentContext) -> Self {
        Self { ctx }
    }

    /// The deployment context this service signs under.
    pub fn context(&self) -> &DeploymentContext {
        &self.ctx
    }

    /// Attest a document Merkle root under the domain's authority key.
    ///
    /// # Errors
    ///
    /// [`OracleError::UnknownDomain`] if the context's resolver holds no
    /// key for `domain`.
    pub fn attest(
        &self,
        domain: AttestationDomain,
        root: Hash32,
    ) -> Result<Attestation, OracleError> {
        let keypair = self
            .ctx
            .signing_keys
            .signing_key(domain)
            .ok_or(OracleError::UnknownDomain(domain))?;
        let message = attestation_message(domain, &root)?;
        let signature = keypair.sign(&message);
        tracing::debug!(
            domain = %domain,
            root = %root,
            network = %self.ctx.network,
            "attested document root"
        );
        Ok(Attestation {
            domain,
            root,
            signature,
            signer_key: keypair.public_key(),
        })
    }
}

/// Verify an attestation against the domain's known public key.
///
/// Rebuilds the canonical message from the attestation's public fields,
/// requires the attested signer to be the resolver's known authority key
/// for the domain, and checks the Ed25519 signature.
///
/// # Errors
///
/// [`OracleError::UnknownDomain`] if the resolver knows no key for the
/// domain; [`OracleError::SignerMismatch`] if the attestation names a
/// different signer; [`OracleError::Crypto`] if the signature is invalid.
pub fn verify_attestation(
    attestation: &Attestation,
    resolver: &dyn PublicKeyResolver,
) -> Result<(), OracleError> {
    let known = resolver
        .public_key(attestation.domain)
        .ok_or(OracleError::UnknownDomain(attestation.domain))?;
    if known != attestation.signer_key {
        return Err(OracleError::SignerMismatch {
            domain: attestation.domain,
            signer: attestation.signer_key.to_hex(),
        });
    }
    let message = attestation_message(attestation.domain, &attestation.root)?;
    verify(&message, &attestation.signature, &known)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::InMemoryKeyRing;
    use provara_crypto::AuthorityKeypair;
    use std::sync::Arc;

    fn test_root(byte: u8) -> Hash32 {
        Hash32([byte; 32])
    }

    fn service() -> OracleAttestationService {
        OracleAttestationService::new(DeploymentContext::local_dev())
    }

    #[test]
    fn test_attest_and_verify() {
        let svc = service();
        let att = svc
            .attest(AttestationDomain::LegalEntity, test_root(0x42))
            .unwrap();
        assert_eq!(att.domain, AttestationDomain::LegalEntity);
        verify_attestation(&att, svc.context().public_keys.as_ref())
            .expect("fresh attestation should verify");
    }

    #[test]
    fn test_unknown_domain_rejected() {
        let mut ring = InMemoryKeyRing::new();
        ring.insert(AttestationDomain::LegalEntity, AuthorityKeypair::generate());
        let ring = Arc::new(ring);
        let ctx = DeploymentContext::new(crate::NetworkId::Local, ring.clone(), ring);
        let svc = OracleAttestationService::new(ctx);
        assert!(matches!(
            svc.attest(AttestationDomain::TradeLicense, test_root(1)),
            Err(OracleError::UnknownDomain(AttestationDomain::TradeLicense))
        ));
    }

    #[test]
    fn test_reattestation_verifies_same_root() {
        let svc = service();
        let a1 = svc.attest(AttestationDomain::TradeLicense, test_root(7)).unwrap();
        let a2 = svc.attest(AttestationDomain::TradeLicense, test_root(7)).unwrap();
        assert_eq!(a1.root, a2.root);
        verify_attestation(&a1, svc.context().public_keys.as_ref()).unwrap();
        verify_attestation(&a2, svc.context().public_keys.as_ref()).unwrap();
    }

    #[test]
    fn test_wrong_key_signature_rejected() {
        let svc = service();
        let att = svc
            .attest(AttestationDomain::LegalEntity, test_root(0x42))
            .unwrap();
        // A verifier whose known authority key differs from the signer.
        let other_ring = InMemoryKeyRing::generate_all();
        let err = verify_attestation(&att, &other_ring).unwrap_err();
        assert!(matches!(err, OracleError::SignerMismatch { .. }));
    }

    #[test]
    fn test_cross_domain_signature_rejected() {
        // A signature produced under one domain must not validate as an
        // attestation for another, even with the same root and signer.
        let svc = service();
        let att = svc
            .attest(AttestationDomain::LegalEntity, test_root(0x42))
            .unwrap();
        let mut forged = att.clone();
        forged.domain = AttestationDomain::TradeLicense;
        let err = verify_attestation(&forged, svc.context().public_keys.as_ref()).unwrap_err();
        // Either the signer differs (per-domain keys) or the message
        // rebuild fails the signature — both refuse the forgery.
        assert!(matches!(
            err,
            OracleError::SignerMismatch { .. } | OracleError::Crypto(_)
        ));
    }

    #[test]
    fn test_tampered_root_rejected() {
        let svc = service();
        let mut att = svc
            .attest(AttestationDomain::LegalEntity, test_root(0x42))
            .unwrap();
        att.root = test_root(0x43);
        assert!(verify_attestation(&att, svc.context().public_keys.as_ref()).is_err());
    }

    #[test]
    fn test_attestation_serde_roundtrip() {
        let svc = service();
        let att = svc
            .attest(AttestationDomain::ShippingDocument, test_root(9))
            .unwrap();
        let json = serde_json::to_string(&att).unwrap();
        let parsed: Attestation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.root, att.root);
        assert_eq!(parsed.signature, att.signature);
        verify_attestation(&parsed, svc.context().public_keys.as_ref()).unwrap();
    }
}
