//! # Key Resolution — Injected Capability
//!
//! The engine never reads key material from globals or environment
//! variables. Signing keys (oracle side) and public keys (verifier side)
//! are resolved through these traits, and the concrete resolver is chosen
//! by the embedding deployment: an HSM adapter in production, the
//! [`InMemoryKeyRing`] in tests and local runs.
//!
//! Substitutable resolvers are what make multi-domain, multi-environment
//! testing straightforward — a test can hand the circuit a resolver that
//! knows a different key than the one that signed, and assert the
//! signature gate fires.

use std::collections::BTreeMap;

use provara_core::AttestationDomain;
use provara_crypto::{AuthorityKeypair, AuthorityPublicKey};

/// Resolves the signing keypair for an attestation domain (oracle side).
pub trait SigningKeyResolver: Send + Sync {
    /// The keypair scoped to `domain`, or `None` if no key is registered.
    fn signing_key(&self, domain: AttestationDomain) -> Option<&AuthorityKeypair>;
}

/// Resolves the known public key for an attestation domain (verifier side).
pub trait PublicKeyResolver: Send + Sync {
    /// The public key scoped to `domain`, or `None` if unknown.
    fn public_key(&self, domain: AttestationDomain) -> Option<AuthorityPublicKey>;
}

/// An in-memory key ring holding one keypair per registered domain.
///
/// Serves both resolver roles. Used by tests and local deployments; real
/// deployments adapt their secrets store behind the same traits.
#[derive(Default)]
pub struct InMemoryKeyRing {
    keys: BTreeMap<AttestationDomain, AuthorityKeypair>,
}

impl InMemoryKeyRing {
    /// An empty key ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// A key ring with a freshly generated keypair for every domain.
    pub fn generate_all() -> Self {
        let mut ring = Self::new();
        for domain in AttestationDomain::all_domains() {
            ring.insert(*domain, AuthorityKeypair::generate());
        }
        ring
    }

    /// Register (or replace) the keypair for a domain.
    pub fn insert(&mut self, domain: AttestationDomain, keypair: AuthorityKeypair) {
        self.keys.insert(domain, keypair);
    }

    /// The domains this ring holds keys for.
    pub fn domains(&self) -> Vec<AttestationDomain> {
        self.keys.keys().copied().collect()
    }
}

impl SigningKeyResolver for InMemoryKeyRing {
    fn signing_key(&self, domain: AttestationDomain) -> Option<&AuthorityKeypair> {
        self.keys.get(&domain)
    }
}

impl PublicKeyResolver for InMemoryKeyRing {
    fn public_key(&self, domain: AttestationDomain) -> Option<AuthorityPublicKey> {
        self.keys.get(&domain).map(|kp| kp.public_key())
    }
}

impl std::fmt::Debug for InMemoryKeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keypairs redact themselves; list only the registered domains.
        f.debug_struct("InMemoryKeyRing")
            .field("domains", &self.domains())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_all_covers_every_domain() {
        let ring = InMemoryKeyRing::generate_all();
        for domain in AttestationDomain::all_domains() {
            assert!(ring.signing_key(*domain).is_some());
            assert!(ring.public_key(*domain).is_some());
        }
    }

    #[test]
    fn test_empty_ring_resolves_nothing() {
        let ring = InMemoryKeyRing::new();
        assert!(ring.signing_key(AttestationDomain::LegalEntity).is_none());
        assert!(ring.public_key(AttestationDomain::LegalEntity).is_none());
    }

    #[test]
    fn test_public_key_matches_signing_key() {
        let ring = InMemoryKeyRing::generate_all();
        let domain = AttestationDomain::TradeLicense;
        let expected = ring.signing_key(domain).unwrap().public_key();
        assert_eq!(ring.public_key(domain).unwrap(), expected);
    }

    #[test]
    fn test_keys_are_domain_distinct() {
        let ring = InMemoryKeyRing::generate_all();
        let a = ring.public_key(AttestationDomain::LegalEntity).unwrap();
        let b = ring.public_key(AttestationDomain::TradeLicense).unwrap();
        assert_ne!(a, b);
    }
}
