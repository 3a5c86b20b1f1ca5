//! # Deployment Context
//!
//! A single explicit value carrying everything environment-dependent: the
//! network identity and the key resolvers. It is passed into the oracle
//! service and the circuit, never read from ambient or global state —
//! there is no LOCAL/TESTNET/MAINNET branching anywhere in business logic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::keys::{InMemoryKeyRing, PublicKeyResolver, SigningKeyResolver};

/// The network a deployment targets.
///
/// Informational only: the engine's behavior is identical on every
/// network; only key material and downstream submission differ, and both
/// arrive through injected capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkId {
    /// Local development network.
    Local,
    /// Public test network.
    Testnet,
    /// Production network.
    Mainnet,
}

impl NetworkId {
    /// The string identifier for this network.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit deployment configuration: network identity plus the key
/// resolution capabilities for both sides of the attestation protocol.
#[derive(Clone)]
pub struct DeploymentContext {
    /// The network this deployment targets.
    pub network: NetworkId,
    /// Oracle-side signing key resolution.
    pub signing_keys: Arc<dyn SigningKeyResolver>,
    /// Verifier-side public key resolution.
    pub public_keys: Arc<dyn PublicKeyResolver>,
}

impl DeploymentContext {
    /// Build a context from explicit resolvers.
    pub fn new(
        network: NetworkId,
        signing_keys: Arc<dyn SigningKeyResolver>,
        public_keys: Arc<dyn PublicKeyResolver>,
    ) -> Self {
        Self {
            network,
            signing_keys,
            public_keys,
        }
    }

    /// A local-development context backed by one freshly generated
    /// in-memory key ring serving both resolver roles.
    pub fn local_dev() -> Self {
        let ring = Arc::new(InMemoryKeyRing::generate_all());
        Self {
            network: NetworkId::Local,
            signing_keys: ring.clone(),
            public_keys: ring,
        }
    }
}

impl std::fmt::Debug for DeploymentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentContext")
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}
