//! # Proof Backend Policy
//!
//! The engine's proof artifacts are produced by a transparent deterministic
//! backend (SHA-256 over the canonical proof statement) standing in for the
//! external succinct proving engine. Transparent proofs are verifiable but
//! carry no zero-knowledge guarantee, so a verifier that accepts them in
//! production would accept proofs from anyone holding the public data.
//!
//! [`ProofPolicy`] is checked before a proof is accepted as authoritative
//! (registry updates, composition): production mode rejects the
//! transparent backend unconditionally.
//!
//! ## Configuration
//!
//! The mode is determined by, in order:
//! 1. The `PROVARA_PROOF_POLICY` environment variable (`production` /
//!    `development`), read only at the composition root.
//! 2. Compile-time default: release builds are `Production`, debug builds
//!    are `Development`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from proof policy enforcement.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Transparent proof rejected in production mode.
    #[error("transparent proof rejected: production mode requires a real proving backend ({backend})")]
    TransparentProofRejected {
        /// The proof backend that was rejected.
        backend: String,
    },
}

/// The backend that produced a proof artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofBackend {
    /// Deterministic SHA-256 statement digest — no zero-knowledge privacy.
    Transparent,
    /// Groth16 SNARK via the external proving engine.
    Groth16,
    /// PLONK via the external proving engine.
    Plonk,
}

impl ProofBackend {
    /// Whether this backend provides real zero-knowledge guarantees.
    pub fn is_real(self) -> bool {
        matches!(self, Self::Groth16 | Self::Plonk)
    }

    /// Human-readable backend name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Transparent => "transparent-sha256",
            Self::Groth16 => "groth16",
            Self::Plonk => "plonk",
        }
    }
}

/// Proof policy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyMode {
    /// Reject transparent proofs unconditionally.
    Production,
    /// Accept transparent proofs (tests and local development).
    Development,
}

/// Runtime policy deciding whether a proof backend is acceptable.
#[derive(Debug, Clone)]
pub struct ProofPolicy {
    mode: PolicyMode,
}

impl ProofPolicy {
    /// Create a policy with the given mode.
    pub fn new(mode: PolicyMode) -> Self {
        Self { mode }
    }

    /// A production policy (rejects transparent proofs).
    pub fn production() -> Self {
        Self::new(PolicyMode::Production)
    }

    /// A development policy (accepts transparent proofs).
    pub fn development() -> Self {
        Self::new(PolicyMode::Development)
    }

    /// Resolve the policy from the environment.
    ///
    /// `PROVARA_PROOF_POLICY=production|development` overrides; otherwise
    /// release builds default to `Production` and debug builds to
    /// `Development`.
    pub fn from_environment() -> Self {
        if let Ok(val) = std::env::var("PROVARA_PROOF_POLICY") {
            match val.to_lowercase().as_str() {
                "production" | "prod" => return Self::production(),
                "development" | "dev" => return Self::development(),
                _ => {} // Fall through to the compile-time default.
            }
        }
        if cfg!(not(debug_assertions)) {
            Self::production()
        } else {
            Self::development()
        }
    }

    /// Validate a proof backend under this policy.
    pub fn validate(&self, backend: ProofBackend) -> Result<(), PolicyError> {
        match self.mode {
            PolicyMode::Production if !backend.is_real() => {
                Err(PolicyError::TransparentProofRejected {
                    backend: backend.name().to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Current policy mode.
    pub fn mode(&self) -> PolicyMode {
        self.mode
    }
}
