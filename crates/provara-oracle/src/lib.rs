//! # provara-oracle — Oracle Attestation Layer
//!
//! Binds a document Merkle root to a trusted data source: a domain-scoped
//! authority signs the root, and the resulting [`Attestation`] is the only
//! form in which a root enters the compliance circuit.
//!
//! - **Context** (`context.rs`): `DeploymentContext` — network identity and
//!   key resolvers, passed explicitly. Business logic never branches on an
//!   ambient environment value.
//! - **Keys** (`keys.rs`): the injected key-resolution capability
//!   (`SigningKeyResolver` / `PublicKeyResolver` traits) and the
//!   `InMemoryKeyRing` used by tests and local deployments. How keys are
//!   stored and rotated across environments is an external concern.
//! - **Attestation** (`attest.rs`): `OracleAttestationService::attest` and
//!   `verify_attestation` — sign/verify the domain-tagged canonical root
//!   message.
//!
//! ## Key Scoping
//!
//! One Ed25519 keypair per attestation domain. The signed message embeds
//! the domain identifier, so a trade-authority signature can never validate
//! a legal-entity attestation even if the same root bytes appear in both.

pub mod attest;
pub mod context;
pub mod keys;

pub use attest::{verify_attestation, Attestation, OracleAttestationService, OracleError};
pub use context::{DeploymentContext, NetworkId};
pub use keys::{InMemoryKeyRing, PublicKeyResolver, SigningKeyResolver};
