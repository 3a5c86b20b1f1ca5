//! # Error Types — Shared Error Layer
//!
//! Defines the error types shared across the Provara workspace. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! Component-specific error taxonomies (document validation, circuit
//! refusals, registry conflicts, composition ordering) live in their owning
//! crates; this module holds only the kinds that every layer needs:
//! canonicalization, cryptographic primitives, and schema-style validation.
//!
//! ## Design
//!
//! - Cryptographic errors fail loudly with full context.
//! - Validation errors carry the offending value, not just a kind.
//! - Cryptographic failures are never downgraded to a negative verdict —
//!   callers abort the attempt instead.

use thiserror::Error;

/// Top-level error type for core primitives.
#[derive(Error, Debug)]
pub enum ProvaraError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Input failed structural validation.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Scores and counts must be integers; monetary amounts must be strings.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Digest or tree-hash computation failed.
    #[error("digest error: {0}")]
    DigestError(String),
}
