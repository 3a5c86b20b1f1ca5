//! # Authority Signing — Ed25519 for Oracle Attestations
//!
//! Ed25519 key generation, signing, and verification for the oracle
//! attestation layer. Each attestation authority (one per document domain)
//! holds one keypair; attestations are signatures over the domain-tagged
//! canonical root message built by `provara-oracle`.
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&CanonicalBytes` — you cannot sign raw bytes.
//!   All signed material flows through the JCS pipeline, so an oracle and
//!   a verifier can never disagree about the byte encoding of a message.
//! - Private keys are never serialized or logged. `AuthorityKeypair` does
//!   not implement `Serialize` and its `Debug` output is redacted.
//!
//! ## Serde
//!
//! Public keys and signatures serialize as lowercase hex strings.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use provara_core::error::CryptoError;
use provara_core::CanonicalBytes;

use crate::hash32::{hex_prefix, hex_to_bytes};

/// An Ed25519 public key (32 bytes) identifying an attestation authority.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AuthorityPublicKey(pub [u8; 32]);

/// An Ed25519 signature (64 bytes) over a canonical attestation message.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AuthoritySignature(pub [u8; 64]);

/// An Ed25519 keypair held by one attestation authority.
///
/// Does not implement `Serialize` — private keys must not leak into logs,
/// artifacts, or exported proofs.
pub struct AuthorityKeypair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// AuthorityPublicKey
// ---------------------------------------------------------------------------

impl AuthorityPublicKey {
    /// Wrap raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.trim().to_lowercase();
        if hex.len() != 64 {
            return Err(CryptoError::KeyError(format!(
                "public key hex must be 64 chars, got {}",
                hex.len()
            )));
        }
        let bytes = hex_to_bytes(&hex).map_err(CryptoError::KeyError)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::KeyError(format!("invalid public key: {e}")))
    }
}

impl Serialize for AuthorityPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AuthorityPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for AuthorityPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthorityPublicKey({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for AuthorityPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// AuthoritySignature
// ---------------------------------------------------------------------------

impl AuthoritySignature {
    /// Wrap raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse from a 128-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.trim().to_lowercase();
        if hex.len() != 128 {
            return Err(CryptoError::VerificationFailed(format!(
                "signature hex must be 128 chars, got {}",
                hex.len()
            )));
        }
        let bytes = hex_to_bytes(&hex).map_err(CryptoError::VerificationFailed)?;
        let mut arr = [0u8; 64];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Serialize for AuthoritySignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AuthoritySignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for AuthoritySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthoritySignature({}...)", hex_prefix(&self.0))
    }
}

impl std::fmt::Display for AuthoritySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// AuthorityKeypair
// ---------------------------------------------------------------------------

impl AuthorityKeypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from a raw 32-byte seed.
    ///
    /// Used by key-material providers that derive per-domain keys from a
    /// managed secret; tests use it for reproducible authorities.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The public key of this authority.
    pub fn public_key(&self) -> AuthorityPublicKey {
        AuthorityPublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a canonical message.
    ///
    /// The input MUST be `&CanonicalBytes` — the attestation message is
    /// canonicalized before it reaches the key, so verifiers rebuild the
    /// identical byte sequence from the attestation's public fields.
    pub fn sign(&self, data: &CanonicalBytes) -> AuthoritySignature {
        let sig = self.signing_key.sign(data.as_bytes());
        AuthoritySignature(sig.to_bytes())
    }
}

impl std::fmt::Debug for AuthorityKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthorityKeypair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify an authority signature over a canonical message.
///
/// Returns `Ok(())` if valid, `Err(CryptoError::VerificationFailed)`
/// otherwise. The message parameter is `&CanonicalBytes`, enforcing at
/// compile time that only canonicalized data can be verified.
pub fn verify(
    data: &CanonicalBytes,
    signature: &AuthoritySignature,
    public_key: &AuthorityPublicKey,
) -> Result<(), CryptoError> {
    let vk = public_key.to_verifying_key()?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(format!("Ed25519 verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(v: &serde_json::Value) -> CanonicalBytes {
        CanonicalBytes::new(v).expect("should canonicalize")
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = AuthorityKeypair::generate();
        let msg = canonical(&serde_json::json!({
            "domain": "legal_entity",
            "root": "ab".repeat(32),
        }));
        let sig = kp.sign(&msg);
        verify(&msg, &sig, &kp.public_key()).expect("valid signature should verify");
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let signer = AuthorityKeypair::generate();
        let other = AuthorityKeypair::generate();
        let msg = canonical(&serde_json::json!({"domain": "trade_license"}));
        let sig = signer.sign(&msg);
        assert!(verify(&msg, &sig, &other.public_key()).is_err());
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        let kp = AuthorityKeypair::generate();
        let signed = canonical(&serde_json::json!({"root": "aa".repeat(32)}));
        let tampered = canonical(&serde_json::json!({"root": "bb".repeat(32)}));
        let sig = kp.sign(&signed);
        assert!(verify(&tampered, &sig, &kp.public_key()).is_err());
    }

    #[test]
    fn test_deterministic_from_seed() {
        let seed = [7u8; 32];
        let kp1 = AuthorityKeypair::from_seed(&seed);
        let kp2 = AuthorityKeypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let pk = AuthorityKeypair::generate().public_key();
        let parsed = AuthorityPublicKey::from_hex(&pk.to_hex()).unwrap();
        assert_eq!(pk, parsed);
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let kp = AuthorityKeypair::generate();
        let sig = kp.sign(&canonical(&serde_json::json!({"x": 1})));
        let parsed = AuthoritySignature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(sig, parsed);
    }

    #[test]
    fn test_serde_hex_strings() {
        let kp = AuthorityKeypair::generate();
        let pk_json = serde_json::to_string(&kp.public_key()).unwrap();
        assert_eq!(pk_json.len(), 64 + 2);
        let sig = kp.sign(&canonical(&serde_json::json!({"y": 2})));
        let sig_json = serde_json::to_string(&sig).unwrap();
        assert_eq!(sig_json.len(), 128 + 2);
        let pk2: AuthorityPublicKey = serde_json::from_str(&pk_json).unwrap();
        assert_eq!(kp.public_key(), pk2);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        assert!(AuthorityPublicKey::from_hex("not-hex").is_err());
        assert!(AuthorityPublicKey::from_hex("aabb").is_err());
        assert!(AuthoritySignature::from_hex(&"zz".repeat(64)).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_private_key() {
        let kp = AuthorityKeypair::generate();
        assert_eq!(format!("{kp:?}"), "AuthorityKeypair(<private>)");
    }
}
