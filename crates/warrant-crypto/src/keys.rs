//! Ed25519 key and signature wrappers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer, Verifier};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::CryptoError;

/// A private signing key. Never leaves the process that owns it.
pub struct SigningKey(ed25519_dalek::SigningKey);

impl SigningKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut OsRng))
    }

    /// Reconstruct a key from its 32 seed bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(bytes))
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }

    /// The public half of this key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material.
        write!(f, "SigningKey({})", self.public_key().fingerprint())
    }
}

/// A public verifying key, as published by an identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(ed25519_dalek::VerifyingKey);

impl PublicKey {
    /// Check `signature` over `message`, failing if either is wrong.
    pub fn verify(&self, signature: &Signature, message: &[u8]) -> Result<(), CryptoError> {
        self.0
            .verify(message, &signature.0)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }

    /// The key's 32 raw bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Reconstruct a key from its 32 raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// A stable fingerprint of this key (SHA-256 of the key bytes).
    pub fn fingerprint(&self) -> KeyFingerprint {
        let digest = Sha256::digest(self.to_bytes());
        KeyFingerprint(hex::encode(digest))
    }
}

/// A detached Ed25519 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    /// The signature's 64 raw bytes.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    /// Reconstruct a signature from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: &[u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidSignature(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(ed25519_dalek::Signature::from_bytes(bytes)))
    }

    /// Encode for transport (standard base64).
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// Decode the transport encoding.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

/// Cheap equality token identifying a public key.
///
/// The verification cache records which key context last validated a token;
/// a fingerprint gives that equality check without retaining key material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyFingerprint(String);

impl fmt::Display for KeyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let key = SigningKey::generate();
        let signature = key.sign(b"authorise the thing");
        assert!(key
            .public_key()
            .verify(&signature, b"authorise the thing")
            .is_ok());
        assert!(key
            .public_key()
            .verify(&signature, b"authorise another thing")
            .is_err());
    }

    #[test]
    fn wrong_key_fails_verification() {
        let signer = SigningKey::generate();
        let other = SigningKey::generate();
        let signature = signer.sign(b"message");
        assert!(other.public_key().verify(&signature, b"message").is_err());
    }

    #[test]
    fn signature_base64_round_trip() {
        let key = SigningKey::generate();
        let signature = key.sign(b"payload");
        let restored = Signature::from_base64(&signature.to_base64()).unwrap();
        assert_eq!(restored, signature);
    }

    #[test]
    fn signature_rejects_bad_lengths() {
        assert!(Signature::from_slice(&[0u8; 63]).is_err());
        assert!(Signature::from_base64("not base64!!").is_err());
    }

    #[test]
    fn public_key_byte_round_trip() {
        let key = SigningKey::generate().public_key();
        let restored = PublicKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(restored, key);
        assert_eq!(restored.fingerprint(), key.fingerprint());
    }

    #[test]
    fn fingerprints_distinguish_keys() {
        let a = SigningKey::generate().public_key();
        let b = SigningKey::generate().public_key();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
