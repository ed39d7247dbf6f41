//! Signing-key and public-key capabilities for the Warrant protocol.
//!
//! The authorisation core treats key material as an opaque capability: a
//! signing key can produce a signature over a message, a public key can
//! check one. This crate supplies that capability as thin wrappers over
//! Ed25519 (`ed25519-dalek`), plus the transport encoding of signatures and
//! a cheap fingerprint for recording *which* key verified a token without
//! holding the key material itself.

mod error;
mod keys;

pub use error::CryptoError;
pub use keys::{KeyFingerprint, PublicKey, Signature, SigningKey};
