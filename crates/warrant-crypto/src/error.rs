//! Error type for key and signature handling.

/// Errors from key decoding and signature verification.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CryptoError {
    /// Key bytes were malformed or not a valid curve point.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Signature bytes were malformed (wrong length or encoding).
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// A well-formed signature did not verify against the message.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),
}
