//! Error taxonomy of the authorisation protocol.
//!
//! Every variant below is a denial. The kind is preserved so logs can say
//! *why* a verification was refused, but callers must treat all of them
//! identically: deny the action, never fall back to "allow".

use serde::{Deserialize, Serialize};

/// Errors raised while issuing or verifying an [`Authorization`].
///
/// [`Authorization`]: crate::Authorization
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AuthorizationError {
    /// Malformed construction request, e.g. a resource given with no
    /// authority to sign it, or a wire mapping missing a required field.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was malformed.
        message: String,
    },

    /// The supplied user capability is not logged in.
    #[error("unauthenticated: {message}")]
    Unauthenticated {
        /// Which requirement failed.
        message: String,
    },

    /// Operation attempted on a null token.
    #[error("invalid state: {message}")]
    InvalidState {
        /// What the null token was asked to do.
        message: String,
    },

    /// The token is older than the staleness window.
    #[error("authorisation expired: {message}")]
    Expired {
        /// Age and window details.
        message: String,
    },

    /// The claimed identity service is not in the trust registry, or
    /// cannot act as an identity provider.
    #[error("untrusted service: {message}")]
    UntrustedService {
        /// The offending URL or capability gap.
        message: String,
    },

    /// The resolved service's UID disagrees with the UID recorded in the
    /// token. Detects a URL re-pointed to a different service since signing.
    #[error("identity mismatch: {message}")]
    IdentityMismatch {
        /// Recorded vs resolved UIDs.
        message: String,
    },

    /// The login session was logged out at or after the token was signed.
    #[error("session revoked: {message}")]
    SessionRevoked {
        /// Logout/signing times.
        message: String,
    },

    /// A test key was offered for a production-signed token, or vice versa.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Which key/mode combination was refused.
        message: String,
    },

    /// Signature mismatch, transport fault, malformed key, or any other
    /// internal fault during verification.
    #[error("verification failed: {message}")]
    VerificationFailed {
        /// The underlying cause, preserved for diagnostics.
        message: String,
    },
}

impl AuthorizationError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an expired error.
    pub fn expired(message: impl Into<String>) -> Self {
        Self::Expired {
            message: message.into(),
        }
    }

    /// Create an untrusted-service error.
    pub fn untrusted_service(message: impl Into<String>) -> Self {
        Self::UntrustedService {
            message: message.into(),
        }
    }

    /// Create an identity-mismatch error.
    pub fn identity_mismatch(message: impl Into<String>) -> Self {
        Self::IdentityMismatch {
            message: message.into(),
        }
    }

    /// Create a session-revoked error.
    pub fn session_revoked(message: impl Into<String>) -> Self {
        Self::SessionRevoked {
            message: message.into(),
        }
    }

    /// Create a permission-denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a verification-failed error.
    pub fn verification_failed(message: impl Into<String>) -> Self {
        Self::VerificationFailed {
            message: message.into(),
        }
    }

    /// Whether this error must be treated as an access denial.
    ///
    /// Always true: the taxonomy distinguishes causes for logging only.
    /// Callers deciding whether to allow an action must not branch on the
    /// kind.
    pub fn is_denial(&self) -> bool {
        true
    }
}

impl From<warrant_crypto::CryptoError> for AuthorizationError {
    fn from(err: warrant_crypto::CryptoError) -> Self {
        Self::verification_failed(err.to_string())
    }
}

/// Standard result type for authorisation operations.
pub type Result<T> = std::result::Result<T, AuthorizationError>;
