//! Authenticated-user capability, consumed at issuance time only.

use warrant_core::{ServiceUid, SessionUid, UserUid};
use warrant_crypto::SigningKey;

/// What the token issuer needs to know about the authenticated user.
///
/// Supplied by the client-side login machinery. The signing key is the
/// session key registered with the identity service at login; it never
/// leaves the issuing process.
pub trait AuthenticatedUser {
    /// UID of the user.
    fn uid(&self) -> &UserUid;

    /// UID of the current login session.
    fn session_uid(&self) -> &SessionUid;

    /// Canonical URL of the identity service that authenticated the user.
    fn identity_service_url(&self) -> &str;

    /// UID of that identity service.
    fn identity_service_uid(&self) -> &ServiceUid;

    /// The session signing key.
    fn signing_key(&self) -> &SigningKey;

    /// Whether the user is currently logged in.
    fn is_logged_in(&self) -> bool;
}
