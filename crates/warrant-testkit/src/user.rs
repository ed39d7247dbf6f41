//! Test stand-in for the authenticated-user capability.

use warrant_authorization::AuthenticatedUser;
use warrant_core::{ServiceUid, SessionUid, UserUid};
use warrant_crypto::{PublicKey, SigningKey};

/// An authenticated user with a freshly generated session key.
pub struct TestUser {
    uid: UserUid,
    session_uid: SessionUid,
    identity_url: String,
    identity_uid: ServiceUid,
    signing_key: SigningKey,
    logged_in: bool,
}

impl TestUser {
    /// A logged-in user authenticated by the identity service at
    /// `identity_url` with UID `identity_uid`.
    pub fn logged_in(
        uid: &str,
        session_uid: &str,
        identity_url: &str,
        identity_uid: &str,
    ) -> Self {
        Self {
            uid: uid.into(),
            session_uid: session_uid.into(),
            identity_url: identity_url.to_string(),
            identity_uid: identity_uid.into(),
            signing_key: SigningKey::generate(),
            logged_in: true,
        }
    }

    /// Same shape, but reporting not-logged-in.
    pub fn logged_out(
        uid: &str,
        session_uid: &str,
        identity_url: &str,
        identity_uid: &str,
    ) -> Self {
        Self {
            logged_in: false,
            ..Self::logged_in(uid, session_uid, identity_url, identity_uid)
        }
    }

    /// The public half of this user's session key, as the identity
    /// service would publish it.
    pub fn public_key(&self) -> PublicKey {
        self.signing_key.public_key()
    }

    /// UID of the user's identity service.
    pub fn identity_uid(&self) -> &ServiceUid {
        &self.identity_uid
    }
}

impl AuthenticatedUser for TestUser {
    fn uid(&self) -> &UserUid {
        &self.uid
    }

    fn session_uid(&self) -> &SessionUid {
        &self.session_uid
    }

    fn identity_service_url(&self) -> &str {
        &self.identity_url
    }

    fn identity_service_uid(&self) -> &ServiceUid {
        &self.identity_uid
    }

    fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }
}
