//! The authorisation token: data model, issuance, and wire form.
//!
//! An [`Authorization`] is an immutable signed claim binding a user, a
//! login session, and the identity service that authenticated them to an
//! optional resource at a point in time. The only mutable state is a
//! transient verification cache, which never crosses the wire: every
//! deserialised token starts unverified.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use warrant_core::{canonical_format, now_truncated, parse_canonical, ServiceUid, SessionUid, UserUid};
use warrant_crypto::{KeyFingerprint, PublicKey, Signature, SigningKey};

use crate::errors::{AuthorizationError, Result};
use crate::message::canonical_message;
use crate::user::AuthenticatedUser;
use crate::verify::VerifyOptions;

/// Whether a token was minted for production use or by a test harness.
///
/// The tag is part of the token (and of its wire form) so that the
/// verification engine can statically refuse to validate a production
/// token with a caller-supplied test key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Signed by a real user session; verified via the trust registry.
    Production,
    /// Minted by a test harness; verified with a caller-supplied key.
    Testing,
}

/// The immutable signed claim. Never mutated after construction.
#[derive(Debug, Clone)]
pub(crate) struct Claims {
    pub(crate) user_uid: UserUid,
    pub(crate) session_uid: SessionUid,
    pub(crate) identity_url: String,
    pub(crate) identity_uid: ServiceUid,
    pub(crate) signed_at: DateTime<Utc>,
    pub(crate) signature: Signature,
    pub(crate) mode: TokenMode,
}

/// Which key context a cached verification was performed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyContext {
    /// Verified against the identity service's published key.
    Production,
    /// Verified against a test key with this fingerprint.
    Testing(KeyFingerprint),
}

/// Result of the last successful verification. Local to this token value;
/// never serialised.
#[derive(Debug, Clone)]
pub(crate) struct VerificationCache {
    pub(crate) verified_at: DateTime<Utc>,
    pub(crate) resource: Option<String>,
    pub(crate) context: KeyContext,
}

/// A signed authorisation token.
///
/// Created once at signing time, carried immutably across service
/// boundaries, and verified zero or more times by receiving services. A
/// token with no signature is the *null token*: a valid, inert placeholder
/// whose accessors all answer `None` and which fails every verification.
#[derive(Debug, Clone, Default)]
pub struct Authorization {
    pub(crate) claims: Option<Claims>,
    pub(crate) cache: Option<VerificationCache>,
}

/// Placeholder identity fields for testing-mode tokens.
const TEST_USER_UID: &str = "test-user";
const TEST_SESSION_UID: &str = "test-session";
const TEST_IDENTITY_URL: &str = "https://identity.invalid";
const TEST_IDENTITY_UID: &str = "test-identity";

impl Authorization {
    /// The null token: no claims, no signature.
    pub fn null() -> Self {
        Self::default()
    }

    /// Issue a token, mirroring the construction policy of the protocol:
    /// a resource-bound authorisation must have an authorising identity.
    ///
    /// Fails with `InvalidArgument` when a resource is given without a
    /// user; with both absent the null token is returned.
    pub fn new(resource: Option<&str>, user: Option<&dyn AuthenticatedUser>) -> Result<Self> {
        match (resource, user) {
            (_, Some(user)) => Self::issue(resource, user),
            (Some(resource), None) => Err(AuthorizationError::invalid_argument(format!(
                "an authenticated user is required to authorise resource '{resource}'"
            ))),
            (None, None) => Ok(Self::null()),
        }
    }

    /// Issue a token signed by an authenticated user.
    ///
    /// Records the signing time, signs the canonical message with the
    /// user's session key, and seeds the verification cache so the issuer
    /// never needs to immediately re-verify its own freshly minted token.
    pub fn issue(resource: Option<&str>, user: &dyn AuthenticatedUser) -> Result<Self> {
        Self::issue_at(now_truncated(), resource, user)
    }

    #[doc(hidden)]
    pub fn issue_at(
        now: DateTime<Utc>,
        resource: Option<&str>,
        user: &dyn AuthenticatedUser,
    ) -> Result<Self> {
        if !user.is_logged_in() {
            return Err(AuthorizationError::unauthenticated(format!(
                "user '{}' must be logged in to authorise an action",
                user.uid()
            )));
        }

        let message = canonical_message(
            user.uid(),
            user.session_uid(),
            user.identity_service_uid(),
            resource,
            now,
        );
        let signature = user.signing_key().sign(&message);

        debug!(
            user_uid = %user.uid(),
            session_uid = %user.session_uid(),
            resource = resource.unwrap_or("<none>"),
            "issued authorisation"
        );

        Ok(Self {
            claims: Some(Claims {
                user_uid: user.uid().clone(),
                session_uid: user.session_uid().clone(),
                identity_url: user.identity_service_url().to_string(),
                identity_uid: user.identity_service_uid().clone(),
                signed_at: now,
                signature,
                mode: TokenMode::Production,
            }),
            cache: Some(VerificationCache {
                verified_at: now,
                resource: resource.map(str::to_string),
                context: KeyContext::Production,
            }),
        })
    }

    /// Issue a testing-mode token signed with a raw key.
    ///
    /// Reserved for test harnesses: the identity fields are fixed
    /// placeholders and the token can only ever be verified with the
    /// matching test key, never through a trust registry.
    pub fn issue_for_testing(resource: Option<&str>, key: &SigningKey) -> Self {
        Self::issue_for_testing_at(now_truncated(), resource, key)
    }

    pub(crate) fn issue_for_testing_at(
        now: DateTime<Utc>,
        resource: Option<&str>,
        key: &SigningKey,
    ) -> Self {
        let user_uid = UserUid::from(TEST_USER_UID);
        let session_uid = SessionUid::from(TEST_SESSION_UID);
        let identity_uid = ServiceUid::from(TEST_IDENTITY_UID);

        let message = canonical_message(&user_uid, &session_uid, &identity_uid, resource, now);
        let signature = key.sign(&message);

        Self {
            claims: Some(Claims {
                user_uid,
                session_uid,
                identity_url: TEST_IDENTITY_URL.to_string(),
                identity_uid,
                signed_at: now,
                signature,
                mode: TokenMode::Testing,
            }),
            cache: Some(VerificationCache {
                verified_at: now,
                resource: resource.map(str::to_string),
                context: KeyContext::Testing(key.public_key().fingerprint()),
            }),
        }
    }

    /// Whether this is the null token.
    pub fn is_null(&self) -> bool {
        self.claims.is_none()
    }

    /// UID of the authorising user, or `None` for the null token.
    pub fn user_uid(&self) -> Option<&UserUid> {
        self.claims.as_ref().map(|c| &c.user_uid)
    }

    /// UID of the login session that authenticated the user.
    pub fn session_uid(&self) -> Option<&SessionUid> {
        self.claims.as_ref().map(|c| &c.session_uid)
    }

    /// Canonical URL of the identity service that authenticated the user.
    pub fn identity_url(&self) -> Option<&str> {
        self.claims.as_ref().map(|c| c.identity_url.as_str())
    }

    /// UID of that identity service.
    pub fn identity_uid(&self) -> Option<&ServiceUid> {
        self.claims.as_ref().map(|c| &c.identity_uid)
    }

    /// When the token was signed.
    pub fn signed_at(&self) -> Option<DateTime<Utc>> {
        self.claims.as_ref().map(|c| c.signed_at)
    }

    /// The raw signature.
    pub fn signature(&self) -> Option<&Signature> {
        self.claims.as_ref().map(|c| &c.signature)
    }

    /// Production or testing tag.
    pub fn mode(&self) -> Option<TokenMode> {
        self.claims.as_ref().map(|c| c.mode)
    }

    /// When this token instance last verified successfully, if it has.
    ///
    /// Verifications should be repeated periodically; see
    /// [`VerifyOptions::refresh_window`].
    pub fn last_verified_at(&self) -> Option<DateTime<Utc>> {
        self.cache.as_ref().map(|c| c.verified_at)
    }

    /// Cheap equality check: does this token claim to come from `user_uid`
    /// as registered on identity service `service_uid`? No cryptography is
    /// involved; only `verify` is authoritative.
    pub fn from_user(&self, user_uid: &UserUid, service_uid: &ServiceUid) -> bool {
        match &self.claims {
            Some(claims) => {
                &claims.user_uid == user_uid && &claims.identity_uid == service_uid
            }
            None => false,
        }
    }

    /// Whether the token is older than `staleness_window`.
    ///
    /// Staleness is a pure function of the signing timestamp; it is never
    /// reset by re-verification. The null token is always stale.
    pub fn is_stale(&self, staleness_window: Duration) -> bool {
        self.is_stale_at(now_truncated(), staleness_window)
    }

    #[doc(hidden)]
    pub fn is_stale_at(&self, now: DateTime<Utc>, staleness_window: Duration) -> bool {
        match &self.claims {
            Some(claims) => {
                let age = (now - claims.signed_at).to_std().unwrap_or(Duration::ZERO);
                age >= staleness_window
            }
            None => true,
        }
    }

    /// Probe the verification cache without side effects: is there a fresh,
    /// non-stale verification of `resource` on record, performed against
    /// the identity service's published key?
    ///
    /// A verification performed with a test key does not count; probe for
    /// one with [`Authorization::is_verified_with_key`].
    pub fn is_verified(&self, resource: Option<&str>, options: &VerifyOptions) -> bool {
        self.cache_probe(now_truncated(), resource, &KeyContext::Production, options)
    }

    /// Like [`Authorization::is_verified`], but for a verification that was
    /// performed with the given test key.
    pub fn is_verified_with_key(
        &self,
        resource: Option<&str>,
        key: &PublicKey,
        options: &VerifyOptions,
    ) -> bool {
        self.cache_probe(
            now_truncated(),
            resource,
            &KeyContext::Testing(key.fingerprint()),
            options,
        )
    }

    pub(crate) fn cache_probe(
        &self,
        now: DateTime<Utc>,
        resource: Option<&str>,
        context: &KeyContext,
        options: &VerifyOptions,
    ) -> bool {
        if self.is_stale_at(now, options.staleness_window) {
            return false;
        }
        let Some(cache) = &self.cache else {
            return false;
        };
        if cache.resource.as_deref() != resource || &cache.context != context {
            return false;
        }
        (now - cache.verified_at)
            .to_std()
            .map(|age| age < options.refresh_window)
            .unwrap_or(false)
    }

    /// Serialise to the wire mapping.
    ///
    /// Keys: `user_uid`, `session_uid`, `identity_url`, `identity_uid`,
    /// `auth_datetime` (canonical timestamp string), `signature` (base64),
    /// and `is_testing` for testing-mode tokens. The null token serialises
    /// to an empty mapping. The verification cache is never included.
    pub fn to_data(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if let Some(claims) = &self.claims {
            map.insert("user_uid".into(), claims.user_uid.as_str().into());
            map.insert("session_uid".into(), claims.session_uid.as_str().into());
            map.insert("identity_url".into(), claims.identity_url.as_str().into());
            map.insert("identity_uid".into(), claims.identity_uid.as_str().into());
            map.insert(
                "auth_datetime".into(),
                canonical_format(claims.signed_at).into(),
            );
            map.insert("signature".into(), claims.signature.to_base64().into());
            if claims.mode == TokenMode::Testing {
                map.insert("is_testing".into(), true.into());
            }
        }
        serde_json::Value::Object(map)
    }

    /// Deserialise from the wire mapping.
    ///
    /// An empty mapping yields the null token. A non-empty mapping missing
    /// a required field is rejected with `InvalidArgument` naming the
    /// field — there is no best-effort defaulting. The verification cache
    /// always starts empty: a freshly deserialised token must pass through
    /// `verify` before being trusted.
    pub fn from_data(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(AuthorizationError::invalid_argument(
                "authorisation data must be a mapping",
            ));
        }
        let raw: RawRecord = serde_json::from_value(value)
            .map_err(|e| AuthorizationError::invalid_argument(e.to_string()))?;
        Self::from_record(raw)
    }

    fn to_record(&self) -> RawRecord {
        match &self.claims {
            Some(claims) => RawRecord {
                user_uid: Some(claims.user_uid.as_str().to_string()),
                session_uid: Some(claims.session_uid.as_str().to_string()),
                identity_url: Some(claims.identity_url.clone()),
                identity_uid: Some(claims.identity_uid.as_str().to_string()),
                auth_datetime: Some(canonical_format(claims.signed_at)),
                signature: Some(claims.signature.to_base64()),
                is_testing: (claims.mode == TokenMode::Testing).then_some(true),
            },
            None => RawRecord::default(),
        }
    }

    fn from_record(raw: RawRecord) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self::null());
        }

        fn require<T>(field: Option<T>, name: &str) -> Result<T> {
            field.ok_or_else(|| {
                AuthorizationError::invalid_argument(format!(
                    "authorisation data is missing required field '{name}'"
                ))
            })
        }

        let signed_at = parse_canonical(&require(raw.auth_datetime, "auth_datetime")?)
            .map_err(|e| AuthorizationError::invalid_argument(e.to_string()))?;
        let signature = Signature::from_base64(&require(raw.signature, "signature")?)
            .map_err(|e| AuthorizationError::invalid_argument(e.to_string()))?;

        Ok(Self {
            claims: Some(Claims {
                user_uid: UserUid::from(require(raw.user_uid, "user_uid")?),
                session_uid: SessionUid::from(require(raw.session_uid, "session_uid")?),
                identity_url: require(raw.identity_url, "identity_url")?,
                identity_uid: ServiceUid::from(require(raw.identity_uid, "identity_uid")?),
                signed_at,
                signature,
                mode: if raw.is_testing.unwrap_or(false) {
                    TokenMode::Testing
                } else {
                    TokenMode::Production
                },
            }),
            cache: None,
        })
    }
}

/// Wire shape of the token. All fields optional so that the null token's
/// empty mapping and a populated mapping share one record; `from_record`
/// enforces the all-or-nothing rule.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_testing: Option<bool>,
}

impl RawRecord {
    fn is_empty(&self) -> bool {
        self.user_uid.is_none()
            && self.session_uid.is_none()
            && self.identity_url.is_none()
            && self.identity_uid.is_none()
            && self.auth_datetime.is_none()
            && self.signature.is_none()
            && self.is_testing.is_none()
    }
}

impl Serialize for Authorization {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Authorization {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawRecord::deserialize(deserializer)?;
        Self::from_record(raw).map_err(D::Error::custom)
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.claims {
            Some(claims) => write!(f, "Authorization(signature={})", claims.signature.to_base64()),
            None => write!(f, "Authorization(null)"),
        }
    }
}

/// Structural comparison of signatures. Two null tokens compare equal.
/// Equality says nothing about validity; only `verify` is authoritative.
impl PartialEq for Authorization {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

impl Eq for Authorization {}
