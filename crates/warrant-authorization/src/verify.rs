//! The verification engine.
//!
//! This is the protocol state machine run by every receiving service:
//! null check, staleness check, cache short-circuit, then either the
//! test-key branch or the full production branch (trust resolution,
//! identity-provider check, UID match, session revocation, signature
//! check), ending with a cache update. The cache is written only after
//! every network call has completed, so a cancelled verification leaves
//! the token exactly as it found it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use warrant_core::now_truncated;
use warrant_crypto::PublicKey;

use crate::authorization::{Authorization, KeyContext, TokenMode, VerificationCache};
use crate::errors::{AuthorizationError, Result};
use crate::message::canonical_message;
use crate::trust::TrustResolver;

fn default_refresh_window() -> Duration {
    Duration::from_secs(3600)
}

fn default_staleness_window() -> Duration {
    Duration::from_secs(7200)
}

fn default_network_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Policy knobs for a verification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// How long a successful verification may be reused from the cache
    /// before the network-dependent checks must run again.
    #[serde(default = "default_refresh_window")]
    pub refresh_window: Duration,

    /// Maximum token age, measured from the signing timestamp. At or
    /// beyond this age the token is unconditionally invalid.
    #[serde(default = "default_staleness_window")]
    pub staleness_window: Duration,

    /// Skip the cache and re-run the full verification.
    #[serde(default)]
    pub force: bool,

    /// Bound on each network round trip (trust resolution, whois, key
    /// fetch). A timeout surfaces as `VerificationFailed`.
    #[serde(default = "default_network_timeout")]
    pub network_timeout: Duration,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            refresh_window: default_refresh_window(),
            staleness_window: default_staleness_window(),
            force: false,
            network_timeout: default_network_timeout(),
        }
    }
}

impl VerifyOptions {
    /// Default options with the cache bypassed.
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }
}

/// Who vouches for the signature in this verification call.
#[doc(hidden)]
pub enum Authority<'a> {
    /// The identity service's published key, found via the trust registry.
    Production(&'a dyn TrustResolver),
    /// A caller-supplied test key; only testing-mode tokens accept it.
    Testing(&'a PublicKey),
}

/// Run `fut` under the configured network timeout.
async fn bounded<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AuthorizationError::verification_failed(format!(
            "{what} timed out after {limit:?}"
        ))),
    }
}

/// Collapse unexpected fault kinds from a collaborator into
/// `VerificationFailed`, keeping the protocol's own kinds intact.
fn normalise(err: AuthorizationError, what: &str) -> AuthorizationError {
    match err {
        e @ (AuthorizationError::UntrustedService { .. }
        | AuthorizationError::IdentityMismatch { .. }
        | AuthorizationError::SessionRevoked { .. }
        | AuthorizationError::VerificationFailed { .. }) => e,
        other => AuthorizationError::verification_failed(format!("{what}: {other}")),
    }
}

impl Authorization {
    /// Verify this token for `resource` against the caller's trust
    /// registry.
    ///
    /// The resource must be the same string supplied at signing time; it
    /// is bound into the signed message, not stored in the token. Any
    /// returned error is a denial — see
    /// [`AuthorizationError::is_denial`].
    pub async fn verify(
        &mut self,
        resource: Option<&str>,
        resolver: &dyn TrustResolver,
        options: &VerifyOptions,
    ) -> Result<()> {
        self.verify_at(now_truncated(), resource, Authority::Production(resolver), options)
            .await
    }

    /// Verify a testing-mode token with a caller-supplied test key.
    ///
    /// Fails with `PermissionDenied` when the token was not minted in
    /// testing mode, so a test key can never validate a production token.
    pub async fn verify_with_test_key(
        &mut self,
        resource: Option<&str>,
        key: &PublicKey,
        options: &VerifyOptions,
    ) -> Result<()> {
        self.verify_at(now_truncated(), resource, Authority::Testing(key), options)
            .await
    }

    #[doc(hidden)]
    pub async fn verify_at(
        &mut self,
        now: DateTime<Utc>,
        resource: Option<&str>,
        authority: Authority<'_>,
        options: &VerifyOptions,
    ) -> Result<()> {
        let claims = self.claims.clone().ok_or_else(|| {
            AuthorizationError::invalid_state("cannot verify the null authorisation")
        })?;

        // Staleness is never reset by re-verification and is checked
        // before anything that could touch the network.
        if self.is_stale_at(now, options.staleness_window) {
            let age = (now - claims.signed_at).num_seconds();
            warn!(age_secs = age, "refusing stale authorisation");
            return Err(AuthorizationError::expired(format!(
                "signed {age}s ago, staleness window is {}s",
                options.staleness_window.as_secs()
            )));
        }

        let context = match &authority {
            Authority::Production(_) => KeyContext::Production,
            Authority::Testing(key) => KeyContext::Testing(key.fingerprint()),
        };

        // A cached result is only reusable for the same resource under the
        // same key context; any mismatch falls through to the full path.
        if !options.force && self.cache_probe(now, resource, &context, options) {
            debug!(resource = resource.unwrap_or("<none>"), "verification cache hit");
            return Ok(());
        }

        let message = canonical_message(
            &claims.user_uid,
            &claims.session_uid,
            &claims.identity_uid,
            resource,
            claims.signed_at,
        );

        match authority {
            Authority::Testing(key) => {
                if claims.mode != TokenMode::Testing {
                    warn!("test key offered for a production authorisation");
                    return Err(AuthorizationError::permission_denied(
                        "a test key cannot validate a production authorisation",
                    ));
                }
                key.verify(&claims.signature, &message).map_err(|e| {
                    AuthorizationError::verification_failed(format!(
                        "test key rejected the signature: {e}"
                    ))
                })?;
            }
            Authority::Production(resolver) => {
                let descriptor = bounded(
                    options.network_timeout,
                    "trust resolution",
                    resolver.resolve_trusted(&claims.identity_url),
                )
                .await
                .map_err(|e| normalise(e, "trust resolution"))?;

                if !descriptor.can_identify_users() {
                    return Err(AuthorizationError::untrusted_service(format!(
                        "service at '{}' cannot act as an identity provider",
                        claims.identity_url
                    )));
                }

                if descriptor.uid() != &claims.identity_uid {
                    warn!(
                        recorded = %claims.identity_uid,
                        resolved = %descriptor.uid(),
                        "identity service UID mismatch"
                    );
                    return Err(AuthorizationError::identity_mismatch(format!(
                        "service at '{}' has UID '{}' but the authorisation was signed by '{}'",
                        claims.identity_url,
                        descriptor.uid(),
                        claims.identity_uid
                    )));
                }

                let response = bounded(
                    options.network_timeout,
                    "session lookup",
                    descriptor.whois(&claims.user_uid, &claims.session_uid),
                )
                .await
                .map_err(|e| normalise(e, "session lookup"))?;

                // A logout strictly before signing belongs to an earlier
                // session lifetime; a logout at or after signing means the
                // authorisation was minted and then invalidated.
                if let Some(logout) = response.logout_datetime {
                    if logout >= claims.signed_at {
                        warn!(
                            logout = %logout,
                            signed_at = %claims.signed_at,
                            "session was logged out at or after signing"
                        );
                        return Err(AuthorizationError::session_revoked(format!(
                            "session '{}' logged out at {logout}, authorisation signed at {}",
                            claims.session_uid, claims.signed_at
                        )));
                    }
                }

                let key = bounded(
                    options.network_timeout,
                    "public key fetch",
                    descriptor.public_key(),
                )
                .await
                .map_err(|e| normalise(e, "public key fetch"))?;

                key.verify(&claims.signature, &message).map_err(|e| {
                    AuthorizationError::verification_failed(format!(
                        "signature rejected by the key published at '{}': {e}",
                        claims.identity_url
                    ))
                })?;
            }
        }

        // Only reached with every check passed and every await complete;
        // a cancelled call never leaves a partial cache behind.
        self.cache = Some(VerificationCache {
            verified_at: now,
            resource: resource.map(str::to_string),
            context,
        });
        debug!(
            user_uid = %claims.user_uid,
            resource = resource.unwrap_or("<none>"),
            "authorisation verified"
        );
        Ok(())
    }
}
