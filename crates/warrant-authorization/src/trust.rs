//! Trust resolution boundary.
//!
//! A verifying service never trusts the URL a token carries; it resolves
//! the URL against its own registry of trusted services. The registry is
//! injected as a [`TrustResolver`] capability so tests can substitute a
//! fake and services can back it with whatever store they maintain. How
//! trust is established in the first place is out of scope here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use warrant_core::{ServiceUid, SessionUid, UserUid};
use warrant_crypto::PublicKey;

use crate::errors::{AuthorizationError, Result};

/// Session state as reported by an identity service's `whois` endpoint.
#[derive(Debug, Clone, Default)]
pub struct WhoisResponse {
    /// When the session was logged out, if it has been.
    pub logout_datetime: Option<DateTime<Utc>>,
}

/// A trusted service as seen by the verifier.
///
/// `whois` and `public_key` are network round trips against the remote
/// service; the verification engine bounds each with its configured
/// timeout.
#[async_trait]
pub trait ServiceDescriptor: Send + Sync {
    /// Canonical UID of the service.
    fn uid(&self) -> &ServiceUid;

    /// Whether this service can act as an identity provider.
    fn can_identify_users(&self) -> bool;

    /// Query the login-session state for a user.
    async fn whois(&self, user_uid: &UserUid, session_uid: &SessionUid)
        -> Result<WhoisResponse>;

    /// The service's current published signing key for the session.
    async fn public_key(&self) -> Result<PublicKey>;
}

/// Lookup of a claimed service URL against the verifier's trust registry.
#[async_trait]
pub trait TrustResolver: Send + Sync {
    /// Resolve `url` to a trusted service descriptor.
    ///
    /// Fails with [`AuthorizationError::UntrustedService`] when the URL is
    /// not in the registry.
    async fn resolve_trusted(&self, url: &str) -> Result<Arc<dyn ServiceDescriptor>>;
}

/// In-memory trust registry keyed by canonical service URL.
///
/// Read-mostly: lookups take a shared lock and clone the descriptor handle,
/// so a concurrent registration is either fully visible or not at all —
/// a reader never observes a half-applied update.
#[derive(Default)]
pub struct TrustRegistry {
    services: RwLock<HashMap<String, Arc<dyn ServiceDescriptor>>>,
}

impl TrustRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the trusted service at `url`.
    pub fn register(&self, url: impl Into<String>, service: Arc<dyn ServiceDescriptor>) {
        self.services.write().insert(url.into(), service);
    }

    /// Remove the service at `url`, returning whether it was present.
    pub fn remove(&self, url: &str) -> bool {
        self.services.write().remove(url).is_some()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

#[async_trait]
impl TrustResolver for TrustRegistry {
    async fn resolve_trusted(&self, url: &str) -> Result<Arc<dyn ServiceDescriptor>> {
        let descriptor = self.services.read().get(url).cloned();
        descriptor.ok_or_else(|| {
            AuthorizationError::untrusted_service(format!(
                "no trusted service registered at '{url}'"
            ))
        })
    }
}
