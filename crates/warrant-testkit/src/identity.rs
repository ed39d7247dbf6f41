//! Scripted identity-service descriptor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use warrant_authorization::{AuthorizationError, Result, ServiceDescriptor, WhoisResponse};
use warrant_core::{ServiceUid, SessionUid, UserUid};
use warrant_crypto::PublicKey;

use crate::user::TestUser;

/// A fake identity service for wiring into a trust registry.
///
/// Scriptable per test: which key it publishes, whether it admits to being
/// an identity provider, per-session logout times, and injected faults for
/// either network call. Counters record how often each remote call was
/// made so tests can assert that a cache short-circuit really performed no
/// network work.
pub struct FakeIdentityService {
    uid: ServiceUid,
    can_identify: AtomicBool,
    published_key: Mutex<Option<PublicKey>>,
    logouts: Mutex<HashMap<(String, String), DateTime<Utc>>>,
    whois_fault: Mutex<Option<String>>,
    key_fault: Mutex<Option<String>>,
    whois_calls: AtomicUsize,
    key_fetches: AtomicUsize,
}

impl FakeIdentityService {
    /// A service with the given UID, no published key, identity provision
    /// enabled.
    pub fn new(uid: impl Into<ServiceUid>) -> Self {
        Self {
            uid: uid.into(),
            can_identify: AtomicBool::new(true),
            published_key: Mutex::new(None),
            logouts: Mutex::new(HashMap::new()),
            whois_fault: Mutex::new(None),
            key_fault: Mutex::new(None),
            whois_calls: AtomicUsize::new(0),
            key_fetches: AtomicUsize::new(0),
        }
    }

    /// A service wired for `user`: same UID as the user's identity service
    /// and publishing the user's session key.
    pub fn for_user(user: &TestUser) -> Self {
        Self::new(user.identity_uid().clone()).with_published_key(user.public_key())
    }

    /// Builder-style: set the published key.
    pub fn with_published_key(self, key: PublicKey) -> Self {
        *self.published_key.lock() = Some(key);
        self
    }

    /// Replace the published key after construction (key rotation).
    pub fn publish_key(&self, key: PublicKey) {
        *self.published_key.lock() = Some(key);
    }

    /// Toggle whether the service admits to being an identity provider.
    pub fn set_can_identify(&self, value: bool) {
        self.can_identify.store(value, Ordering::SeqCst);
    }

    /// Record a logout time for a user/session pair.
    pub fn record_logout(&self, user_uid: &str, session_uid: &str, at: DateTime<Utc>) {
        self.logouts
            .lock()
            .insert((user_uid.to_string(), session_uid.to_string()), at);
    }

    /// Make every subsequent `whois` call fail with `message`.
    pub fn fail_whois(&self, message: &str) {
        *self.whois_fault.lock() = Some(message.to_string());
    }

    /// Make every subsequent key fetch fail with `message`.
    pub fn fail_key_fetch(&self, message: &str) {
        *self.key_fault.lock() = Some(message.to_string());
    }

    /// How many `whois` calls this service has served.
    pub fn whois_calls(&self) -> usize {
        self.whois_calls.load(Ordering::SeqCst)
    }

    /// How many public-key fetches this service has served.
    pub fn key_fetches(&self) -> usize {
        self.key_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceDescriptor for FakeIdentityService {
    fn uid(&self) -> &ServiceUid {
        &self.uid
    }

    fn can_identify_users(&self) -> bool {
        self.can_identify.load(Ordering::SeqCst)
    }

    async fn whois(
        &self,
        user_uid: &UserUid,
        session_uid: &SessionUid,
    ) -> Result<WhoisResponse> {
        self.whois_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.whois_fault.lock().clone() {
            return Err(AuthorizationError::verification_failed(format!(
                "whois failed: {message}"
            )));
        }
        let logout_datetime = self
            .logouts
            .lock()
            .get(&(user_uid.as_str().to_string(), session_uid.as_str().to_string()))
            .copied();
        Ok(WhoisResponse { logout_datetime })
    }

    async fn public_key(&self) -> Result<PublicKey> {
        self.key_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.key_fault.lock().clone() {
            return Err(AuthorizationError::verification_failed(format!(
                "key fetch failed: {message}"
            )));
        }
        let key = *self.published_key.lock();
        key.ok_or_else(|| AuthorizationError::verification_failed("no public key published"))
    }
}
