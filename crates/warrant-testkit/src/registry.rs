//! Pre-wired trust registry for tests.

use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;
use warrant_authorization::{
    AuthenticatedUser, Result, ServiceDescriptor, TrustRegistry, TrustResolver,
};

use crate::identity::FakeIdentityService;
use crate::user::TestUser;

/// A [`TrustRegistry`] bundled with constructors for the common test
/// shapes, so a test does not have to wire URL, descriptor, and registry
/// by hand. Derefs to the inner registry for `register`/`remove`/`len`.
#[derive(Default)]
pub struct FakeTrustRegistry {
    inner: TrustRegistry,
}

impl FakeTrustRegistry {
    /// An empty registry: every lookup is untrusted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry trusting each service at the paired URL.
    pub fn trusting<I, U>(services: I) -> Self
    where
        I: IntoIterator<Item = (U, Arc<FakeIdentityService>)>,
        U: Into<String>,
    {
        let registry = Self::new();
        for (url, service) in services {
            registry.inner.register(url, service);
        }
        registry
    }

    /// A registry plus the service it trusts, both wired for `user`: the
    /// service publishes the user's session key and is registered at the
    /// user's identity-service URL.
    pub fn for_user(user: &TestUser) -> (Self, Arc<FakeIdentityService>) {
        let service = Arc::new(FakeIdentityService::for_user(user));
        let registry = Self::trusting([(user.identity_service_url(), service.clone())]);
        (registry, service)
    }
}

impl Deref for FakeTrustRegistry {
    type Target = TrustRegistry;

    fn deref(&self) -> &TrustRegistry {
        &self.inner
    }
}

#[async_trait]
impl TrustResolver for FakeTrustRegistry {
    async fn resolve_trusted(&self, url: &str) -> Result<Arc<dyn ServiceDescriptor>> {
        self.inner.resolve_trusted(url).await
    }
}
