//! End-to-end protocol flows: issue on one service, carry across the
//! wire, verify on another against its own trust registry.

use assert_matches::assert_matches;
use std::sync::Arc;
use warrant_authorization::{
    AuthenticatedUser, Authorization, AuthorizationError, VerifyOptions,
};
use warrant_testkit::{
    deterministic_signing_key, fresh_service_uid, FakeIdentityService, FakeTrustRegistry,
    TestUser,
};

const IDENTITY_URL: &str = "https://identity.example";

fn federation() -> (TestUser, FakeTrustRegistry, Arc<FakeIdentityService>) {
    let user = TestUser::logged_in("alice", "sess-1", IDENTITY_URL, "svc-identity");
    let (registry, service) = FakeTrustRegistry::for_user(&user);
    (user, registry, service)
}

#[tokio::test]
async fn token_issued_here_verifies_over_there() {
    let (user, registry, service) = federation();

    // Client side: authorise a storage action and serialise the token.
    let token = Authorization::issue(Some("drive:abc"), &user).unwrap();
    let wire = serde_json::to_string(&token.to_data()).unwrap();

    // Storage service side: deserialise and verify against its registry.
    let data: serde_json::Value = serde_json::from_str(&wire).unwrap();
    let mut received = Authorization::from_data(data).unwrap();
    assert!(!received.is_verified(Some("drive:abc"), &VerifyOptions::default()));

    received
        .verify(Some("drive:abc"), &registry, &VerifyOptions::default())
        .await
        .unwrap();
    assert_eq!(service.whois_calls(), 1);
    assert_eq!(service.key_fetches(), 1);

    // A second check on the same instance rides the cache.
    received
        .verify(Some("drive:abc"), &registry, &VerifyOptions::default())
        .await
        .unwrap();
    assert_eq!(service.whois_calls(), 1);
}

#[tokio::test]
async fn the_wrong_resource_is_refused() {
    let (user, registry, _service) = federation();
    let mut token = Authorization::issue(Some("drive:abc"), &user).unwrap();

    let err = token
        .verify(Some("drive:xyz"), &registry, &VerifyOptions::forced())
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::VerificationFailed { .. });
    assert!(err.is_denial());
}

#[tokio::test]
async fn logout_after_signing_revokes_in_flight_tokens() {
    let (user, registry, service) = federation();
    let mut token = Authorization::issue(Some("job:42"), &user).unwrap();

    service.record_logout("alice", "sess-1", chrono::Utc::now());
    let err = token
        .verify(Some("job:42"), &registry, &VerifyOptions::forced())
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::SessionRevoked { .. });
}

#[tokio::test]
async fn services_outside_the_registry_are_never_trusted() {
    let evil_uid = fresh_service_uid();
    let user =
        TestUser::logged_in("mallory", "sess-9", "https://evil.example", evil_uid.as_str());
    let (_, registry, _) = federation(); // knows identity.example only
    let mut token = Authorization::issue(Some("drive:abc"), &user).unwrap();

    let err = token
        .verify(Some("drive:abc"), &registry, &VerifyOptions::forced())
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::UntrustedService { .. });
}

#[tokio::test]
async fn key_rotation_invalidates_outstanding_tokens() {
    let (user, registry, service) = federation();
    let mut token = Authorization::issue(Some("drive:abc"), &user).unwrap();

    // The identity service rotates the session key it publishes.
    service.publish_key(deterministic_signing_key(9).public_key());

    let err = token
        .verify(Some("drive:abc"), &registry, &VerifyOptions::forced())
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::VerificationFailed { .. });
}

#[tokio::test]
async fn null_tokens_cross_the_wire_but_never_verify() {
    let (_, registry, _) = federation();
    let wire = Authorization::null().to_data();
    assert_eq!(wire, serde_json::json!({}));

    let mut received = Authorization::from_data(wire).unwrap();
    assert!(received.is_null());
    let err = received
        .verify(None, &registry, &VerifyOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::InvalidState { .. });
}

#[tokio::test]
async fn independent_tokens_verify_concurrently() {
    let user_a = TestUser::logged_in("alice", "sess-1", IDENTITY_URL, "svc-identity");
    let user_b = TestUser::logged_in("bob", "sess-2", "https://other.example", "svc-other");

    let service_a = Arc::new(FakeIdentityService::for_user(&user_a));
    let service_b = Arc::new(FakeIdentityService::for_user(&user_b));
    let registry = Arc::new(FakeTrustRegistry::trusting([
        (IDENTITY_URL, service_a),
        ("https://other.example", service_b),
    ]));

    let mut token_a = Authorization::issue(Some("drive:a"), &user_a).unwrap();
    let mut token_b = Authorization::issue(Some("drive:b"), &user_b).unwrap();

    let reg_a = registry.clone();
    let reg_b = registry.clone();
    let task_a = tokio::spawn(async move {
        token_a
            .verify(Some("drive:a"), &*reg_a, &VerifyOptions::forced())
            .await
    });
    let task_b = tokio::spawn(async move {
        token_b
            .verify(Some("drive:b"), &*reg_b, &VerifyOptions::forced())
            .await
    });

    task_a.await.unwrap().unwrap();
    task_b.await.unwrap().unwrap();
}

#[tokio::test]
async fn registry_updates_are_atomic_for_readers() {
    let (user, registry, _service) = federation();
    assert_eq!(registry.len(), 1);

    // Replacing a registration is a single-writer operation; a token
    // verified before the swap re-verifies against the replacement.
    let replacement = Arc::new(FakeIdentityService::for_user(&user));
    registry.register(IDENTITY_URL, replacement.clone());
    assert_eq!(registry.len(), 1);

    let mut token = Authorization::issue(Some("r"), &user).unwrap();
    token
        .verify(Some("r"), &registry, &VerifyOptions::forced())
        .await
        .unwrap();
    assert_eq!(replacement.whois_calls(), 1);

    assert!(registry.remove(IDENTITY_URL));
    let err = token
        .verify(Some("r"), &registry, &VerifyOptions::forced())
        .await
        .unwrap_err();
    assert_matches!(err, AuthorizationError::UntrustedService { .. });
}

#[tokio::test]
async fn issuance_requires_a_live_login() {
    let user = TestUser::logged_out("carol", "sess-3", IDENTITY_URL, "svc-identity");
    let err = Authorization::issue(Some("drive:abc"), &user).unwrap_err();
    assert_matches!(err, AuthorizationError::Unauthenticated { .. });
    assert!(user.identity_service_url() == IDENTITY_URL);
}
