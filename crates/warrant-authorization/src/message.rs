//! Canonical message builder.
//!
//! The canonical message is the exact byte string that gets signed and
//! verified: a deterministic function of the user, session, identity
//! service, optional resource, and signing timestamp. The encoding must be
//! injective — no two distinct claim tuples may produce the same bytes —
//! or field-boundary ambiguity would let an attacker reuse a signature for
//! different claims. Fields are therefore length-prefixed rather than
//! joined with a delimiter, since identifiers and resource strings are
//! opaque and may contain any byte.

use chrono::{DateTime, Utc};
use warrant_core::{canonical_format, ServiceUid, SessionUid, UserUid};

/// Build the canonical message for a set of claims.
///
/// Layout: one byte holding the field count, then for each field a
/// big-endian u64 length prefix followed by the field's UTF-8 bytes.
/// Field order: user UID, session UID, identity-service UID, the resource
/// (when present), and the canonical timestamp string. The timestamp
/// participates as its canonical textual form so signer and verifier
/// reconstruct identical bytes from the same instant.
pub fn canonical_message(
    user_uid: &UserUid,
    session_uid: &SessionUid,
    identity_uid: &ServiceUid,
    resource: Option<&str>,
    signed_at: DateTime<Utc>,
) -> Vec<u8> {
    let timestamp = canonical_format(signed_at);
    let mut fields: Vec<&str> = vec![
        user_uid.as_str(),
        session_uid.as_str(),
        identity_uid.as_str(),
    ];
    if let Some(resource) = resource {
        fields.push(resource);
    }
    fields.push(&timestamp);

    let mut message =
        Vec::with_capacity(1 + fields.iter().map(|f| 8 + f.len()).sum::<usize>());
    message.push(fields.len() as u8);
    for field in fields {
        message.extend_from_slice(&(field.len() as u64).to_be_bytes());
        message.extend_from_slice(field.as_bytes());
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let a = canonical_message(
            &"u1".into(),
            &"s1".into(),
            &"svc-1".into(),
            Some("drive:abc"),
            instant(),
        );
        let b = canonical_message(
            &"u1".into(),
            &"s1".into(),
            &"svc-1".into(),
            Some("drive:abc"),
            instant(),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn resource_presence_changes_the_message() {
        let with = canonical_message(
            &"u1".into(),
            &"s1".into(),
            &"svc-1".into(),
            Some("r"),
            instant(),
        );
        let without =
            canonical_message(&"u1".into(), &"s1".into(), &"svc-1".into(), None, instant());
        assert_ne!(with, without);
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        // A naive delimiter join would make these collide.
        let a = canonical_message(
            &"ab".into(),
            &"c".into(),
            &"svc".into(),
            None,
            instant(),
        );
        let b = canonical_message(
            &"a".into(),
            &"bc".into(),
            &"svc".into(),
            None,
            instant(),
        );
        assert_ne!(a, b);

        let c = canonical_message(
            &"u|s".into(),
            &"x".into(),
            &"svc".into(),
            None,
            instant(),
        );
        let d = canonical_message(
            &"u".into(),
            &"s|x".into(),
            &"svc".into(),
            None,
            instant(),
        );
        assert_ne!(c, d);
    }

    proptest! {
        #[test]
        fn injective_over_claim_tuples(
            user_a in ".*", session_a in ".*", identity_a in ".*",
            resource_a in proptest::option::of(".*"),
            user_b in ".*", session_b in ".*", identity_b in ".*",
            resource_b in proptest::option::of(".*"),
        ) {
            let a = canonical_message(
                &user_a.as_str().into(),
                &session_a.as_str().into(),
                &identity_a.as_str().into(),
                resource_a.as_deref(),
                instant(),
            );
            let b = canonical_message(
                &user_b.as_str().into(),
                &session_b.as_str().into(),
                &identity_b.as_str().into(),
                resource_b.as_deref(),
                instant(),
            );
            let same_inputs = user_a == user_b
                && session_a == session_b
                && identity_a == identity_b
                && resource_a == resource_b;
            prop_assert_eq!(a == b, same_inputs);
        }
    }
}
