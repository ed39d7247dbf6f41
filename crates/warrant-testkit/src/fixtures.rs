//! Small fixture helpers.

use uuid::Uuid;
use warrant_core::ServiceUid;
use warrant_crypto::SigningKey;

/// A unique service UID for a test, e.g. `svc-3f2a…`.
pub fn fresh_service_uid() -> ServiceUid {
    ServiceUid::new(format!("svc-{}", Uuid::new_v4()))
}

/// A signing key derived from a one-byte seed, stable across runs.
pub fn deterministic_signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_service_uids_are_unique() {
        assert_ne!(fresh_service_uid(), fresh_service_uid());
    }

    #[test]
    fn deterministic_keys_are_stable() {
        let a = deterministic_signing_key(7);
        let b = deterministic_signing_key(7);
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(
            a.public_key(),
            deterministic_signing_key(8).public_key()
        );
    }
}
