//! Opaque identifier newtypes.
//!
//! Identifiers are minted by the services that own them and carry no
//! structure the protocol is allowed to rely on. The newtypes exist so a
//! user UID can never be passed where a service UID is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! uid_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an opaque identifier string.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

uid_type! {
    /// UID of an authenticated user.
    UserUid
}

uid_type! {
    /// UID of a single login session of a user.
    SessionUid
}

uid_type! {
    /// UID of a service in the federation (identity, storage, compute, ...).
    ServiceUid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip_through_serde() {
        let uid = UserUid::new("user-1234");
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "\"user-1234\"");
        let back: UserUid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uid);
    }

    #[test]
    fn identifiers_display_their_contents() {
        assert_eq!(ServiceUid::from("svc-1").to_string(), "svc-1");
        assert_eq!(SessionUid::from("sess-9").as_str(), "sess-9");
    }
}
