//! Federated capability authorisation for a multi-service platform.
//!
//! A client authenticated by an identity service mints a signed
//! [`Authorization`] token asserting "this user, in this login session,
//! authorises this resource". Any downstream service can then verify the
//! token without trusting the client: it resolves the claimed identity
//! service against its own trust registry, checks that the login session
//! was not logged out at or after signing, and validates the signature
//! against the identity service's published key.
//!
//! ```no_run
//! # use warrant_authorization::{Authorization, TrustRegistry, VerifyOptions};
//! # use warrant_authorization::AuthenticatedUser;
//! # async fn example(user: &dyn AuthenticatedUser, registry: &TrustRegistry)
//! #     -> Result<(), warrant_authorization::AuthorizationError> {
//! let mut token = Authorization::issue(Some("drive:abc"), user)?;
//! // ... token crosses the wire to another service ...
//! token
//!     .verify(Some("drive:abc"), registry, &VerifyOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Every verification failure is a denial; the error kind exists for
//! diagnostics, never for policy. See [`AuthorizationError`].

mod authorization;
mod errors;
mod message;
mod trust;
mod user;
mod verify;

pub use authorization::{Authorization, TokenMode};
pub use errors::{AuthorizationError, Result};
pub use message::canonical_message;
pub use trust::{ServiceDescriptor, TrustRegistry, TrustResolver, WhoisResponse};
pub use user::AuthenticatedUser;
#[doc(hidden)]
pub use verify::Authority;
pub use verify::VerifyOptions;
