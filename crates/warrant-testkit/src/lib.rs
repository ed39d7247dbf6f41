//! Deterministic fakes for testing the Warrant protocol.
//!
//! Services verifying authorisations depend on two capabilities they do
//! not own: an authenticated user (issuance side) and a trust resolver
//! with remote identity services behind it (verification side). This crate
//! provides scripted stand-ins for both, with call counters and failure
//! injection so tests can assert not just outcomes but *which* network
//! work happened.

mod fixtures;
mod identity;
mod registry;
mod user;

pub use fixtures::{deterministic_signing_key, fresh_service_uid};
pub use identity::FakeIdentityService;
pub use registry::FakeTrustRegistry;
pub use user::TestUser;
