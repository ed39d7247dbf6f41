//! Shared vocabulary for the Warrant authorisation protocol.
//!
//! This crate holds the small pieces every other Warrant crate agrees on:
//! opaque identifier newtypes for users, sessions and services, and the
//! canonical textual encoding of UTC timestamps. Both are deliberately
//! structure-free: an identifier is whatever string the issuing service
//! minted, and a timestamp is canonical only so that the signer and the
//! verifier reconstruct byte-identical messages.

pub mod identifiers;
pub mod time;

pub use identifiers::{ServiceUid, SessionUid, UserUid};
pub use time::{canonical_format, now_truncated, parse_canonical, TimeError};
