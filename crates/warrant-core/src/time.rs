//! Canonical UTC timestamp encoding.
//!
//! The authorisation protocol signs over a textual timestamp, so the signer
//! and every verifier must produce byte-identical encodings of the same
//! instant. The canonical form is RFC 3339 with exactly six fractional
//! digits and a literal `Z` suffix, e.g. `2026-08-30T14:03:07.120045Z`.
//! Instants are truncated to microsecond precision before signing so that a
//! format/parse round trip is lossless.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

/// strftime pattern of the canonical timestamp form.
const CANONICAL_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Failure to parse a canonical timestamp string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid canonical timestamp '{value}': {reason}")]
pub struct TimeError {
    /// The rejected input.
    pub value: String,
    /// Parser diagnostic.
    pub reason: String,
}

/// Encode an instant in the canonical form.
///
/// Sub-microsecond precision is dropped; use [`now_truncated`] (or
/// [`truncate_to_micros`]) for any instant that will be signed, so the
/// stored value and its encoding agree exactly.
pub fn canonical_format(instant: DateTime<Utc>) -> String {
    instant.format(CANONICAL_PATTERN).to_string()
}

/// Decode a canonical timestamp string.
pub fn parse_canonical(value: &str) -> Result<DateTime<Utc>, TimeError> {
    NaiveDateTime::parse_from_str(value, CANONICAL_PATTERN)
        .map(|naive| naive.and_utc())
        .map_err(|e| TimeError {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Truncate an instant to microsecond precision.
pub fn truncate_to_micros(instant: DateTime<Utc>) -> DateTime<Utc> {
    let micros = instant.nanosecond() / 1_000;
    instant.with_nanosecond(micros * 1_000).unwrap_or(instant)
}

/// The current instant, truncated to microsecond precision.
pub fn now_truncated() -> DateTime<Utc> {
    truncate_to_micros(Utc::now())
}
