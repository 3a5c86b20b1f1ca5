//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp type enforcing ISO8601 with Z
//! suffix, truncated to seconds precision.
//!
//! ## Security Invariant
//!
//! Timestamps appear inside canonicalized structures (compliance records,
//! public outputs, ledger snapshots). Local timezone offsets would produce
//! different canonical byte sequences for the same instant, breaking
//! content-addressed integrity — so non-UTC inputs are rejected at
//! construction on the strict path. Document date fields arrive as bare
//! `YYYY-MM-DD` strings and are handled by [`Timestamp::parse_date()`],
//! which pins them to UTC midnight.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProvaraError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`] — from an ISO8601 string, rejecting non-UTC offsets.
/// - [`Timestamp::parse_lenient()`] — converts any RFC 3339 offset to UTC.
/// - [`Timestamp::parse_date()`] — from `YYYY-MM-DD`, pinned to UTC midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 / ISO8601 string.
    ///
    /// **Rejects non-UTC inputs.** Only the `Z` suffix is accepted —
    /// even `+00:00`, which is semantically equivalent, is refused so the
    /// canonical byte representation of an instant is unique.
    pub fn parse(s: &str) -> Result<Self, ProvaraError> {
        if !s.ends_with('Z') {
            return Err(ProvaraError::Validation(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            ProvaraError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    ///
    /// Lenient path for ingesting external document data. For digest
    /// computation paths, prefer [`Timestamp::parse()`].
    pub fn parse_lenient(s: &str) -> Result<Self, ProvaraError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            ProvaraError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Parse a bare `YYYY-MM-DD` date, pinned to UTC midnight.
    ///
    /// Document date fields (license issue/expiry, reporting periods)
    /// usually carry no time component; temporal-window predicates compare
    /// them against full timestamps, so midnight UTC is the canonical
    /// anchoring.
    pub fn parse_date(s: &str) -> Result<Self, ProvaraError> {
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| ProvaraError::Validation(format!("invalid date {s:?}: {e}")))?;
        let dt = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ProvaraError::Validation(format!("invalid date {s:?}")))?;
        Ok(Self(DateTime::from_naive_utc_and_offset(dt, Utc)))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ProvaraError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| ProvaraError::Validation(format!("invalid Unix timestamp: {secs}")))?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
