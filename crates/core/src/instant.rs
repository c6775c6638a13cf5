//! Normalization of stored instants into [`DateTime<Utc>`].
//!
//! Both stored representations (native timestamps and ISO-8601 strings) end
//! up as a single comparable instant. Failure is reported as an
//! [`InstantError`], which callers treat as "skip this task", never as a
//! reason to abort a pass.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

use crate::task::{RawInstant, Timestamp};

/// Why a raw instant could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantError {
    #[error("no instant present")]
    Missing,

    #[error("timestamp out of range: {seconds}s + {nanoseconds}ns")]
    OutOfRange { seconds: i64, nanoseconds: u32 },

    #[error("unparseable instant string: {0:?}")]
    BadString(String),

    #[error("unsupported instant representation: {0}")]
    Unsupported(String),
}

/// Naive date-time layouts accepted without an offset. Interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Normalize a stored instant.
pub fn normalize(raw: &RawInstant) -> Result<DateTime<Utc>, InstantError> {
    match raw {
        RawInstant::Timestamp(ts) => from_timestamp(*ts),
        RawInstant::Text(s) => parse_iso8601(s),
        RawInstant::Other(value) => Err(InstantError::Unsupported(value.to_string())),
    }
}

fn from_timestamp(ts: Timestamp) -> Result<DateTime<Utc>, InstantError> {
    Utc.timestamp_opt(ts.seconds, ts.nanoseconds)
        .single()
        .ok_or(InstantError::OutOfRange {
            seconds: ts.seconds,
            nanoseconds: ts.nanoseconds,
        })
}

/// Parse an ISO-8601 string.
///
/// Accepts RFC 3339 with an offset, a naive date-time, or a bare date
/// (midnight). Values without an offset are taken as UTC.
pub fn parse_iso8601(input: &str) -> Result<DateTime<Utc>, InstantError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(InstantError::BadString(input.to_string()))
}

/// Canonical string form: RFC 3339, millisecond precision, `Z` suffix.
pub fn canonical(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
