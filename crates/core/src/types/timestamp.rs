//! Serde adapter for server timestamps.
//!
//! The remote API emits either RFC 3339 strings or offset-less ISO-8601
//! local date-times (`2025-03-04T10:15:30.123`). Offset-less values are read
//! as UTC. Values are always written back as RFC 3339.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a server timestamp.
///
/// # Errors
///
/// Returns the chrono parse error when the value matches neither format.
pub fn parse(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(value, LOCAL_FORMAT).map(|dt| dt.and_utc()))
}

/// Serialize as RFC 3339 with a `Z` suffix.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Deserialize from either accepted format.
///
/// # Errors
///
/// Returns a custom error naming the rejected value.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}
