//! # Temporal Types — UTC-Only Timestamps
//!
//! `created_at` and `timestep.start` are RFC 3339 `date-time` strings. The
//! pipeline writes them in UTC with a `Z` suffix and whole seconds;
//! [`Timestamp`] produces and parses exactly that form. Migration uses it to
//! fill in a missing `created_at`.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DhcError;

/// A UTC timestamp truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string. Any offset is accepted and converted to UTC;
    /// simulation hosts are not all configured for UTC.
    pub fn parse(s: &str) -> Result<Self, DhcError> {
        let dt = DateTime::parse_from_rfc3339(s.trim()).map_err(|e| DhcError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_rfc3339(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(987_654_321).unwrap());
        assert_eq!(ts.to_rfc3339(), "2025-03-14T09:30:05Z");
    }

    #[test]
    fn parse_converts_offsets_to_utc() {
        let ts = Timestamp::parse("2025-03-14T10:30:00+01:00").unwrap();
        assert_eq!(ts.to_string(), "2025-03-14T09:30:00Z");
    }

    #[test]
    fn parse_rejects_dates_without_time() {
        assert!(Timestamp::parse("2025-03-14").is_err());
        assert!(Timestamp::parse("yesterday").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::parse("2025-03-14T09:30:00Z").unwrap();
        let b = Timestamp::parse("2025-03-14T09:30:01Z").unwrap();
        assert!(a < b);
    }
}
