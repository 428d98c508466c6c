//! Calendar-day arithmetic in the user's timezone
//!
//! Every date difference the engine computes goes through this module: both
//! endpoints are first reduced to the calendar day they fall on in the user's
//! IANA zone, and only then diffed in whole days. Raw instants are never
//! diffed directly.

use crate::error::EngineError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

/// Zone used when the user has none configured or it does not parse
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Parse an IANA zone identifier
pub fn parse_timezone(name: &str) -> Result<Tz, EngineError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(name.to_string()))
}

/// Resolve the user's zone, falling back instead of failing.
///
/// A missing or malformed `requested` zone falls back to `fallback`; a bad
/// fallback falls back to [`DEFAULT_TIMEZONE`].
pub fn resolve_timezone(requested: Option<&str>, fallback: &str) -> Tz {
    if let Some(name) = requested.filter(|n| !n.trim().is_empty()) {
        match parse_timezone(name) {
            Ok(tz) => return tz,
            Err(_) => {
                tracing::warn!(timezone = name, fallback, "unknown timezone, using fallback");
            }
        }
    }

    parse_timezone(fallback).unwrap_or_else(|_| {
        tracing::warn!(fallback, default = DEFAULT_TIMEZONE, "unknown fallback timezone");
        chrono_tz::America::New_York
    })
}

/// Calendar day an instant falls on in `tz`
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Whole calendar days from `earlier` to `later` (negative if reversed)
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Parse a calendar date given either as `YYYY-MM-DD` or as an RFC 3339
/// UTC-midnight marker (`2025-01-10T00:00:00Z`).
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, EngineError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|e| EngineError::DateParseError(format!("{trimmed}: {e}")))
}

/// Parse an RFC 3339 instant
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, EngineError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EngineError::DateParseError(format!("{raw}: {e}")))
}

/// Serde adapter for [`parse_calendar_date`]
pub(crate) fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_timezone_fallbacks() {
        assert_eq!(
            resolve_timezone(Some("Europe/Berlin"), DEFAULT_TIMEZONE),
            chrono_tz::Europe::Berlin
        );
        assert_eq!(
            resolve_timezone(Some("Mars/Olympus"), DEFAULT_TIMEZONE),
            chrono_tz::America::New_York
        );
        assert_eq!(
            resolve_timezone(None, "Asia/Tokyo"),
            chrono_tz::Asia::Tokyo
        );
        assert_eq!(resolve_timezone(Some("  "), "nope"), chrono_tz::America::New_York);
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 23:30 UTC on Jan 15 is already Jan 16 in Tokyo (UTC+9)
        let instant = Utc.with_ymd_and_hms(2025, 1, 15, 23, 30, 0).unwrap();
        assert_eq!(
            local_date(instant, chrono_tz::Asia::Tokyo),
            NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()
        );
        assert_eq!(
            local_date(instant, chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
        // ...and still Jan 15 in New York
        assert_eq!(
            local_date(instant, chrono_tz::America::New_York),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_same_local_day_is_zero_days_apart() {
        let tz = chrono_tz::America::New_York;
        // 11pm and 1am the next morning in UTC are the same local evening
        let late = Utc.with_ymd_and_hms(2025, 3, 1, 1, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2025, 2, 28, 23, 0, 0).unwrap();
        assert_eq!(days_between(local_date(early, tz), local_date(late, tz)), 0);
    }

    #[test]
    fn test_days_between_across_dst() {
        let tz = chrono_tz::America::New_York;
        // Spring-forward day is 23 hours long but still one calendar day
        let before = Utc.with_ymd_and_hms(2025, 3, 9, 4, 30, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 3, 10, 3, 30, 0).unwrap();
        assert_eq!(days_between(local_date(before, tz), local_date(after, tz)), 1);
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(parse_calendar_date("2025-01-10").unwrap(), expected);
        assert_eq!(parse_calendar_date("2025-01-10T00:00:00Z").unwrap(), expected);
        assert_eq!(
            parse_calendar_date("2025-01-10T00:00:00.000+00:00").unwrap(),
            expected
        );
        assert!(parse_calendar_date("10/01/2025").is_err());
    }

    #[test]
    fn test_parse_instant() {
        let instant = parse_instant("2025-01-15T23:30:00Z").unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 1, 15, 23, 30, 0).unwrap());
        assert!(parse_instant("yesterday").is_err());
    }
}
