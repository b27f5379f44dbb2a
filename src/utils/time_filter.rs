use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::ValidationError;

static RELATIVE_TIME_REGEX: OnceLock<Regex> = OnceLock::new();

fn relative_time_regex() -> &'static Regex {
    RELATIVE_TIME_REGEX.get_or_init(|| {
        Regex::new(r"^(\d{1,6})(mo|w|d|h|m)$").expect("Failed to compile relative time regex")
    })
}

/// Parse a `since`-style filter into an absolute UTC timestamp.
///
/// Accepts relative offsets from now (`"30m"`, `"4h"`, `"3d"`, `"2w"`, `"1mo"`,
/// a month being 30 days), RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS` (UTC)
/// and calendar dates (`YYYY-MM-DD`, midnight UTC).
pub fn parse_time_filter(input: &str) -> Result<DateTime<Utc>, ValidationError> {
    parse_time_filter_at(input, Utc::now())
}

pub(crate) fn parse_time_filter_at(
    input: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ValidationError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty {
            field: "since".to_string(),
        });
    }

    if let Some(caps) = relative_time_regex().captures(value) {
        // At most six digits, so this fits comfortably
        let amount: i64 = caps[1].parse().unwrap_or_default();
        let offset = match &caps[2] {
            "mo" => Duration::days(amount * 30),
            "w" => Duration::weeks(amount),
            "d" => Duration::days(amount),
            "h" => Duration::hours(amount),
            _ => Duration::minutes(amount),
        };
        return Ok(now - offset);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    Err(ValidationError::Invalid {
        field: "since".to_string(),
        message: format!(
            "unrecognized time '{}', expected e.g. 2w, 3d, 2025-01-15 or an RFC 3339 timestamp",
            value
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    /// # Relative Offsets
    ///
    /// Tests parsing of relative offsets against a fixed clock.
    ///
    /// ## Test Scenario
    /// - Parses minute, hour, day, week and month offsets
    ///
    /// ## Expected Outcome
    /// - Each offset is subtracted from the reference time
    #[test]
    fn test_relative_offsets() {
        let now = fixed_now();
        assert_eq!(parse_time_filter_at("30m", now).unwrap(), now - Duration::minutes(30));
        assert_eq!(parse_time_filter_at("4h", now).unwrap(), now - Duration::hours(4));
        assert_eq!(parse_time_filter_at("3d", now).unwrap(), now - Duration::days(3));
        assert_eq!(parse_time_filter_at("2w", now).unwrap(), now - Duration::weeks(2));
        assert_eq!(parse_time_filter_at("1mo", now).unwrap(), now - Duration::days(30));
        assert_eq!(parse_time_filter_at("0d", now).unwrap(), now);
    }

    /// # Absolute Dates
    ///
    /// Tests parsing of absolute timestamps and calendar dates.
    ///
    /// ## Test Scenario
    /// - Parses a date, a space-separated datetime, and RFC 3339 with offset
    ///
    /// ## Expected Outcome
    /// - All are converted to UTC
    #[test]
    fn test_absolute_dates() {
        let now = fixed_now();
        assert_eq!(
            parse_time_filter_at("2025-01-15", now).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time_filter_at("2025-01-15 08:30:00", now).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_filter_at("2025-01-15T10:00:00+02:00", now).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time_filter_at("2024-02-29", now).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rejected_input_message() {
        let err = parse_time_filter_at("yesterday", fixed_now()).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { ref field, .. } if field == "since"));
        assert!(err.to_string().starts_with("Invalid since: unrecognized time 'yesterday'"));
    }

    #[test]
    fn test_rejected_inputs() {
        let now = fixed_now();
        for bad in ["", "   ", "yesterday", "5y", "2w3d", "2023-02-29", "2025-13-01", "-1d"] {
            assert!(
                parse_time_filter_at(bad, now).is_err(),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let now = fixed_now();
        assert_eq!(parse_time_filter_at("  2d  ", now).unwrap(), now - Duration::days(2));
    }
}
