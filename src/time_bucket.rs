//! Timestamp helpers shared by the progress and loyalty databases
//!
//! Timestamps are stored as Unix milliseconds (INTEGER columns).
//! - Day buckets: "YYYY-MM-DD" (UTC) for login streaks
//! - Accrual windows: the next UTC midnight after a login

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Current time truncated to millisecond precision.
///
/// Everything written to the databases goes through millisecond columns, so
/// values handed back to callers are truncated the same way.
pub fn now() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis()).unwrap_or_else(Utc::now)
}

/// Convert a timestamp to its stored representation.
pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Convert a stored millisecond value back to a timestamp.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Compute the day bucket string for a timestamp.
///
/// Returns a string in format "YYYY-MM-DD".
pub fn day_bucket(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}-{:02}", at.year(), at.month(), at.day())
}

/// Parse a day bucket string back to a date.
pub fn parse_day_bucket(bucket: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(bucket, "%Y-%m-%d").ok()
}

/// The first instant of the UTC day after `at`.
pub fn next_midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = at.date_naive() + Duration::days(1);
    tomorrow
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(at + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bucket() {
        // 2023-12-28 12:34:56 UTC
        let at = from_millis(1703766896000).unwrap();
        assert_eq!(day_bucket(at), "2023-12-28");
    }

    #[test]
    fn test_parse_day_bucket() {
        let date = parse_day_bucket("2024-02-29").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(parse_day_bucket("2024-02-30").is_none());
        assert!(parse_day_bucket("yesterday").is_none());
    }

    #[test]
    fn test_next_midnight() {
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let midnight = next_midnight(at);
        assert_eq!(midnight, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        // Exactly midnight still moves to the following day
        assert_eq!(
            next_midnight(midnight),
            Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_now_is_millisecond_precise() {
        let at = now();
        assert_eq!(from_millis(to_millis(at)), Some(at));
    }
}
