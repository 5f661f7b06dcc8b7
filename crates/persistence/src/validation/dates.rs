//! Date normalisation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses a user-supplied date into a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, RFC 3339 timestamps (the date is taken
/// in the timestamp's own offset) and naive `YYYY-MM-DDTHH:MM:SS` timestamps.
pub fn normalize_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|ts| ts.date_naive()))
        .or_else(|| value.parse::<NaiveDateTime>().ok().map(|ts| ts.date()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_accepted_formats() {
        assert_eq!(normalize_date("2024-03-01"), ymd(2024, 3, 1));
        assert_eq!(normalize_date(" 2024/03/01 "), ymd(2024, 3, 1));
        assert_eq!(normalize_date("2024-03-01T23:30:00+02:00"), ymd(2024, 3, 1));
        assert_eq!(normalize_date("2024-03-01T08:15:00"), ymd(2024, 3, 1));
    }

    #[test]
    fn test_rejected_values() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("01-03-2024"), None);
        assert_eq!(normalize_date("2024-02-30"), None);
        assert_eq!(normalize_date("tomorrow"), None);
    }
}
