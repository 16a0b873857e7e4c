//! Best-effort parsing of the date strings found in meta tags, JSON-LD,
//! `<time>` elements, listing pages and HTTP headers.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%B %d %Y", "%d %B %Y"];

/// Parses `raw` into UTC. Values without an offset are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    // "May 2024" and "2024-05" carry no day. Checked before the day-bearing
    // formats, which would otherwise read "May 2024" as May 20 of year 24.
    if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {}", s), "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d"))
    {
        return midnight(date);
    }

    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .find_map(midnight)
}

/// Midnight UTC of `date`. Years with fewer than four digits are misparses.
fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    if date.year() < 1000 {
        return None;
    }
    date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_rfc2822_and_http_dates() {
        assert_eq!(parse_datetime("Tue, 21 May 2024 12:00:00 +0200"), Some(utc(2024, 5, 21, 10, 0, 0)));
        assert_eq!(parse_datetime("Wed, 21 Oct 2015 07:28:00 GMT"), Some(utc(2015, 10, 21, 7, 28, 0)));
    }

    #[test]
    fn test_iso8601_variants() {
        assert_eq!(parse_datetime("2025-09-10T12:34:56Z"), Some(utc(2025, 9, 10, 12, 34, 56)));
        assert_eq!(parse_datetime("2025-09-10T12:34:56+02:00"), Some(utc(2025, 9, 10, 10, 34, 56)));
        assert_eq!(parse_datetime("2025-09-10T12:34:56"), Some(utc(2025, 9, 10, 12, 34, 56)));
        assert_eq!(parse_datetime("2025-09-10 12:34"), Some(utc(2025, 9, 10, 12, 34, 0)));
    }

    #[test]
    fn test_date_only_values() {
        assert_eq!(parse_datetime("2024-05-21"), Some(utc(2024, 5, 21, 0, 0, 0)));
        assert_eq!(parse_datetime("2024/05/21"), Some(utc(2024, 5, 21, 0, 0, 0)));
        assert_eq!(parse_datetime("May 21, 2024"), Some(utc(2024, 5, 21, 0, 0, 0)));
        assert_eq!(parse_datetime("  May 2024 "), Some(utc(2024, 5, 1, 0, 0, 0)));
        assert_eq!(parse_datetime("September 2025"), Some(utc(2025, 9, 1, 0, 0, 0)));
        assert_eq!(parse_datetime("2024-05"), Some(utc(2024, 5, 1, 0, 0, 0)));
    }

    #[test]
    fn test_month_year_never_reads_as_short_year() {
        assert_eq!(parse_datetime("March 2025"), Some(utc(2025, 3, 1, 0, 0, 0)));
        assert_eq!(parse_datetime("May 20 24"), None);
        assert_eq!(parse_datetime("0024-05-20"), None);
        assert!(parse_datetime("March 2025") > parse_datetime("2021-01-01"));
    }

    #[test]
    fn test_unparseable_values() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("   "), None);
        assert_eq!(parse_datetime("yesterday"), None);
        assert_eq!(parse_datetime("2024"), None);
        assert_eq!(parse_datetime("2024-13-45"), None);
    }
}
