// Utility helpers for parsing and basic arithmetic.
//
// This module centralizes the "dirty" CSV/number/datetime handling so the
// rest of the code can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_format::{Locale, ToFormattedString};

// Field exports are day-first; ISO variants show up when the extraction is
// re-run through a spreadsheet.
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

/// Parse a timestamp string, trying each known format in order.
///
/// A bare date is accepted as midnight of that day. Returns `None` for
/// anything that cannot be safely parsed; callers decide whether that is
/// "absent" or "unparseable".
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    None
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // Some exports repeat the full timestamp in the reference-date column.
    parse_datetime(s).map(|dt| dt.date())
}

/// Parse a duration cell into fractional minutes.
///
/// - Accepts a comma decimal separator (`"12,5"`).
/// - Rejects values containing alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_minutes(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    s.replace(',', ".").parse::<f64>().ok()
}

/// Whole minutes between two timestamps, truncated toward zero.
///
/// May be negative; callers decide how to treat clock-ordering violations.
pub fn diff_minutes(later: NaiveDateTime, earlier: NaiveDateTime) -> i64 {
    (later - earlier).num_minutes()
}

/// Truncate fractional minutes to whole minutes, matching `diff_minutes`.
pub fn trunc_minutes(v: f64) -> i64 {
    v.trunc() as i64
}

/// Arithmetic mean; `None` for an empty slice so "no data" stays
/// distinguishable from a zero average.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    Some(v.iter().copied().sum::<f64>() / v.len() as f64)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Render an optional metric with two decimals, empty string when absent.
pub fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_default()
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`). Metric values never go through this.
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    #[test]
    fn parses_dayfirst_timestamps() {
        let parsed = dt("05/03/2024 08:30");
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(
            dt("05/03/2024 08:30:15"),
            dt("05/03/2024 08:30") + chrono::Duration::seconds(15)
        );
    }

    #[test]
    fn parses_iso_and_bare_dates() {
        assert_eq!(dt("2024-03-05 08:30"), dt("05/03/2024 08:30"));
        assert_eq!(dt("05/03/2024").time(), NaiveTime::MIN);
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert_eq!(parse_datetime("not a date"), None);
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("32/13/2024 99:99"), None);
    }

    #[test]
    fn parses_comma_decimal_minutes() {
        assert_eq!(parse_minutes("12,5"), Some(12.5));
        assert_eq!(parse_minutes(" 20 "), Some(20.0));
        assert_eq!(parse_minutes("abc"), None);
        assert_eq!(parse_minutes(""), None);
    }

    #[test]
    fn diff_minutes_truncates_partial_minutes() {
        let a = dt("05/03/2024 08:00:00");
        let b = dt("05/03/2024 08:02:59");
        assert_eq!(diff_minutes(b, a), 2);
        assert_eq!(diff_minutes(a, b), -2);
        assert_eq!(trunc_minutes(12.9), 12);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[40.0, 60.0]), Some(50.0));
    }

    #[test]
    fn formats_optionals() {
        assert_eq!(fmt_opt(Some(15.0)), "15.00");
        assert_eq!(fmt_opt(None), "");
    }
}
