//! Date and time-period parsing for `after:`/`before:`/`older_than:`/`newer_than:`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%m-%d-%Y",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y.%m.%d",
    "%d.%m.%Y",
];

/// Parse a date string per the reference simulator's `parse_date_enhanced`,
/// trying a fixed list of formats, then relative tokens (`today`,
/// `yesterday`, `last week`, `last month`, `last year`). Unlike the
/// original's current-time fallback, a value this crate cannot parse yields
/// `None`: per spec, date predicates treat any parse failure as the empty
/// set rather than matching everything.
pub fn parse_date(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();

    for fmt in DATE_FORMATS {
        if fmt.contains("%H") {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        } else if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "today" => Some(now),
        "yesterday" => Some(now - chrono::Duration::days(1)),
        "last week" => Some(now - chrono::Duration::days(7)),
        "last month" => Some(now - chrono::Duration::days(30)),
        "last year" => Some(now - chrono::Duration::days(365)),
        _ => None,
    }
}

/// Parse a relative time period (e.g. `7d`, `2m`, `1y`, or a bare number of
/// days) into a number of days, per `parse_time_period`.
pub fn parse_time_period_days(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if let Some(d) = lower.strip_suffix('d') {
        return d.trim().parse::<f64>().ok();
    }
    if let Some(m) = lower.strip_suffix('m') {
        return m.trim().parse::<f64>().ok().map(|n| n * 30.0);
    }
    if let Some(y) = lower.strip_suffix('y') {
        return y.trim().parse::<f64>().ok().map(|n| n * 365.0);
    }
    lower.parse::<f64>().ok()
}
