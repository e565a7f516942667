// src/clean/period.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// `%y` has to come before `%Y`, otherwise "1/2/24" parses as year 24.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y%m%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Parse a period label as a calendar date (or date-time).
/// Returns `None` when no known layout matches.
pub fn parse_period(label: &str) -> Option<NaiveDateTime> {
    let s = label.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    let year_first_ok = has_four_digit_year_prefix(s);
    let usable = |fmt: &&&str| year_first_ok || !fmt.starts_with("%Y");

    for fmt in DATETIME_FORMATS.iter().filter(usable) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS.iter().filter(usable) {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// chrono's `%Y` happily reads "01" as year 1, so year-first layouts are only
/// tried when the label actually starts with four digits.
fn has_four_digit_year_prefix(s: &str) -> bool {
    s.as_bytes()
        .get(..4)
        .is_some_and(|head| head.iter().all(u8::is_ascii_digit))
}

/// Order distinct period labels chronologically.
///
/// `labels` must be distinct and in first-encounter order. Labels that parse
/// come first, ascending by date; equal dates keep encounter order. Labels
/// that do not parse follow, in encounter order.
pub fn order_periods(labels: Vec<String>) -> Vec<String> {
    let mut keyed: Vec<(Option<NaiveDateTime>, usize, String)> = labels
        .into_iter()
        .enumerate()
        .map(|(seen, label)| (parse_period(&label), seen, label))
        .collect();

    keyed.sort_by(|a, b| match (&a.0, &b.0) {
        (Some(x), Some(y)) => x.cmp(y).then(a.1.cmp(&b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });

    keyed.into_iter().map(|(_, _, label)| label).collect()
}
