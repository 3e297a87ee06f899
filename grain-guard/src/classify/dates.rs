//! Lenient day-first calendar date parsing.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// `%Y` also accepts one or two digits; a year below this came from a
/// two-digit field and is left to the `%y` layouts.
const MIN_FULL_YEAR: i32 = 1000;

/// Year-first layouts are unambiguous and tried first.
const YEAR_FIRST: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const DAY_FIRST: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d/%m/%y", "%d-%m-%y", "%d.%m.%y",
];

/// Only reached when the day-first reading is impossible, e.g. `12/25/2024`.
const MONTH_FIRST: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y"];

const NAMED_MONTH: &[&str] = &[
    "%d %b %Y", "%d %B %Y", "%b %d %Y", "%B %d %Y", "%b %d, %Y", "%B %d, %Y", "%d-%b-%Y",
];

const DATE_TIME: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses `value` as a calendar date, resolving `dd/mm` ambiguity day first.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() || !value.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    YEAR_FIRST
        .iter()
        .chain(DAY_FIRST)
        .chain(MONTH_FIRST)
        .chain(NAMED_MONTH)
        .find_map(|format| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .filter(|date| date.year() >= MIN_FULL_YEAR)
        })
        .or_else(|| {
            DATE_TIME.iter().find_map(|format| {
                NaiveDateTime::parse_from_str(value, format)
                    .ok()
                    .map(|dt| dt.date())
                    .filter(|date| date.year() >= MIN_FULL_YEAR)
            })
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
