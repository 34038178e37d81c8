//! Flexible date/time parsing.
//!
//! Tries RFC 3339 first, then a list of common date-time, date-only and
//! time-only layouts. Ambiguous numeric dates are read month-first.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::table::Temporal;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y", "%d %b %Y",
    "%b %d, %Y", "%d %B %Y", "%B %d, %Y",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M %p",
    "%I:%M:%S %p",
];

/// Parses a single cell. Returns `None` for anything no layout accepts.
pub fn parse_temporal(raw: &str) -> Option<Temporal> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(Temporal::DateTime(dt.naive_local()));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Temporal::DateTime(dt));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(Temporal::Date(d));
        }
    }

    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(value, fmt) {
            return Some(Temporal::Time(t));
        }
    }

    None
}

/// Parses a value that must carry both a date and a time of day.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    match parse_temporal(raw)? {
        Temporal::DateTime(dt) => Some(dt),
        _ => None,
    }
}
