//! Date normalization.
//!
//! Exports carry dates in three shapes: spreadsheet serial numbers (as numbers or numeric text),
//! day-first `DD/MM/YYYY` text, and assorted ISO-ish strings. Everything downstream of ingestion
//! works on [`DateValue`], produced only by the functions in this module.

use std::fmt;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{DateSystem, RawValue};

/// Dates in or before this year are "no date" placeholders in the source exports.
pub const SENTINEL_MAX_YEAR: i32 = 1970;

/// Serials further than this from the epoch (roughly 8000 years) are treated as garbage.
const MAX_SERIAL_DAYS: f64 = 2_958_465.0;

/// A calendar date (day granularity) produced by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(CanonicalDate)
    }

    pub fn naive(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    /// Whether this date is a "no date" marker (year <= 1970).
    pub fn is_sentinel(self) -> bool {
        self.year() <= SENTINEL_MAX_YEAR
    }

    /// The first day of this date's month.
    pub fn month_start(self) -> Self {
        CanonicalDate(self.0.with_day(1).unwrap_or(self.0))
    }

    /// Shift by a signed number of days; `None` when the result leaves the calendar range.
    pub fn add_days(self, days: i64) -> Option<Self> {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.map(CanonicalDate)
    }

    /// The next calendar day.
    pub fn succ(self) -> Option<Self> {
        self.0.succ_opt().map(CanonicalDate)
    }
}

impl From<NaiveDate> for CanonicalDate {
    fn from(value: NaiveDate) -> Self {
        CanonicalDate(value)
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Result of normalizing a raw date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DateValue {
    Date(CanonicalDate),
    #[default]
    Unknown,
}

impl DateValue {
    pub fn as_date(self) -> Option<CanonicalDate> {
        match self {
            DateValue::Date(d) => Some(d),
            DateValue::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, DateValue::Date(_))
    }

    /// `self` when known, otherwise `fallback`.
    pub fn or(self, fallback: DateValue) -> DateValue {
        match self {
            DateValue::Date(_) => self,
            DateValue::Unknown => fallback,
        }
    }
}

impl From<CanonicalDate> for DateValue {
    fn from(value: CanonicalDate) -> Self {
        DateValue::Date(value)
    }
}

impl From<Option<CanonicalDate>> for DateValue {
    fn from(value: Option<CanonicalDate>) -> Self {
        value.map_or(DateValue::Unknown, DateValue::Date)
    }
}

/// Normalize an optional raw cell. Absent cells are `Unknown`.
pub fn normalize_date(input: Option<&RawValue>, system: DateSystem) -> DateValue {
    match input {
        None => DateValue::Unknown,
        Some(RawValue::Number(n)) => normalize_serial(*n, system),
        Some(RawValue::Text(s)) => normalize_text(s, system),
    }
}

/// Interpret a spreadsheet serial: `epoch + floor(serial)` days.
///
/// The 1900 epoch is 1899-12-30 rather than 1900-01-01 so that serials after 1900-02-28 agree
/// with spreadsheet software despite its phantom 1900-02-29.
pub fn normalize_serial(serial: f64, system: DateSystem) -> DateValue {
    if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
        return DateValue::Unknown;
    }
    let days = serial.floor() as i64;
    CanonicalDate(system.epoch()).add_days(days).into()
}

/// Normalize a text cell: numeric text is a serial, text containing `/` is `DD/MM/YYYY`, and
/// everything else goes through a generic parse.
pub fn normalize_text(text: &str, system: DateSystem) -> DateValue {
    let s = text.trim();
    if s.is_empty() {
        return DateValue::Unknown;
    }
    if let Ok(serial) = s.parse::<f64>() {
        return normalize_serial(serial, system);
    }
    if s.contains('/') {
        return parse_day_first(s).into();
    }
    parse_generic(s).into()
}

fn parse_day_first(s: &str) -> Option<CanonicalDate> {
    let parts: Vec<&str> = s.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    CanonicalDate::from_ymd(year, month, day)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%Y.%m.%d",
    "%d.%m.%Y",
];

fn parse_generic(s: &str) -> Option<CanonicalDate> {
    // Offsets are honored as written: the calendar date is the one in the stated zone.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(CanonicalDate(dt.date_naive()));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(CanonicalDate(dt.date()));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(CanonicalDate(date));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(CanonicalDate(dt.date_naive()));
    }
    None
}
