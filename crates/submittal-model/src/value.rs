use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A spreadsheet cell as it arrives from an export.
///
/// Blank cells are represented by the *absence* of a value (`Option<RawValue>`), never by an
/// empty `Text`. Ingestion trims text and drops blank cells before constructing a `RawValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Build a text value, returning `None` for blank/whitespace-only input.
    pub fn text(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(RawValue::Text(trimmed.to_string()))
        }
    }

    /// Build a numeric value, returning `None` for NaN/infinite input.
    pub fn number(value: f64) -> Option<Self> {
        value.is_finite().then_some(RawValue::Number(value))
    }

    /// Text rendering used for identifier-like columns (document numbers, statuses, names).
    ///
    /// Whole numbers render without a trailing `.0` so `1.0` read from a workbook compares equal
    /// to the string `"1"` read from a CSV export.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawValue::Text(s) => Cow::Borrowed(s.as_str()),
            RawValue::Number(n) => Cow::Owned(format_number(*n)),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => n.is_finite().then_some(*n),
            RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        // Normalize -0 to 0.
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Parse a "days late" cell.
///
/// Numbers are taken as-is, text is trimmed and parsed as `f64`. Anything else (including
/// non-finite values) yields `None` so callers can exclude the row from averages.
pub fn parse_days_late(value: &RawValue) -> Option<f64> {
    value.as_number()
}
