use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::RawValue;

/// Document revision: numeric (`0`, `1`, ...) or a letter code (`A`, `B`, `P1`, ...).
///
/// Ordering: numeric revisions compare numerically, every code ranks above every numeric
/// revision, and codes compare case-insensitively (ties broken by exact text). Wrap in
/// `Option` to get "missing ranks lowest".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Revision {
    Number(u32),
    Code(String),
}

impl Revision {
    /// Parse revision text. Blank text has no revision; integer text is numeric.
    pub fn parse(text: &str) -> Option<Self> {
        let s = text.trim();
        if s.is_empty() {
            return None;
        }
        match s.parse::<u32>() {
            Ok(n) => Some(Revision::Number(n)),
            Err(_) => Some(Revision::Code(s.to_string())),
        }
    }

    pub fn from_raw(value: &RawValue) -> Option<Self> {
        match value {
            RawValue::Number(n)
                if n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64 =>
            {
                Some(Revision::Number(*n as u32))
            }
            other => Revision::parse(&other.as_text()),
        }
    }

    /// Whether this revision supersedes the original submission (`> 0`, or any letter code).
    pub fn is_nonzero(&self) -> bool {
        match self {
            Revision::Number(n) => *n > 0,
            Revision::Code(_) => true,
        }
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Revision::Number(a), Revision::Number(b)) => a.cmp(b),
            (Revision::Number(_), Revision::Code(_)) => Ordering::Less,
            (Revision::Code(_), Revision::Number(_)) => Ordering::Greater,
            (Revision::Code(a), Revision::Code(b)) => a
                .to_ascii_lowercase()
                .cmp(&b.to_ascii_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Number(n) => write!(f, "{n}"),
            Revision::Code(code) => f.write_str(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_numbers_and_codes() {
        assert_eq!(Revision::parse(" 01 "), Some(Revision::Number(1)));
        assert_eq!(Revision::parse("A"), Some(Revision::Code("A".to_string())));
        assert_eq!(Revision::parse(""), None);
        assert_eq!(Revision::from_raw(&RawValue::Number(2.0)), Some(Revision::Number(2)));
        assert_eq!(
            Revision::from_raw(&RawValue::Number(1.5)),
            Some(Revision::Code("1.5".to_string()))
        );
    }

    #[test]
    fn codes_rank_above_numbers() {
        let a = Revision::Code("A".to_string());
        assert!(a > Revision::Number(0));
        assert!(a > Revision::Number(12));
        assert!(Revision::Number(2) > Revision::Number(1));
        assert!(Revision::Code("b".to_string()) > Revision::Code("A".to_string()));
        assert!(Some(Revision::Number(0)) > None);
    }

    #[test]
    fn letter_codes_are_nonzero() {
        assert!(!Revision::Number(0).is_nonzero());
        assert!(Revision::Number(1).is_nonzero());
        assert!(Revision::Code("A".to_string()).is_nonzero());
    }
}
