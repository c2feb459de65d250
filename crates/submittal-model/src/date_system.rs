use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date system used to interpret spreadsheet serial date values.
///
/// Exports come from two families of spreadsheet software:
/// - `Excel1900` (default; day 0 is 1899-12-30, which absorbs the Lotus 1-2-3 leap year bug for
///   every serial after February 1900)
/// - `Excel1904` (older Mac workbooks; day 0 is 1904-01-01)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateSystem {
    #[default]
    #[serde(rename = "excel1900")]
    Excel1900,
    #[serde(rename = "excel1904")]
    Excel1904,
}

impl DateSystem {
    /// The calendar date that serial `0` maps to.
    pub fn epoch(self) -> NaiveDate {
        let (y, m, d) = match self {
            DateSystem::Excel1900 => (1899, 12, 30),
            DateSystem::Excel1904 => (1904, 1, 1),
        };
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
    }
}
