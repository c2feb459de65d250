use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use submittal_model::date::SENTINEL_MAX_YEAR;
use submittal_model::{CanonicalDate, MergedRecord};

use super::DateBasis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: CanonicalDate,
    pub count: usize,
}

/// Years that have at least one non-sentinel date, ascending.
pub fn available_years<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    basis: DateBasis,
) -> Vec<i32> {
    records
        .into_iter()
        .filter_map(|r| basis.date_of(r).as_date())
        .filter(|d| !d.is_sentinel())
        .map(CanonicalDate::year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A dense calendar for `year`: one cell per day, zero when nothing falls on it.
pub fn heatmap<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    year: i32,
    basis: DateBasis,
) -> Vec<HeatmapCell> {
    if year <= SENTINEL_MAX_YEAR {
        return Vec::new();
    }
    let (Some(first), Some(last)) = (
        CanonicalDate::from_ymd(year, 1, 1),
        CanonicalDate::from_ymd(year, 12, 31),
    ) else {
        return Vec::new();
    };

    let mut counts: HashMap<CanonicalDate, usize> = HashMap::new();
    for date in records.into_iter().filter_map(|r| basis.date_of(r).as_date()) {
        if date.year() == year {
            *counts.entry(date).or_default() += 1;
        }
    }

    let mut cells = Vec::with_capacity(366);
    let mut day = Some(first);
    while let Some(date) = day.filter(|d| *d <= last) {
        cells.push(HeatmapCell {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        });
        day = date.succ();
    }
    cells
}
