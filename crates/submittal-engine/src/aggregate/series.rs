use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use submittal_model::{CanonicalDate, DateValue, MergedRecord};

/// Which date a record is bucketed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateBasis {
    /// Planned submission date (including imputed ones).
    Planned,
    #[default]
    PlannedOrActual,
    /// Actual date-in.
    Actual,
    ActualOrPlanned,
    /// Original review due date.
    ReviewDue,
    ReviewCompleted,
}

impl DateBasis {
    pub fn date_of(self, record: &MergedRecord) -> DateValue {
        match self {
            DateBasis::Planned => record.planned_submission_date,
            DateBasis::PlannedOrActual => record.planned_submission_date.or(record.date_in),
            DateBasis::Actual => record.date_in,
            DateBasis::ActualOrPlanned => record.date_in.or(record.planned_submission_date),
            DateBasis::ReviewDue => record.original_due_date,
            DateBasis::ReviewCompleted => record.date_completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: CanonicalDate,
    pub count: usize,
    /// Sum of `count` over this and every earlier point.
    pub cumulative: usize,
}

/// Per-date counts in ascending date order with a running total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateSeries {
    points: Vec<SeriesPoint>,
}

impl AggregateSeries {
    /// Build from per-date counts; the map's order fixes the series order.
    pub fn from_counts(counts: &BTreeMap<CanonicalDate, usize>) -> Self {
        let mut cumulative = 0;
        let points = counts
            .iter()
            .map(|(&date, &count)| {
                cumulative += count;
                SeriesPoint {
                    date,
                    count,
                    cumulative,
                }
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dated_total(&self) -> usize {
        self.points.last().map_or(0, |p| p.cumulative)
    }

    pub fn count_on(&self, date: CanonicalDate) -> usize {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .map_or(0, |idx| self.points[idx].count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCounts {
    pub series: AggregateSeries,
    /// Records whose bucket date is unknown.
    pub empty: usize,
}

impl DateCounts {
    pub fn total(&self) -> usize {
        self.series.dated_total() + self.empty
    }

    pub fn count_on(&self, date: CanonicalDate) -> usize {
        self.series.count_on(date)
    }
}

fn bucket<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    basis: DateBasis,
) -> (BTreeMap<CanonicalDate, usize>, usize) {
    let mut counts = BTreeMap::new();
    let mut empty = 0;
    for record in records {
        match basis.date_of(record) {
            DateValue::Date(date) => *counts.entry(date).or_default() += 1,
            DateValue::Unknown => empty += 1,
        }
    }
    (counts, empty)
}

pub fn date_counts<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    basis: DateBasis,
) -> DateCounts {
    let (counts, empty) = bucket(records, basis);
    DateCounts {
        series: AggregateSeries::from_counts(&counts),
        empty,
    }
}

/// One date of a planned-versus-actual chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: CanonicalDate,
    pub planned: usize,
    pub actual: usize,
    pub cumulative_planned: usize,
    pub cumulative_actual: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSeries {
    pub points: Vec<ProgressPoint>,
    pub planned_empty: usize,
    pub actual_empty: usize,
}

/// Planned and actual counts aligned over the union of their dates.
pub fn progress(records: &[&MergedRecord], planned: DateBasis, actual: DateBasis) -> ProgressSeries {
    let (planned_counts, planned_empty) = bucket(records.iter().copied(), planned);
    let (actual_counts, actual_empty) = bucket(records.iter().copied(), actual);

    let mut dates: Vec<CanonicalDate> = planned_counts
        .keys()
        .chain(actual_counts.keys())
        .copied()
        .collect();
    dates.sort_unstable();
    dates.dedup();

    let mut cumulative_planned = 0;
    let mut cumulative_actual = 0;
    let points = dates
        .into_iter()
        .map(|date| {
            let planned = planned_counts.get(&date).copied().unwrap_or(0);
            let actual = actual_counts.get(&date).copied().unwrap_or(0);
            cumulative_planned += planned;
            cumulative_actual += actual;
            ProgressPoint {
                date,
                planned,
                actual,
                cumulative_planned,
                cumulative_actual,
            }
        })
        .collect();

    ProgressSeries {
        points,
        planned_empty,
        actual_empty,
    }
}
