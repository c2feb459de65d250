use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use submittal_model::{parse_days_late, CanonicalDate, MergedRecord};

use super::ratio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Granularity {
    Day,
    #[default]
    Month,
}

impl Granularity {
    fn key(self, date: CanonicalDate) -> CanonicalDate {
        match self {
            Granularity::Day => date,
            Granularity::Month => date.month_start(),
        }
    }
}

/// Which days-late column is averaged and which dates bucket it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LatenessSource {
    /// Document-side days late, bucketed by date-in (falling back to planned).
    #[default]
    Submission,
    /// Workflow-side days late, bucketed by completion (falling back to the original due date).
    Review,
}

impl LatenessSource {
    fn sample(self, record: &MergedRecord) -> (Option<f64>, Option<CanonicalDate>) {
        let (value, date) = match self {
            LatenessSource::Submission => (
                record.days_late.as_ref(),
                record.date_in.or(record.planned_submission_date),
            ),
            LatenessSource::Review => (
                record.review_days_late.as_ref(),
                record.date_completed.or(record.original_due_date),
            ),
        };
        (value.and_then(parse_days_late), date.as_date())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatenessPeriod {
    /// Day, or first of the month for monthly buckets.
    pub period: CanonicalDate,
    pub count: usize,
    pub total_days_late: f64,
    pub average_days_late: f64,
    pub cumulative_count: usize,
    pub cumulative_days_late: f64,
    /// Cumulative total over cumulative count, weighting each period by its record count.
    pub cumulative_average: f64,
}

/// Spread of the per-period averages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatenessSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatenessReport {
    pub periods: Vec<LatenessPeriod>,
    pub summary: LatenessSummary,
    pub total_records: usize,
    /// Records without a numeric days-late value.
    pub non_numeric: usize,
    /// Records with a numeric value but no usable date.
    pub undated: usize,
    /// Records whose value would have made a running total non-finite.
    pub overflowed: usize,
}

pub fn lateness<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    granularity: Granularity,
    source: LatenessSource,
) -> LatenessReport {
    let mut report = LatenessReport::default();
    let mut buckets: BTreeMap<CanonicalDate, Vec<f64>> = BTreeMap::new();

    for record in records {
        report.total_records += 1;
        match source.sample(record) {
            (None, _) => report.non_numeric += 1,
            (Some(_), None) => report.undated += 1,
            (Some(days), Some(date)) => buckets.entry(granularity.key(date)).or_default().push(days),
        }
    }

    let mut cumulative_count = 0;
    let mut cumulative_days_late = 0.0;
    for (period, values) in buckets {
        let mut count = 0;
        let mut total = 0.0;
        for days in values {
            // A value that would push either running sum past f64 range is dropped.
            let bucket_sum = total + days;
            let running_sum = cumulative_days_late + days;
            if !bucket_sum.is_finite() || !running_sum.is_finite() {
                report.overflowed += 1;
                continue;
            }
            count += 1;
            total = bucket_sum;
            cumulative_days_late = running_sum;
        }
        if count == 0 {
            continue;
        }
        cumulative_count += count;
        report.periods.push(LatenessPeriod {
            period,
            count,
            total_days_late: total,
            average_days_late: ratio(total, count),
            cumulative_count,
            cumulative_days_late,
            cumulative_average: ratio(cumulative_days_late, cumulative_count),
        });
    }

    report.summary = summarize(&report.periods);
    log::trace!(
        "lateness over {} records: {} periods, {} non-numeric, {} undated, {} overflowed",
        report.total_records,
        report.periods.len(),
        report.non_numeric,
        report.undated,
        report.overflowed
    );
    report
}

fn summarize(periods: &[LatenessPeriod]) -> LatenessSummary {
    if periods.is_empty() {
        return LatenessSummary::default();
    }
    let averages = periods.iter().map(|p| p.average_days_late);
    let min = averages.clone().fold(f64::INFINITY, f64::min);
    let max = averages.clone().fold(f64::NEG_INFINITY, f64::max);
    // Scale before summing so the mean of finite averages stays finite.
    let len = periods.len() as f64;
    LatenessSummary {
        min,
        max,
        mean: averages.map(|a| a / len).sum(),
    }
}
