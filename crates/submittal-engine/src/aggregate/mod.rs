//! Chart derivations over filtered records.
//!
//! Every function here is pure: it takes the records to chart (usually the output of
//! [`crate::filter_records`]) and returns a fresh series. Records whose dates or days-late
//! values fail to parse are counted in an explicit "empty" or "excluded" bucket, never dropped
//! silently.

mod heatmap;
mod lateness;
mod series;
mod tally;

pub use heatmap::{available_years, heatmap, HeatmapCell};
pub use lateness::{
    lateness, Granularity, LatenessPeriod, LatenessReport, LatenessSource, LatenessSummary,
};
pub use series::{
    date_counts, progress, AggregateSeries, DateBasis, DateCounts, ProgressPoint,
    ProgressSeries, SeriesPoint,
};
pub use tally::{canonical_status, tally, GroupField, TallyEntry, TallyOptions, EMPTY_LABEL};

/// Divide, returning 0.0 when the denominator is zero or the result is not finite.
pub(crate) fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let value = total / count as f64;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
