//! One-shot dashboard report: filter once, then run every derivation over the result.

use serde::{Deserialize, Serialize};
use submittal_model::{CanonicalDate, MergedRecord};

use crate::aggregate::{
    available_years, date_counts, heatmap, lateness, progress, tally, DateBasis, DateCounts,
    Granularity, GroupField, HeatmapCell, LatenessReport, LatenessSource, ProgressSeries,
    SeriesPoint, TallyEntry, TallyOptions,
};
use crate::filter::{facets, filter_records, Facets, FilterState};
use crate::merge::MergeOptions;
use crate::view::{paginate, window, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: CanonicalDate,
    pub to: CanonicalDate,
}

/// What to compute. Every field has a default, so `{}` is a valid request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportRequest {
    pub merge: MergeOptions,
    pub filters: FilterState,
    pub tally_fields: Vec<GroupField>,
    pub tally: TallyOptions,
    pub count_basis: DateBasis,
    pub planned_basis: DateBasis,
    pub actual_basis: DateBasis,
    pub granularity: Granularity,
    pub lateness_source: LatenessSource,
    pub heatmap_basis: DateBasis,
    /// Defaults to the most recent year with data.
    pub heatmap_year: Option<i32>,
    pub window: Option<DateWindow>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ReportRequest {
    fn default() -> Self {
        Self {
            merge: MergeOptions::default(),
            filters: FilterState::default(),
            tally_fields: vec![GroupField::SubmissionStatus, GroupField::ReviewStatus],
            tally: TallyOptions::default(),
            count_basis: DateBasis::PlannedOrActual,
            planned_basis: DateBasis::Planned,
            actual_basis: DateBasis::Actual,
            granularity: Granularity::Month,
            lateness_source: LatenessSource::Submission,
            heatmap_basis: DateBasis::ActualOrPlanned,
            heatmap_year: None,
            window: None,
            page: 1,
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedTally {
    pub field: GroupField,
    pub entries: Vec<TallyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub total_records: usize,
    pub filtered_records: usize,
    pub facets: Facets,
    pub tallies: Vec<NamedTally>,
    pub date_counts: DateCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windowed_counts: Option<Vec<SeriesPoint>>,
    pub progress: ProgressSeries,
    pub lateness: LatenessReport,
    pub available_years: Vec<i32>,
    pub heatmap_year: Option<i32>,
    pub heatmap: Vec<HeatmapCell>,
    pub table: Page<MergedRecord>,
}

pub fn build_report(records: &[MergedRecord], request: &ReportRequest) -> DashboardReport {
    let filtered = filter_records(records, &request.filters);
    log::debug!(
        "report over {} of {} records",
        filtered.len(),
        records.len()
    );

    let tallies = request
        .tally_fields
        .iter()
        .map(|&field| NamedTally {
            field,
            entries: tally(filtered.iter().copied(), field, &request.tally),
        })
        .collect();

    let counts = date_counts(filtered.iter().copied(), request.count_basis);
    let windowed_counts = request
        .window
        .map(|w| window(counts.series.points(), w.from, w.to).to_vec());

    let years = available_years(filtered.iter().copied(), request.heatmap_basis);
    let heatmap_year = request.heatmap_year.or_else(|| years.last().copied());
    let cells = heatmap_year
        .map(|year| heatmap(filtered.iter().copied(), year, request.heatmap_basis))
        .unwrap_or_default();

    // Only the rows on the requested page are cloned.
    let table = paginate(&filtered, request.page, request.page_size).map(MergedRecord::clone);

    DashboardReport {
        total_records: records.len(),
        filtered_records: filtered.len(),
        facets: facets(records),
        tallies,
        windowed_counts,
        date_counts: counts,
        progress: progress(&filtered, request.planned_basis, request.actual_basis),
        lateness: lateness(
            filtered.iter().copied(),
            request.granularity,
            request.lateness_source,
        ),
        available_years: years,
        heatmap_year,
        heatmap: cells,
        table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_request_json_uses_defaults() {
        let request: ReportRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, ReportRequest::default());
    }

    #[test]
    fn empty_dataset_yields_empty_report() {
        let report = build_report(&[], &ReportRequest::default());
        assert_eq!(report.filtered_records, 0);
        assert!(report.heatmap.is_empty());
        assert_eq!(report.heatmap_year, None);
        assert_eq!(report.table.total_pages, 0);
        assert!(report.tallies.iter().all(|t| t.entries.is_empty()));
    }

    fn planned(doc: &str, day: u32) -> MergedRecord {
        MergedRecord {
            planned_submission_date: CanonicalDate::from_ymd(2024, 3, day).into(),
            ..MergedRecord::new(doc)
        }
    }

    #[test]
    fn window_trims_counts_and_page_borrows_filtered_rows() {
        let records = vec![
            planned("D1", 1),
            planned("D2", 5),
            planned("D3", 5),
            planned("D4", 9),
            planned("D5", 20),
        ];
        let request: ReportRequest = serde_json::from_str(
            r#"{
                "countBasis": "planned",
                "window": { "from": "2024-03-05", "to": "2024-03-09" },
                "page": 2,
                "pageSize": 2
            }"#,
        )
        .unwrap();
        let report = build_report(&records, &request);

        assert_eq!(report.date_counts.series.len(), 4);
        let windowed = report.windowed_counts.expect("window requested");
        let points: Vec<_> = windowed.iter().map(|p| (p.date, p.count, p.cumulative)).collect();
        assert_eq!(
            points,
            vec![
                (CanonicalDate::from_ymd(2024, 3, 5).unwrap(), 2, 3),
                (CanonicalDate::from_ymd(2024, 3, 9).unwrap(), 1, 4),
            ]
        );

        assert_eq!(report.table.page, 2);
        assert_eq!(report.table.total_pages, 3);
        assert_eq!(report.table.items, records[2..4].to_vec());

        let json = serde_json::to_value(build_report(&records, &ReportRequest::default())).unwrap();
        assert!(json.get("windowedCounts").is_none());
    }
}
