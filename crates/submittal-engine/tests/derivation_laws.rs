use proptest::prelude::*;
use submittal_engine::aggregate::{
    date_counts, heatmap, lateness, DateBasis, Granularity, LatenessSource,
};
use submittal_engine::{
    filter_owned, filter_records, merge_rows, Constraint, CountMode, FilterState, MergeOptions,
    StatusField,
};
use submittal_model::{
    CanonicalDate, DateValue, MergedRecord, RawDocumentRow, RawValue, Revision,
};

fn arb_date() -> impl Strategy<Value = DateValue> {
    prop_oneof![
        1 => Just(DateValue::Unknown),
        4 => (2022i32..=2025, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| DateValue::from(CanonicalDate::from_ymd(y, m, d))),
    ]
}

fn arb_label() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec!["Civil", "Mech", "Elec", " Civil "]))
        .prop_map(|v| v.map(str::to_string))
}

fn arb_pick(values: &'static [&'static str]) -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(values)).prop_map(|v| v.map(str::to_string))
}

const SUB_PROJECTS: &[&str] = &["North", "South"];
const PEOPLE: &[&str] = &["alice", "bob"];
const STATUSES: &[&str] = &["Submitted", "Approved", "Rejected", ""];

fn arb_record() -> impl Strategy<Value = MergedRecord> {
    (
        (
            0u8..6,
            prop::option::of(0u32..4),
            arb_label(),
            arb_date(),
            arb_date(),
            prop::option::of(-30.0f64..90.0),
        ),
        (
            arb_pick(SUB_PROJECTS),
            arb_pick(PEOPLE),
            arb_pick(STATUSES),
            arb_pick(STATUSES),
            arb_pick(STATUSES),
        ),
    )
        .prop_map(
            |(
                (doc, rev, discipline, planned, actual, late),
                (sub_project, created_by, submission_status, review_status, step_outcome),
            )| MergedRecord {
                revision: rev.map(Revision::Number),
                discipline,
                sub_project,
                created_by,
                submission_status,
                review_status,
                step_outcome,
                planned_submission_date: planned,
                date_in: actual,
                days_late: late.map(RawValue::Number),
                ..MergedRecord::new(format!("DOC-{doc}"))
            },
        )
}

fn arb_status_field() -> impl Strategy<Value = StatusField> {
    prop::sample::select(vec![
        StatusField::Submission,
        StatusField::Review,
        StatusField::RawReview,
    ])
}

fn arb_state() -> impl Strategy<Value = FilterState> {
    (
        prop::sample::select(vec!["", "all", "Civil", "Mech"]),
        prop::sample::select(vec!["", "North", "South"]),
        prop::sample::select(vec!["", "ALL", "alice", "bob"]),
        prop::sample::select(vec!["", "Submitted", "Approved", "Rejected"]),
        arb_status_field(),
        prop::sample::select(vec!["", "doc-1", "2", "zzz"]),
        any::<bool>(),
    )
        .prop_map(
            |(discipline, sub_project, created_by, status, status_field, search, by_doc)| {
                FilterState {
                    discipline: Constraint::from(discipline),
                    sub_project: Constraint::from(sub_project),
                    created_by: Constraint::from(created_by),
                    status: Constraint::from(status),
                    status_field,
                    search: search.to_string(),
                    count_mode: if by_doc {
                        CountMode::ByDocument
                    } else {
                        CountMode::BySubmission
                    },
                }
            },
        )
}

/// Split `state` into two states whose constraints together make up `state`.
/// Each constraint goes to the first half, the second, or both, per `picks`.
fn split(state: &FilterState, picks: [u8; 5]) -> (FilterState, FilterState) {
    fn keep(constraint: &Constraint, pick: u8, half: u8) -> Constraint {
        if pick == half || pick == 2 {
            constraint.clone()
        } else {
            Constraint::Any
        }
    }
    let half = |h: u8| FilterState {
        discipline: keep(&state.discipline, picks[0], h),
        sub_project: keep(&state.sub_project, picks[1], h),
        created_by: keep(&state.created_by, picks[2], h),
        status: keep(&state.status, picks[3], h),
        search: if picks[4] == h || picks[4] == 2 {
            state.search.clone()
        } else {
            String::new()
        },
        ..state.clone()
    };
    (half(0), half(1))
}

proptest! {
    #[test]
    fn cumulative_is_a_running_sum(records in prop::collection::vec(arb_record(), 0..40)) {
        let counts = date_counts(&records, DateBasis::PlannedOrActual);
        let points = counts.series.points();
        for (i, p) in points.iter().enumerate() {
            let previous = if i == 0 { 0 } else { points[i - 1].cumulative };
            prop_assert_eq!(p.cumulative, previous + p.count);
            if i > 0 {
                prop_assert!(points[i - 1].date < p.date);
            }
        }
        prop_assert_eq!(counts.total(), records.len());
    }

    #[test]
    fn filtering_is_idempotent(
        records in prop::collection::vec(arb_record(), 0..40),
        state in arb_state(),
    ) {
        let once: Vec<MergedRecord> =
            filter_records(&records, &state).into_iter().cloned().collect();
        let again = filter_records(&records, &state);
        prop_assert_eq!(once.iter().collect::<Vec<_>>(), again);

        // Re-filtering the output changes nothing.
        let twice: Vec<&MergedRecord> = filter_records(&once, &state);
        prop_assert_eq!(twice, once.iter().collect::<Vec<_>>());
    }

    #[test]
    fn filtered_records_satisfy_the_constraints(
        records in prop::collection::vec(arb_record(), 0..40),
        state in arb_state(),
    ) {
        let needle = state.search.trim().to_lowercase();
        for record in filter_records(&records, &state) {
            prop_assert!(state.discipline.matches(record.discipline.as_deref()));
            prop_assert!(state.sub_project.matches(record.sub_project.as_deref()));
            prop_assert!(state.created_by.matches(record.created_by.as_deref()));
            prop_assert!(state.status.matches(state.status_field.value_of(record)));
            let title = record.title.as_deref().unwrap_or_default().to_lowercase();
            prop_assert!(
                record.document_no.to_lowercase().contains(&needle) || title.contains(&needle)
            );
        }
    }

    #[test]
    fn refiltering_by_part_of_the_constraints_equals_filtering_by_all(
        records in prop::collection::vec(arb_record(), 0..40),
        state in arb_state(),
        picks in prop::array::uniform5(0u8..3),
    ) {
        let (first, second) = split(&state, picks);
        let narrowed: Vec<MergedRecord> = filter_owned(&records, &first);
        let staged: Vec<MergedRecord> = filter_owned(&narrowed, &second);
        prop_assert_eq!(staged, filter_owned(&records, &state));

        // A subset of the constraints leaves an already filtered set unchanged.
        let filtered = filter_owned(&records, &state);
        prop_assert_eq!(filter_owned(&filtered, &first), filtered);
    }

    #[test]
    fn averages_are_always_finite(records in prop::collection::vec(arb_record(), 0..40)) {
        for granularity in [Granularity::Day, Granularity::Month] {
            let report = lateness(&records, granularity, LatenessSource::Submission);
            prop_assert!(report.summary.min.is_finite());
            prop_assert!(report.summary.max.is_finite());
            prop_assert!(report.summary.mean.is_finite());
            for p in &report.periods {
                prop_assert!(p.average_days_late.is_finite());
                prop_assert!(p.cumulative_average.is_finite());
            }
            let counted: usize = report.periods.iter().map(|p| p.count).sum();
            prop_assert_eq!(
                counted + report.non_numeric + report.undated + report.overflowed,
                report.total_records
            );
        }
    }

    #[test]
    fn heatmap_is_dense(
        records in prop::collection::vec(arb_record(), 0..40),
        year in 2022i32..=2025,
    ) {
        let cells = heatmap(&records, year, DateBasis::Actual);
        let expected = if year % 4 == 0 { 366 } else { 365 };
        prop_assert_eq!(cells.len(), expected);
        prop_assert!(cells.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn every_document_row_yields_one_record(count in 0usize..30) {
        let documents: Vec<RawDocumentRow> =
            (0..count).map(|i| RawDocumentRow::new(format!("D{i}"))).collect();
        let merged = merge_rows(&documents, &[], &MergeOptions::default());
        prop_assert_eq!(merged.len(), count);
        for (row, record) in documents.iter().zip(&merged) {
            prop_assert_eq!(&row.document_no, &record.document_no);
        }
    }
}
