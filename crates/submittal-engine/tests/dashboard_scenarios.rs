use pretty_assertions::assert_eq;
use submittal_engine::aggregate::{
    date_counts, lateness, tally, DateBasis, Granularity, GroupField, LatenessSource,
    TallyOptions,
};
use submittal_engine::{
    build_report, filter_records, merge_rows, Constraint, CountMode, FilterState, MergeOptions,
    ReportRequest,
};
use submittal_model::{
    CanonicalDate, MergedRecord, RawDocumentRow, RawValue, RawWorkflowRow, Revision,
};

fn day(y: i32, m: u32, d: u32) -> CanonicalDate {
    CanonicalDate::from_ymd(y, m, d).unwrap()
}

#[test]
fn planned_and_actual_dates_bucket_separately() {
    let documents = vec![RawDocumentRow {
        planned_submission_date: Some(RawValue::from("01/03/2024")),
        ..RawDocumentRow::new("D1")
    }];
    let workflows = vec![RawWorkflowRow {
        date_in: Some(RawValue::from("05/03/2024")),
        revision: Some(Revision::Number(0)),
        ..RawWorkflowRow::new("D1")
    }];

    let merged = merge_rows(&documents, &workflows, &MergeOptions::default());
    assert_eq!(merged.len(), 1);
    assert!(merged[0].planned_submission_date.is_known());
    assert!(merged[0].date_in.is_known());

    let planned = date_counts(&merged, DateBasis::Planned);
    let actual = date_counts(&merged, DateBasis::Actual);
    assert_eq!(planned.count_on(day(2024, 3, 1)), 1);
    assert_eq!(actual.count_on(day(2024, 3, 5)), 1);
}

#[test]
fn same_bucket_lateness_averages() {
    let records: Vec<MergedRecord> = [5.0, 15.0, 25.0]
        .into_iter()
        .enumerate()
        .map(|(i, late)| MergedRecord {
            date_in: day(2024, 3, 5).into(),
            days_late: Some(RawValue::Number(late)),
            ..MergedRecord::new(format!("D{i}"))
        })
        .collect();

    let report = lateness(&records, Granularity::Day, LatenessSource::Submission);
    assert_eq!(report.periods.len(), 1);
    assert_eq!(report.periods[0].average_days_late, 15.0);
    assert_eq!(report.periods[0].cumulative_average, 15.0);
}

#[test]
fn invalid_day_lands_in_the_empty_bucket() {
    let documents = vec![RawDocumentRow {
        planned_submission_date: Some(RawValue::from("32/01/2024")),
        ..RawDocumentRow::new("D1")
    }];
    let merged = merge_rows(&documents, &[], &MergeOptions::default());
    let counts = date_counts(&merged, DateBasis::Planned);
    assert_eq!(counts.empty, 1);
    assert!(counts.series.is_empty());
    assert_eq!(counts.total(), 1);
}

#[test]
fn all_and_blank_sub_project_are_equivalent() {
    let records: Vec<MergedRecord> = ["North", "South"]
        .into_iter()
        .enumerate()
        .map(|(i, sub)| MergedRecord {
            sub_project: Some(sub.to_string()),
            ..MergedRecord::new(format!("D{i}"))
        })
        .collect();

    let all = FilterState {
        sub_project: Constraint::from("all"),
        ..FilterState::default()
    };
    let blank = FilterState {
        sub_project: Constraint::from(""),
        ..FilterState::default()
    };
    assert_eq!(filter_records(&records, &all), filter_records(&records, &blank));
    assert_eq!(filter_records(&records, &all).len(), 2);
}

#[test]
fn by_document_counts_only_the_latest_revision() {
    let records = vec![
        MergedRecord {
            revision: Some(Revision::Number(0)),
            submission_status: Some("Submitted".to_string()),
            ..MergedRecord::new("D1")
        },
        MergedRecord {
            revision: Some(Revision::Number(1)),
            submission_status: Some("Resubmitted".to_string()),
            ..MergedRecord::new("D1")
        },
    ];

    let by_document = filter_records(&records, &FilterState::default());
    assert_eq!(by_document.len(), 1);
    assert_eq!(by_document[0].revision, Some(Revision::Number(1)));
    let counts = tally(
        by_document,
        GroupField::SubmissionStatus,
        &TallyOptions::default(),
    );
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].label, "Resubmitted");

    let by_submission = FilterState {
        count_mode: CountMode::BySubmission,
        ..FilterState::default()
    };
    assert_eq!(filter_records(&records, &by_submission).len(), 2);
}

#[test]
fn later_revision_outcome_overrides_review_status() {
    let documents = vec![RawDocumentRow {
        revision: Some(Revision::Number(1)),
        review_status: Some("Pending".to_string()),
        ..RawDocumentRow::new("D1")
    }];
    let workflows = vec![RawWorkflowRow {
        revision: Some(Revision::Number(1)),
        step_outcome: Some("Approved".to_string()),
        ..RawWorkflowRow::new("D1")
    }];
    let merged = merge_rows(&documents, &workflows, &MergeOptions::default());
    assert_eq!(merged[0].effective_review_status(), Some("Approved"));

    let report = build_report(
        &merged,
        &ReportRequest {
            tally_fields: vec![GroupField::ReviewStatus],
            ..ReportRequest::default()
        },
    );
    assert_eq!(report.tallies[0].entries[0].label, "Approved");
}
