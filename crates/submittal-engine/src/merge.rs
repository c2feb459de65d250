//! Joining the document export with the workflow export.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use submittal_model::{
    normalize_date, parse_days_late, DateSystem, DateValue, MergedRecord, RawDocumentRow,
    RawValue, RawWorkflowRow, RecordSource, Revision,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeOptions {
    pub date_system: DateSystem,
    /// Emit records for workflow rows whose document number is missing from the document export.
    pub include_orphan_workflows: bool,
    /// Derive a missing planned date from date-in and days late.
    pub impute_planned_dates: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            date_system: DateSystem::Excel1900,
            include_orphan_workflows: true,
            impute_planned_dates: true,
        }
    }
}

/// Join statistics for a single merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub matched: usize,
    pub document_only: usize,
    pub orphan_workflow: usize,
}

pub fn merge_rows(
    documents: &[RawDocumentRow],
    workflows: &[RawWorkflowRow],
    options: &MergeOptions,
) -> Vec<MergedRecord> {
    merge_rows_with_summary(documents, workflows, options).0
}

/// Merge the two exports on document number.
///
/// Every document row yields exactly one record, in input order, followed by one record per
/// distinct (document number, revision) among orphan workflow rows when enabled.
pub fn merge_rows_with_summary(
    documents: &[RawDocumentRow],
    workflows: &[RawWorkflowRow],
    options: &MergeOptions,
) -> (Vec<MergedRecord>, MergeSummary) {
    let mut by_document: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, row) in workflows.iter().enumerate() {
        by_document.entry(row.document_no.as_str()).or_default().push(idx);
    }

    let mut summary = MergeSummary::default();
    let mut out = Vec::with_capacity(documents.len());
    for doc in documents {
        let workflow = by_document
            .get(doc.document_no.as_str())
            .and_then(|candidates| select_workflow(doc, candidates, workflows));
        if workflow.is_some() {
            summary.matched += 1;
        } else {
            summary.document_only += 1;
        }
        out.push(merge_document(doc, workflow, options));
    }

    if options.include_orphan_workflows {
        let known: HashSet<&str> = documents.iter().map(|d| d.document_no.as_str()).collect();
        let mut order: Vec<(&str, Option<&Revision>)> = Vec::new();
        let mut latest: HashMap<(&str, Option<&Revision>), usize> = HashMap::new();
        for (idx, row) in workflows.iter().enumerate() {
            if known.contains(row.document_no.as_str()) {
                continue;
            }
            let key = (row.document_no.as_str(), row.revision.as_ref());
            if latest.insert(key, idx).is_none() {
                order.push(key);
            }
        }
        for key in order {
            if let Some(&idx) = latest.get(&key) {
                out.push(merge_orphan(&workflows[idx], options));
                summary.orphan_workflow += 1;
            }
        }
    }

    log::debug!(
        "merged {} records ({} matched, {} document-only, {} orphan workflow)",
        out.len(),
        summary.matched,
        summary.document_only,
        summary.orphan_workflow
    );
    (out, summary)
}

/// Pick the workflow row for a document row.
///
/// Candidates narrow to rows with the document's own revision when any exist; the latest
/// revision wins and ties go to the row appearing last in the export.
fn select_workflow<'a>(
    doc: &RawDocumentRow,
    candidates: &[usize],
    workflows: &'a [RawWorkflowRow],
) -> Option<&'a RawWorkflowRow> {
    let exact: Vec<usize> = match &doc.revision {
        Some(rev) => candidates
            .iter()
            .copied()
            .filter(|&idx| workflows[idx].revision.as_ref() == Some(rev))
            .collect(),
        None => Vec::new(),
    };
    let pool: &[usize] = if exact.is_empty() { candidates } else { &exact };

    pool.iter()
        .copied()
        // `max_by` keeps the last of equal elements.
        .max_by(|&a, &b| workflows[a].revision.cmp(&workflows[b].revision))
        .map(|idx| &workflows[idx])
}

fn merge_document(
    doc: &RawDocumentRow,
    workflow: Option<&RawWorkflowRow>,
    options: &MergeOptions,
) -> MergedRecord {
    let system = options.date_system;
    let wf_date_in = workflow.and_then(|w| w.date_in.as_ref());
    let wf_days_late = workflow.and_then(|w| w.days_late.as_ref());

    let date_in = normalize_date(doc.date_in.as_ref().or(wf_date_in), system);
    let days_late = doc.days_late.as_ref().or(wf_days_late).cloned();
    let planned = normalize_date(doc.planned_submission_date.as_ref(), system);
    let (planned_submission_date, planned_imputed) =
        impute_planned(planned, date_in, days_late.as_ref(), options);

    MergedRecord {
        document_no: doc.document_no.clone(),
        revision: doc
            .revision
            .clone()
            .or_else(|| workflow.and_then(|w| w.revision.clone())),
        source: if workflow.is_some() {
            RecordSource::Both
        } else {
            RecordSource::DocumentOnly
        },
        title: doc.title.clone(),
        submission_status: doc.submission_status.clone(),
        review_status: doc.review_status.clone(),
        status: doc.status.clone(),
        created_by: doc.created_by.clone(),
        discipline: doc.discipline.clone(),
        sub_project: doc.sub_project.clone(),
        select_lists: doc.select_lists.clone(),
        planned_submission_date,
        planned_imputed,
        date_in,
        days_late,
        assigned_to: workflow.and_then(|w| w.assigned_to.clone()),
        step_status: workflow.and_then(|w| w.step_status.clone()),
        step_outcome: workflow.and_then(|w| w.step_outcome.clone()),
        original_due_date: normalize_date(workflow.and_then(|w| w.original_due_date.as_ref()), system),
        date_completed: normalize_date(workflow.and_then(|w| w.date_completed.as_ref()), system),
        review_days_late: wf_days_late.cloned(),
    }
}

fn merge_orphan(workflow: &RawWorkflowRow, options: &MergeOptions) -> MergedRecord {
    let system = options.date_system;
    MergedRecord {
        document_no: workflow.document_no.clone(),
        revision: workflow.revision.clone(),
        source: RecordSource::WorkflowOnly,
        date_in: normalize_date(workflow.date_in.as_ref(), system),
        days_late: workflow.days_late.clone(),
        assigned_to: workflow.assigned_to.clone(),
        step_status: workflow.step_status.clone(),
        step_outcome: workflow.step_outcome.clone(),
        original_due_date: normalize_date(workflow.original_due_date.as_ref(), system),
        date_completed: normalize_date(workflow.date_completed.as_ref(), system),
        review_days_late: workflow.days_late.clone(),
        ..MergedRecord::default()
    }
}

/// Wider than chrono's whole calendar range.
const MAX_SHIFT_DAYS: f64 = 1e8;

fn impute_planned(
    planned: DateValue,
    date_in: DateValue,
    days_late: Option<&RawValue>,
    options: &MergeOptions,
) -> (DateValue, bool) {
    if planned.is_known() || !options.impute_planned_dates {
        return (planned, false);
    }
    let (Some(actual), Some(late)) = (date_in.as_date(), days_late.and_then(parse_days_late)) else {
        return (planned, false);
    };
    // Shifts beyond the calendar range (or an i64) cannot name a date.
    let shift = late.round();
    if shift.abs() > MAX_SHIFT_DAYS {
        return (planned, false);
    }
    match actual.add_days(-(shift as i64)) {
        Some(date) => (DateValue::Date(date), true),
        None => (planned, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use submittal_model::CanonicalDate;

    fn date(y: i32, m: u32, d: u32) -> DateValue {
        DateValue::Date(CanonicalDate::from_ymd(y, m, d).unwrap())
    }

    fn workflow(doc: &str, revision: Option<Revision>, outcome: &str) -> RawWorkflowRow {
        RawWorkflowRow {
            revision,
            step_outcome: Some(outcome.to_string()),
            ..RawWorkflowRow::new(doc)
        }
    }

    #[test]
    fn selects_latest_workflow_revision() {
        let docs = vec![RawDocumentRow::new("D1")];
        let wfs = vec![
            workflow("D1", Some(Revision::Number(1)), "first"),
            workflow("D1", Some(Revision::Code("A".to_string())), "lettered"),
            workflow("D1", Some(Revision::Number(0)), "original"),
        ];
        let merged = merge_rows(&docs, &wfs, &MergeOptions::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].step_outcome.as_deref(), Some("lettered"));
    }

    #[test]
    fn document_revision_narrows_candidates() {
        let docs = vec![RawDocumentRow {
            revision: Some(Revision::Number(0)),
            ..RawDocumentRow::new("D1")
        }];
        let wfs = vec![
            workflow("D1", Some(Revision::Number(0)), "rev0"),
            workflow("D1", Some(Revision::Number(1)), "rev1"),
        ];
        let merged = merge_rows(&docs, &wfs, &MergeOptions::default());
        assert_eq!(merged[0].step_outcome.as_deref(), Some("rev0"));
    }

    #[test]
    fn equal_revisions_prefer_the_later_row() {
        let docs = vec![RawDocumentRow::new("D1")];
        let wfs = vec![
            workflow("D1", Some(Revision::Number(1)), "step 1"),
            workflow("D1", Some(Revision::Number(1)), "step 2"),
        ];
        let merged = merge_rows(&docs, &wfs, &MergeOptions::default());
        assert_eq!(merged[0].step_outcome.as_deref(), Some("step 2"));
    }

    #[test]
    fn join_is_case_sensitive() {
        let docs = vec![RawDocumentRow::new("d1")];
        let wfs = vec![workflow("D1", None, "x")];
        let (merged, summary) = merge_rows_with_summary(&docs, &wfs, &MergeOptions::default());
        assert_eq!(merged[0].source, RecordSource::DocumentOnly);
        assert_eq!(merged[1].source, RecordSource::WorkflowOnly);
        assert_eq!(
            summary,
            MergeSummary {
                matched: 0,
                document_only: 1,
                orphan_workflow: 1
            }
        );
    }

    #[test]
    fn orphans_can_be_excluded() {
        let wfs = vec![workflow("W1", None, "x")];
        let options = MergeOptions {
            include_orphan_workflows: false,
            ..MergeOptions::default()
        };
        assert!(merge_rows(&[], &wfs, &options).is_empty());
    }

    #[test]
    fn orphans_keep_one_record_per_revision() {
        let wfs = vec![
            workflow("W1", Some(Revision::Number(0)), "a"),
            workflow("W1", Some(Revision::Number(0)), "b"),
            workflow("W1", Some(Revision::Number(1)), "c"),
        ];
        let merged = merge_rows(&[], &wfs, &MergeOptions::default());
        let outcomes: Vec<_> = merged.iter().map(|r| r.step_outcome.as_deref()).collect();
        assert_eq!(outcomes, vec![Some("b"), Some("c")]);
    }

    #[test]
    fn document_side_wins_and_workflow_fills() {
        let docs = vec![
            RawDocumentRow {
                date_in: Some(RawValue::from("02/03/2024")),
                ..RawDocumentRow::new("D1")
            },
            RawDocumentRow::new("D2"),
        ];
        let wfs = vec![
            RawWorkflowRow {
                date_in: Some(RawValue::from("09/03/2024")),
                ..RawWorkflowRow::new("D1")
            },
            RawWorkflowRow {
                date_in: Some(RawValue::from("09/03/2024")),
                ..RawWorkflowRow::new("D2")
            },
        ];
        let merged = merge_rows(&docs, &wfs, &MergeOptions::default());
        assert_eq!(merged[0].date_in, date(2024, 3, 2));
        assert_eq!(merged[1].date_in, date(2024, 3, 9));
    }

    #[test]
    fn imputes_planned_date_from_lateness() {
        let docs = vec![RawDocumentRow {
            date_in: Some(RawValue::from("10/03/2024")),
            days_late: Some(RawValue::Number(4.0)),
            ..RawDocumentRow::new("D1")
        }];
        let merged = merge_rows(&docs, &[], &MergeOptions::default());
        assert_eq!(merged[0].planned_submission_date, date(2024, 3, 6));
        assert!(merged[0].planned_imputed);

        let options = MergeOptions {
            impute_planned_dates: false,
            ..MergeOptions::default()
        };
        let merged = merge_rows(&docs, &[], &options);
        assert_eq!(merged[0].planned_submission_date, DateValue::Unknown);
        assert!(!merged[0].planned_imputed);
    }

    #[test]
    fn absurd_lateness_leaves_planned_date_unknown() {
        let docs: Vec<RawDocumentRow> = ["-1e19", "1e19", "-9223372036854775808", "1e300"]
            .into_iter()
            .enumerate()
            .map(|(i, late)| RawDocumentRow {
                date_in: Some(RawValue::from("10/03/2024")),
                days_late: Some(RawValue::from(late)),
                ..RawDocumentRow::new(format!("D{i}"))
            })
            .collect();
        let merged = merge_rows(&docs, &[], &MergeOptions::default());
        assert_eq!(merged.len(), 4);
        for record in &merged {
            assert_eq!(record.planned_submission_date, DateValue::Unknown);
            assert!(!record.planned_imputed);
            assert_eq!(record.date_in, date(2024, 3, 10));
        }
    }
}
