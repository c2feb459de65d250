use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use submittal_model::MergedRecord;

use crate::filter::StatusField;

/// Label used for records whose grouped field is blank.
pub const EMPTY_LABEL: &str = "Empty";

const SUBMITTED: &str = "Submitted";
const CANCELLED: &str = "Cancelled";

/// The record field a tally groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupField {
    #[default]
    SubmissionStatus,
    /// Review status with later-revision outcomes applied.
    ReviewStatus,
    RawReviewStatus,
    StepStatus,
    Status,
    Discipline,
    SubProject,
    CreatedBy,
    AssignedTo,
}

impl GroupField {
    pub fn value_of(self, record: &MergedRecord) -> Option<&str> {
        match self {
            GroupField::SubmissionStatus => StatusField::Submission.value_of(record),
            GroupField::ReviewStatus => StatusField::Review.value_of(record),
            GroupField::RawReviewStatus => StatusField::RawReview.value_of(record),
            GroupField::StepStatus => StatusField::Step.value_of(record),
            GroupField::Status => StatusField::General.value_of(record),
            GroupField::Discipline => record.discipline.as_deref(),
            GroupField::SubProject => record.sub_project.as_deref(),
            GroupField::CreatedBy => record.created_by.as_deref(),
            GroupField::AssignedTo => record.assigned_to.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TallyOptions {
    /// Leave out records whose submission status (or the grouped value) is cancelled.
    pub exclude_cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub label: String,
    pub count: usize,
}

/// Collapse spelling variants of the statuses the dashboards treat specially.
pub fn canonical_status(raw: Option<&str>) -> Cow<'_, str> {
    let Some(trimmed) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Cow::Borrowed(EMPTY_LABEL);
    };
    let folded = trimmed.trim_end_matches('.').to_ascii_lowercase();
    match folded.as_str() {
        "submitted" | "submited" => Cow::Borrowed(SUBMITTED),
        "cancelled" | "canceled" => Cow::Borrowed(CANCELLED),
        _ => Cow::Borrowed(trimmed),
    }
}

/// Count records per canonical label, most frequent first (ties by label).
pub fn tally<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    field: GroupField,
    options: &TallyOptions,
) -> Vec<TallyEntry> {
    let mut counts: HashMap<Cow<'a, str>, usize> = HashMap::new();
    for record in records {
        let label = canonical_status(field.value_of(record));
        if options.exclude_cancelled
            && (label == CANCELLED
                || canonical_status(record.submission_status.as_deref()) == CANCELLED)
        {
            continue;
        }
        *counts.entry(label).or_default() += 1;
    }

    let mut entries: Vec<TallyEntry> = counts
        .into_iter()
        .map(|(label, count)| TallyEntry {
            label: label.into_owned(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_status(status: &str) -> MergedRecord {
        MergedRecord {
            submission_status: Some(status.to_string()),
            ..MergedRecord::new("D")
        }
    }

    #[test]
    fn canonicalizes_submitted_variants() {
        for raw in ["Submitted", "submited", "SUBMITTED.", " submitted "] {
            assert_eq!(canonical_status(Some(raw)), SUBMITTED, "{raw}");
        }
        assert_eq!(canonical_status(Some("Canceled")), CANCELLED);
        assert_eq!(canonical_status(Some("  ")), EMPTY_LABEL);
        assert_eq!(canonical_status(None), EMPTY_LABEL);
        assert_eq!(canonical_status(Some("In Review")), "In Review");
    }

    #[test]
    fn orders_by_count_then_label() {
        let records = vec![
            with_status("Submitted"),
            with_status("Pending"),
            with_status("submited"),
            with_status("Draft"),
            with_status("Cancelled"),
        ];
        let out = tally(&records, GroupField::SubmissionStatus, &TallyOptions::default());
        let labels: Vec<_> = out.iter().map(|e| (e.label.as_str(), e.count)).collect();
        assert_eq!(
            labels,
            vec![("Submitted", 2), ("Cancelled", 1), ("Draft", 1), ("Pending", 1)]
        );
    }

    #[test]
    fn cancelled_rows_can_be_excluded() {
        let mut cancelled = with_status("canceled");
        cancelled.discipline = Some("Civil".to_string());
        let mut kept = with_status("Submitted");
        kept.discipline = Some("Civil".to_string());
        let out = tally(
            &[cancelled, kept],
            GroupField::Discipline,
            &TallyOptions {
                exclude_cancelled: true,
            },
        );
        assert_eq!(
            out,
            vec![TallyEntry {
                label: "Civil".to_string(),
                count: 1
            }]
        );
    }
}
