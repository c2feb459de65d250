use serde::{Deserialize, Serialize};

use crate::{DateValue, RawValue, Revision, SELECT_LIST_COUNT};

/// Which exports contributed to a [`MergedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordSource {
    #[default]
    Both,
    DocumentOnly,
    WorkflowOnly,
}

/// A document (or one revision of it) with its document-export and workflow-export fields.
///
/// Dates are normalized at merge time; everything else is carried through as read, with
/// absent fields left as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRecord {
    pub document_no: String,
    pub revision: Option<Revision>,
    pub source: RecordSource,

    // Document export.
    pub title: Option<String>,
    pub submission_status: Option<String>,
    pub review_status: Option<String>,
    pub status: Option<String>,
    pub created_by: Option<String>,
    pub discipline: Option<String>,
    pub sub_project: Option<String>,
    pub select_lists: [Option<String>; SELECT_LIST_COUNT],
    pub planned_submission_date: DateValue,
    /// The planned date was derived from date-in and days late rather than read.
    pub planned_imputed: bool,
    pub date_in: DateValue,
    pub days_late: Option<RawValue>,

    // Workflow export.
    pub assigned_to: Option<String>,
    pub step_status: Option<String>,
    pub step_outcome: Option<String>,
    pub original_due_date: DateValue,
    pub date_completed: DateValue,
    pub review_days_late: Option<RawValue>,
}

impl MergedRecord {
    pub fn new(document_no: impl Into<String>) -> Self {
        Self {
            document_no: document_no.into(),
            ..Default::default()
        }
    }

    /// Review status after later revisions are taken into account.
    ///
    /// A non-zero (or letter-coded) revision with a recorded step outcome reports that outcome;
    /// otherwise the document export's review status stands.
    pub fn effective_review_status(&self) -> Option<&str> {
        let superseded = self.revision.as_ref().is_some_and(Revision::is_nonzero);
        match self.step_outcome.as_deref().map(str::trim) {
            Some(outcome) if superseded && !outcome.is_empty() => Some(outcome),
            _ => self.review_status.as_deref(),
        }
    }

    pub fn has_workflow(&self) -> bool {
        !matches!(self.source, RecordSource::DocumentOnly)
    }

    pub fn has_document(&self) -> bool {
        !matches!(self.source, RecordSource::WorkflowOnly)
    }
}
