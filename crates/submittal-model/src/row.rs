use serde::{Deserialize, Serialize};

use crate::{RawValue, Revision};

/// Number of "select list" dimension columns carried by the document export.
pub const SELECT_LIST_COUNT: usize = 5;

/// One row of the document-tracking export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocumentRow {
    pub document_no: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub revision: Option<Revision>,
    #[serde(default)]
    pub submission_status: Option<String>,
    #[serde(default)]
    pub review_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub planned_submission_date: Option<RawValue>,
    #[serde(default)]
    pub date_in: Option<RawValue>,
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub sub_project: Option<String>,
    #[serde(default)]
    pub select_lists: [Option<String>; SELECT_LIST_COUNT],
    #[serde(default)]
    pub days_late: Option<RawValue>,
}

impl RawDocumentRow {
    pub fn new(document_no: impl Into<String>) -> Self {
        Self {
            document_no: document_no.into(),
            ..Default::default()
        }
    }
}

/// One row of the workflow/review-tracking export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkflowRow {
    pub document_no: String,
    #[serde(default)]
    pub revision: Option<Revision>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub step_status: Option<String>,
    #[serde(default)]
    pub step_outcome: Option<String>,
    #[serde(default)]
    pub original_due_date: Option<RawValue>,
    #[serde(default)]
    pub date_completed: Option<RawValue>,
    #[serde(default)]
    pub date_in: Option<RawValue>,
    #[serde(default)]
    pub days_late: Option<RawValue>,
}

impl RawWorkflowRow {
    pub fn new(document_no: impl Into<String>) -> Self {
        Self {
            document_no: document_no.into(),
            ..Default::default()
        }
    }
}
