//! Mapping from export column headers to typed row fields.
//!
//! Exports are read as string-keyed rows ([`KeyedRow`]). Header text varies between export
//! templates ("Document No" vs "Doc No.", "Sub-Project" vs "Sub Project"), so headers are
//! normalized (case-folded, punctuation collapsed to single spaces) before lookup.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{RawDocumentRow, RawValue, RawWorkflowRow, Revision, SELECT_LIST_COUNT};

/// A parsed export row: header name to non-blank cell.
pub type KeyedRow = BTreeMap<String, RawValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    DocumentNo,
    Title,
    Revision,
    SubmissionStatus,
    ReviewStatus,
    Status,
    CreatedBy,
    PlannedSubmissionDate,
    DateIn,
    Discipline,
    SubProject,
    /// Zero-based index into [`RawDocumentRow::select_lists`].
    SelectList(usize),
    DaysLate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowField {
    DocumentNo,
    Revision,
    AssignedTo,
    StepStatus,
    StepOutcome,
    OriginalDueDate,
    DateCompleted,
    DateIn,
    DaysLate,
}

const DOCUMENT_ALIASES: &[(&str, DocumentField)] = &[
    ("document no", DocumentField::DocumentNo),
    ("document number", DocumentField::DocumentNo),
    ("doc no", DocumentField::DocumentNo),
    ("doc number", DocumentField::DocumentNo),
    ("title", DocumentField::Title),
    ("document title", DocumentField::Title),
    ("revision", DocumentField::Revision),
    ("rev", DocumentField::Revision),
    ("submission status", DocumentField::SubmissionStatus),
    ("review status", DocumentField::ReviewStatus),
    ("status", DocumentField::Status),
    ("document status", DocumentField::Status),
    ("created by", DocumentField::CreatedBy),
    ("creator", DocumentField::CreatedBy),
    ("supplier", DocumentField::CreatedBy),
    ("planned submission date", DocumentField::PlannedSubmissionDate),
    ("planned date", DocumentField::PlannedSubmissionDate),
    ("date in", DocumentField::DateIn),
    ("actual submission date", DocumentField::DateIn),
    ("discipline", DocumentField::Discipline),
    ("sub project", DocumentField::SubProject),
    ("subproject", DocumentField::SubProject),
    ("days late", DocumentField::DaysLate),
    ("submission days late", DocumentField::DaysLate),
];

const WORKFLOW_ALIASES: &[(&str, WorkflowField)] = &[
    ("document no", WorkflowField::DocumentNo),
    ("document number", WorkflowField::DocumentNo),
    ("doc no", WorkflowField::DocumentNo),
    ("doc number", WorkflowField::DocumentNo),
    ("revision", WorkflowField::Revision),
    ("rev", WorkflowField::Revision),
    ("document revision", WorkflowField::Revision),
    ("assigned to", WorkflowField::AssignedTo),
    ("reviewer", WorkflowField::AssignedTo),
    ("step status", WorkflowField::StepStatus),
    ("step outcome", WorkflowField::StepOutcome),
    ("outcome", WorkflowField::StepOutcome),
    ("original due date", WorkflowField::OriginalDueDate),
    ("due date", WorkflowField::OriginalDueDate),
    ("date completed", WorkflowField::DateCompleted),
    ("completed date", WorkflowField::DateCompleted),
    ("date in", WorkflowField::DateIn),
    ("days late", WorkflowField::DaysLate),
];

/// Normalize a header for alias lookup: lowercase, `_`/`-`/`.`/`#` become spaces, runs of
/// whitespace collapse.
pub fn normalize_header(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '_' | '-' | '.' | '#' | ':' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Header alias table for one export kind.
#[derive(Debug, Clone)]
pub struct ColumnMap<F> {
    aliases: HashMap<String, F>,
}

impl ColumnMap<DocumentField> {
    /// The built-in aliases for the document-tracking export.
    pub fn documents() -> Self {
        let mut aliases: HashMap<String, DocumentField> = DOCUMENT_ALIASES
            .iter()
            .map(|(name, field)| (name.to_string(), *field))
            .collect();
        for idx in 0..SELECT_LIST_COUNT {
            aliases.insert(format!("select list {}", idx + 1), DocumentField::SelectList(idx));
        }
        Self { aliases }
    }
}

impl ColumnMap<WorkflowField> {
    /// The built-in aliases for the workflow/review export.
    pub fn workflows() -> Self {
        Self {
            aliases: WORKFLOW_ALIASES
                .iter()
                .map(|(name, field)| (name.to_string(), *field))
                .collect(),
        }
    }
}

impl<F: Copy> ColumnMap<F> {
    /// Add (or override) an alias. The header is normalized the same way lookups are.
    pub fn with_alias(mut self, header: &str, field: F) -> Self {
        self.aliases.insert(normalize_header(header), field);
        self
    }

    pub fn resolve(&self, header: &str) -> Option<F> {
        self.aliases.get(&normalize_header(header)).copied()
    }

    fn resolve_all<'a>(&self, rows: &'a [KeyedRow]) -> (HashMap<&'a str, F>, BTreeSet<&'a str>) {
        let mut resolved = HashMap::new();
        let mut unmapped = BTreeSet::new();
        for row in rows {
            for header in row.keys() {
                if resolved.contains_key(header.as_str()) || unmapped.contains(header.as_str()) {
                    continue;
                }
                match self.resolve(header) {
                    Some(field) => {
                        resolved.insert(header.as_str(), field);
                    }
                    None => {
                        unmapped.insert(header.as_str());
                    }
                }
            }
        }
        (resolved, unmapped)
    }
}

fn text(value: &RawValue) -> Option<String> {
    let s = value.as_text();
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Convert string-keyed document export rows into typed rows.
///
/// Rows without a document number are dropped; unknown headers are reported once.
pub fn documents_from_rows(rows: &[KeyedRow], map: &ColumnMap<DocumentField>) -> Vec<RawDocumentRow> {
    let (resolved, unmapped) = map.resolve_all(rows);
    if !unmapped.is_empty() {
        log::warn!("document export has unmapped columns: {unmapped:?}");
    }

    let mut out = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        let mut doc = RawDocumentRow::default();
        for (header, value) in row {
            let Some(field) = resolved.get(header.as_str()) else {
                continue;
            };
            match *field {
                DocumentField::DocumentNo => doc.document_no = text(value).unwrap_or_default(),
                DocumentField::Title => doc.title = text(value),
                DocumentField::Revision => doc.revision = Revision::from_raw(value),
                DocumentField::SubmissionStatus => doc.submission_status = text(value),
                DocumentField::ReviewStatus => doc.review_status = text(value),
                DocumentField::Status => doc.status = text(value),
                DocumentField::CreatedBy => doc.created_by = text(value),
                DocumentField::PlannedSubmissionDate => {
                    doc.planned_submission_date = Some(value.clone())
                }
                DocumentField::DateIn => doc.date_in = Some(value.clone()),
                DocumentField::Discipline => doc.discipline = text(value),
                DocumentField::SubProject => doc.sub_project = text(value),
                DocumentField::SelectList(idx) => {
                    if let Some(slot) = doc.select_lists.get_mut(idx) {
                        *slot = text(value);
                    }
                }
                DocumentField::DaysLate => doc.days_late = Some(value.clone()),
            }
        }
        if doc.document_no.is_empty() {
            skipped += 1;
            continue;
        }
        out.push(doc);
    }
    if skipped > 0 {
        log::debug!("skipped {skipped} document rows without a document number");
    }
    out
}

/// Convert string-keyed workflow export rows into typed rows.
pub fn workflows_from_rows(rows: &[KeyedRow], map: &ColumnMap<WorkflowField>) -> Vec<RawWorkflowRow> {
    let (resolved, unmapped) = map.resolve_all(rows);
    if !unmapped.is_empty() {
        log::warn!("workflow export has unmapped columns: {unmapped:?}");
    }

    let mut out = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        let mut wf = RawWorkflowRow::default();
        for (header, value) in row {
            let Some(field) = resolved.get(header.as_str()) else {
                continue;
            };
            match *field {
                WorkflowField::DocumentNo => wf.document_no = text(value).unwrap_or_default(),
                WorkflowField::Revision => wf.revision = Revision::from_raw(value),
                WorkflowField::AssignedTo => wf.assigned_to = text(value),
                WorkflowField::StepStatus => wf.step_status = text(value),
                WorkflowField::StepOutcome => wf.step_outcome = text(value),
                WorkflowField::OriginalDueDate => wf.original_due_date = Some(value.clone()),
                WorkflowField::DateCompleted => wf.date_completed = Some(value.clone()),
                WorkflowField::DateIn => wf.date_in = Some(value.clone()),
                WorkflowField::DaysLate => wf.days_late = Some(value.clone()),
            }
        }
        if wf.document_no.is_empty() {
            skipped += 1;
            continue;
        }
        out.push(wf);
    }
    if skipped > 0 {
        log::debug!("skipped {skipped} workflow rows without a document number");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn headers_normalize_punctuation_and_case() {
        assert_eq!(normalize_header("  Doc  No. "), "doc no");
        assert_eq!(normalize_header("Sub-Project"), "sub project");
        assert_eq!(normalize_header("Select_List_3"), "select list 3");
    }

    #[test]
    fn built_in_aliases_resolve() {
        let docs = ColumnMap::documents();
        assert_eq!(docs.resolve("Document No"), Some(DocumentField::DocumentNo));
        assert_eq!(docs.resolve("Select List 5"), Some(DocumentField::SelectList(4)));
        assert_eq!(docs.resolve("Select List 6"), None);
        let wf = ColumnMap::workflows();
        assert_eq!(wf.resolve("Step Outcome"), Some(WorkflowField::StepOutcome));
    }

    #[test]
    fn custom_alias_overrides() {
        let docs = ColumnMap::documents().with_alias("Vendor", DocumentField::CreatedBy);
        assert_eq!(docs.resolve("VENDOR"), Some(DocumentField::CreatedBy));
    }
}
