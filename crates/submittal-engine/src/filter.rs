//! Dashboard filters over merged records.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use submittal_model::MergedRecord;

/// An equality constraint on one record field.
///
/// `""` and `"all"` (any case) mean "no restriction", never "match the empty string".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Constraint {
    #[default]
    Any,
    Equals(String),
}

impl Constraint {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Constraint::Any
        } else {
            Constraint::Equals(trimmed.to_string())
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Constraint::Any)
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Equals(expected) => value.map(str::trim) == Some(expected.as_str()),
        }
    }
}

impl From<&str> for Constraint {
    fn from(value: &str) -> Self {
        Constraint::parse(value)
    }
}

impl From<Option<String>> for Constraint {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map_or(Constraint::Any, Constraint::parse)
    }
}

impl From<Constraint> for Option<String> {
    fn from(value: Constraint) -> Self {
        match value {
            Constraint::Any => None,
            Constraint::Equals(s) => Some(s),
        }
    }
}

/// Which status column the status constraint reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusField {
    #[default]
    Submission,
    /// Review status after later-revision outcomes are applied.
    Review,
    RawReview,
    Step,
    General,
}

impl StatusField {
    pub fn value_of(self, record: &MergedRecord) -> Option<&str> {
        match self {
            StatusField::Submission => record.submission_status.as_deref(),
            StatusField::Review => record.effective_review_status(),
            StatusField::RawReview => record.review_status.as_deref(),
            StatusField::Step => record.step_status.as_deref(),
            StatusField::General => record.status.as_deref(),
        }
    }
}

/// Whether counts are per document (latest revision only) or per submission (every row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CountMode {
    #[default]
    ByDocument,
    BySubmission,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub discipline: Constraint,
    pub sub_project: Constraint,
    pub created_by: Constraint,
    pub status: Constraint,
    pub status_field: StatusField,
    pub search: String,
    pub count_mode: CountMode,
}

impl FilterState {
    /// True when no constraint or search restricts the rows (the count mode may still reduce).
    pub fn is_unconstrained(&self) -> bool {
        self.discipline.is_any()
            && self.sub_project.is_any()
            && self.created_by.is_any()
            && self.status.is_any()
            && self.search.trim().is_empty()
    }
}

/// Reduce to one record per document number: the highest revision, ties going to the later
/// record. Each document keeps the position of its first occurrence.
pub fn latest_revisions<'a>(records: impl IntoIterator<Item = &'a MergedRecord>) -> Vec<&'a MergedRecord> {
    let mut slots: Vec<&'a MergedRecord> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for record in records {
        match index.get(record.document_no.as_str()) {
            Some(&slot) => {
                if record.revision >= slots[slot].revision {
                    slots[slot] = record;
                }
            }
            None => {
                index.insert(record.document_no.as_str(), slots.len());
                slots.push(record);
            }
        }
    }
    slots
}

/// Select the records matching `state`, preserving input order.
pub fn filter_records<'a>(
    records: impl IntoIterator<Item = &'a MergedRecord>,
    state: &FilterState,
) -> Vec<&'a MergedRecord> {
    let base: Vec<&'a MergedRecord> = match state.count_mode {
        CountMode::ByDocument => latest_revisions(records),
        CountMode::BySubmission => records.into_iter().collect(),
    };
    if state.is_unconstrained() {
        return base;
    }

    let needle = state.search.trim().to_lowercase();
    base.into_iter()
        .filter(|record| matches_state(record, state, &needle))
        .collect()
}

/// Owned variant of [`filter_records`] for callers that hand results across a task boundary.
pub fn filter_owned(records: &[MergedRecord], state: &FilterState) -> Vec<MergedRecord> {
    filter_records(records, state).into_iter().cloned().collect()
}

fn matches_state(record: &MergedRecord, state: &FilterState, needle: &str) -> bool {
    state.discipline.matches(record.discipline.as_deref())
        && state.sub_project.matches(record.sub_project.as_deref())
        && state.created_by.matches(record.created_by.as_deref())
        && state.status.matches(state.status_field.value_of(record))
        && matches_search(record, needle)
}

fn matches_search(record: &MergedRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record.document_no.to_lowercase().contains(needle)
        || record
            .title
            .as_deref()
            .is_some_and(|title| title.to_lowercase().contains(needle))
}

/// Distinct values available for each filter dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub disciplines: Vec<String>,
    pub sub_projects: Vec<String>,
    pub creators: Vec<String>,
    pub submission_statuses: Vec<String>,
    pub review_statuses: Vec<String>,
    pub step_statuses: Vec<String>,
}

pub fn facets<'a>(records: impl IntoIterator<Item = &'a MergedRecord>) -> Facets {
    fn add(set: &mut BTreeSet<String>, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if !set.contains(v) {
                set.insert(v.to_string());
            }
        }
    }

    let mut disciplines = BTreeSet::new();
    let mut sub_projects = BTreeSet::new();
    let mut creators = BTreeSet::new();
    let mut submission = BTreeSet::new();
    let mut review = BTreeSet::new();
    let mut step = BTreeSet::new();
    for r in records {
        add(&mut disciplines, r.discipline.as_deref());
        add(&mut sub_projects, r.sub_project.as_deref());
        add(&mut creators, r.created_by.as_deref());
        add(&mut submission, r.submission_status.as_deref());
        add(&mut review, r.effective_review_status());
        add(&mut step, r.step_status.as_deref());
    }

    Facets {
        disciplines: disciplines.into_iter().collect(),
        sub_projects: sub_projects.into_iter().collect(),
        creators: creators.into_iter().collect(),
        submission_statuses: submission.into_iter().collect(),
        review_statuses: review.into_iter().collect(),
        step_statuses: step.into_iter().collect(),
    }
}
