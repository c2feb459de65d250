//! `submittal-model` defines the row and record types shared by the submittal dashboard crates.
//!
//! The crate covers everything up to (but not including) the merge:
//! - raw document/workflow export rows and the header mapping that produces them
//! - CSV and workbook readers for the exports
//! - revisions and their ordering
//! - the date normalizer every downstream comparison goes through
//! - the serde-friendly [`MergedRecord`] persisted per project

mod columns;
pub mod date;
mod date_system;
pub mod import;
mod record;
mod revision;
mod row;
mod value;

pub use columns::{
    documents_from_rows, normalize_header, workflows_from_rows, ColumnMap, DocumentField,
    KeyedRow, WorkflowField,
};
pub use date::{normalize_date, normalize_serial, normalize_text, CanonicalDate, DateValue};
pub use date_system::DateSystem;
pub use record::{MergedRecord, RecordSource};
pub use revision::Revision;
pub use row::{RawDocumentRow, RawWorkflowRow, SELECT_LIST_COUNT};
pub use value::{parse_days_late, RawValue};
