//! SQLite-backed persistence for submittal dashboard projects.
//!
//! Each project is a single JSON blob of merged records keyed by project number, overwritten
//! on every save. Raw export uploads are kept alongside in an append-only table.

mod schema;
pub mod storage;

pub use storage::{Project, ProjectStore, ProjectSummary, StorageError, Upload, UploadKind};
