//! `submittal-engine` turns raw document and workflow rows into dashboard data.
//!
//! The pipeline is: [`merge_rows`] once per upload, [`filter_records`] whenever the filter
//! state changes (optionally off-thread through [`FilterWorker`]), then the pure derivations in
//! [`aggregate`] over the filtered slice. [`build_report`] runs the whole chain in one call.

pub mod aggregate;
mod debounce;
mod filter;
mod merge;
mod report;
mod view;
mod worker;

pub use debounce::{DebounceConfig, SearchDebouncer};
pub use filter::{
    facets, filter_owned, filter_records, latest_revisions, Constraint, CountMode, Facets,
    FilterState, StatusField,
};
pub use merge::{merge_rows, merge_rows_with_summary, MergeOptions, MergeSummary};
pub use report::{build_report, DashboardReport, DateWindow, NamedTally, ReportRequest};
pub use view::{paginate, window, Page};
pub use worker::{FilterResponse, FilterTicket, FilterWorker, WorkerError};
