//! Off-thread filtering with stale-response suppression.
//!
//! Every [`FilterWorker::submit`] takes a new generation number. A ticket only yields records
//! if no newer submission (or data replacement) happened before its result was read, so a slow
//! filter pass finishing after a faster, later one can never overwrite the newer result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use submittal_model::MergedRecord;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

use crate::filter::{filter_owned, FilterState};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("filter task failed: {0}")]
    Join(#[from] JoinError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterResponse {
    Fresh {
        generation: u64,
        records: Vec<MergedRecord>,
    },
    /// A newer request was issued; the computed records were discarded.
    Superseded { generation: u64 },
}

impl FilterResponse {
    pub fn generation(&self) -> u64 {
        match self {
            FilterResponse::Fresh { generation, .. } | FilterResponse::Superseded { generation } => {
                *generation
            }
        }
    }

    pub fn into_records(self) -> Option<Vec<MergedRecord>> {
        match self {
            FilterResponse::Fresh { records, .. } => Some(records),
            FilterResponse::Superseded { .. } => None,
        }
    }
}

/// Runs [`filter_owned`] on tokio's blocking pool against a shared, immutable dataset.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct FilterWorker {
    data: Arc<RwLock<Arc<[MergedRecord]>>>,
    latest: Arc<AtomicU64>,
}

impl FilterWorker {
    pub fn new(data: impl Into<Arc<[MergedRecord]>>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data.into())),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Swap the dataset. Outstanding tickets become superseded.
    pub fn replace_data(&self, data: impl Into<Arc<[MergedRecord]>>) {
        *self.data.write().expect("filter data lock poisoned") = data.into();
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn submit(&self, state: FilterState) -> FilterTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let data = self.data.read().expect("filter data lock poisoned").clone();
        log::trace!("filter generation {generation} over {} records", data.len());
        let handle = tokio::task::spawn_blocking(move || filter_owned(&data, &state));
        FilterTicket {
            generation,
            latest: Arc::clone(&self.latest),
            handle,
        }
    }
}

/// The pending result of one [`FilterWorker::submit`].
#[derive(Debug)]
pub struct FilterTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
    handle: JoinHandle<Vec<MergedRecord>>,
}

impl FilterTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    pub async fn resolve(self) -> Result<FilterResponse, WorkerError> {
        let records = self.handle.await?;
        if self.latest.load(Ordering::SeqCst) == self.generation {
            Ok(FilterResponse::Fresh {
                generation: self.generation,
                records,
            })
        } else {
            log::debug!(
                "discarding superseded filter result (generation {})",
                self.generation
            );
            Ok(FilterResponse::Superseded {
                generation: self.generation,
            })
        }
    }
}
