//! Worker type definitions
//!
//! Progress events sent from workers to the engine, the per-worker report
//! returned on exit and the run summary.

use serde::{Deserialize, Serialize};

use crate::errors::DownloadError;

/// Final state of one job as seen by a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Page fetched and stored
    Downloaded { bytes: u64, attempts: u32 },
    /// Page already complete on disk
    Skipped,
    /// Page could not be fetched
    Failed { reason: String },
}

/// Progress report from a download worker, one per finished job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerProgress {
    pub worker_id: usize,
    pub ordinal: usize,
    pub status: JobStatus,
}

/// Engine-level progress forwarded to a display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Jobs finished so far, failures included
    pub completed: usize,
    pub total: usize,
    /// Whether this update falls on a reporting boundary
    pub milestone: bool,
}

/// What a worker hands back once the queue is drained
#[derive(Debug, Default)]
pub struct WorkerReport {
    pub requests: u64,
    pub failures: Vec<(usize, DownloadError)>,
}

/// Totals for one engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    /// Pages fetched during this run
    pub downloaded: usize,
    /// Pages found complete on disk
    pub skipped: usize,
    /// Image requests issued, retries included
    pub requests: u64,
    /// Bytes written
    pub bytes: u64,
}

/// Counts completions and decides when a report is due
///
/// A report is due every `every` completions and once more at the end.
#[derive(Debug, Clone)]
pub struct CompletionCounter {
    completed: usize,
    total: usize,
    every: usize,
}

impl CompletionCounter {
    pub fn new(total: usize, every: usize) -> Self {
        Self {
            completed: 0,
            total,
            every: every.max(1),
        }
    }

    /// Record one finished job
    pub fn record(&mut self) -> DownloadProgress {
        self.completed += 1;
        DownloadProgress {
            completed: self.completed,
            total: self.total,
            milestone: self.completed % self.every == 0 || self.completed == self.total,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }
}
