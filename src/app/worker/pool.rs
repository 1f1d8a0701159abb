//! Worker pool management
//!
//! [`DownloadEngine`] fans a list of jobs out over a fixed number of workers
//! sharing one queue. Each worker gets a fresh session seeded with the same
//! cookie snapshot. The engine waits for every job, so one failed page does
//! not abort the others; the first failure in page order is reported.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use super::config::WorkerConfig;
use super::core::DownloadWorker;
use super::types::{CompletionCounter, DownloadProgress, DownloadSummary, JobStatus};
use crate::app::client::{ClientConfig, CookieSnapshot};
use crate::app::models::DownloadJob;
use crate::errors::{DownloadError, DownloadResult};

/// FIFO queue of pending jobs shared by all workers
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<DownloadJob>>,
}

impl JobQueue {
    pub fn new(jobs: impl IntoIterator<Item = DownloadJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into_iter().collect()),
        }
    }

    /// Take the next job, `None` once the queue is drained
    pub async fn pop(&self) -> Option<DownloadJob> {
        self.jobs.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

/// Parallel page downloader
#[derive(Debug)]
pub struct DownloadEngine {
    config: WorkerConfig,
    client: ClientConfig,
    progress_tx: Option<mpsc::Sender<DownloadProgress>>,
}

impl DownloadEngine {
    /// Create an engine after validating `config`
    pub fn new(config: WorkerConfig, client: ClientConfig) -> DownloadResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client,
            progress_tx: None,
        })
    }

    /// Forward every completion to a display
    pub fn with_progress(mut self, progress_tx: mpsc::Sender<DownloadProgress>) -> Self {
        self.progress_tx = Some(progress_tx);
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Download every job and wait for all of them
    ///
    /// # Errors
    ///
    /// Returns the failure of the lowest-numbered failed page, or
    /// `DownloadError::WorkerPanic` if a worker task died.
    pub async fn run(
        &self,
        jobs: Vec<DownloadJob>,
        cookies: &CookieSnapshot,
    ) -> DownloadResult<DownloadSummary> {
        let total = jobs.len();
        if total == 0 {
            return Ok(DownloadSummary::default());
        }

        let worker_count = self.config.worker_count.min(total);
        info!("Downloading {} pages with {} workers", total, worker_count);

        let queue = Arc::new(JobQueue::new(jobs));
        let config = Arc::new(self.config.clone());
        let (worker_tx, mut worker_rx) = mpsc::channel(self.config.progress_buffer_size);

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let session = self.client.build_session(cookies)?;
            let worker = DownloadWorker::new(
                worker_id,
                session,
                Arc::clone(&config),
                Arc::clone(&queue),
                worker_tx.clone(),
            );
            handles.push(tokio::spawn(worker.run()));
        }
        drop(worker_tx);

        let mut summary = DownloadSummary::default();
        let mut counter = CompletionCounter::new(total, self.config.report_every);
        while let Some(progress) = worker_rx.recv().await {
            match progress.status {
                JobStatus::Downloaded { bytes, .. } => {
                    summary.downloaded += 1;
                    summary.bytes += bytes;
                }
                JobStatus::Skipped => summary.skipped += 1,
                JobStatus::Failed { .. } => {}
            }

            let update = counter.record();
            if update.milestone {
                info!("Downloaded: {}/{}", update.completed, update.total);
            }
            if let Some(tx) = &self.progress_tx {
                if tx.send(update).await.is_err() {
                    debug!("Progress display went away");
                }
            }
        }

        let mut failures = Vec::new();
        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(report) => {
                    summary.requests += report.requests;
                    failures.extend(report.failures);
                }
                Err(e) => {
                    error!("Worker {} terminated: {}", worker_id, e);
                    failures.push((usize::MAX, DownloadError::WorkerPanic { worker_id }));
                }
            }
        }

        if failures.is_empty() {
            info!(
                "Download complete: {} fetched, {} already present, {} requests",
                summary.downloaded, summary.skipped, summary.requests
            );
            return Ok(summary);
        }

        failures.sort_by_key(|(ordinal, _)| *ordinal);
        let failed = failures.len();
        let (ordinal, first) = failures.remove(0);
        error!(
            "{} of {} pages failed; first failure on page {}",
            failed, total, ordinal
        );
        Err(first)
    }
}
