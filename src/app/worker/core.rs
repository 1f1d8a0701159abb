//! Core download worker implementation
//!
//! A worker owns its own session, pulls jobs from the shared queue until it
//! is empty and streams each page to a temporary file that is renamed into
//! place only once complete. A failed job never stops the worker.

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::config::WorkerConfig;
use super::pool::JobQueue;
use super::retry::{RetryPolicy, RetryState};
use super::types::{JobStatus, WorkerProgress, WorkerReport};
use crate::app::client::Session;
use crate::app::models::DownloadJob;
use crate::app::workspace::{is_page_complete, partial_path};
use crate::errors::{DownloadError, DownloadResult};

/// Individual download worker
#[derive(Debug)]
pub struct DownloadWorker {
    id: usize,
    session: Session,
    config: Arc<WorkerConfig>,
    queue: Arc<JobQueue>,
    progress_tx: mpsc::Sender<WorkerProgress>,
    report: WorkerReport,
}

impl DownloadWorker {
    pub fn new(
        id: usize,
        session: Session,
        config: Arc<WorkerConfig>,
        queue: Arc<JobQueue>,
        progress_tx: mpsc::Sender<WorkerProgress>,
    ) -> Self {
        Self {
            id,
            session,
            config,
            queue,
            progress_tx,
            report: WorkerReport::default(),
        }
    }

    /// Drain the queue, returning request count and failed jobs
    pub async fn run(mut self) -> WorkerReport {
        debug!("Worker {} starting", self.id);

        while let Some(job) = self.queue.pop().await {
            let status = match self.process(&job).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("Page {} failed: {}", job.ordinal, e);
                    remove_partial(&job.destination).await;
                    let reason = e.to_string();
                    self.report.failures.push((job.ordinal, e));
                    JobStatus::Failed { reason }
                }
            };

            let progress = WorkerProgress {
                worker_id: self.id,
                ordinal: job.ordinal,
                status,
            };
            if self.progress_tx.send(progress).await.is_err() {
                debug!("Worker {} progress channel closed", self.id);
            }
        }

        debug!(
            "Worker {} finished after {} requests",
            self.id, self.report.requests
        );
        self.report
    }

    /// Fetch one page unless it is already complete on disk
    async fn process(&mut self, job: &DownloadJob) -> DownloadResult<JobStatus> {
        if is_page_complete(&job.destination, self.config.min_page_bytes) {
            debug!("Page {} already present, skipping", job.ordinal);
            return Ok(JobStatus::Skipped);
        }

        let policy = self.config.retry.clone();
        let mut stored = 0u64;
        let mut state = RetryState::start();

        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    self.report.requests += 1;
                    let response = self.session.get(&job.url).await?;
                    let status = response.status();

                    if status == StatusCode::OK {
                        stored = write_atomically(response, &job.destination).await?;
                        RetryState::Succeeded { attempts: attempt }
                    } else if RetryPolicy::is_retryable(status) {
                        debug!(
                            "Page {} throttled (HTTP {}) on attempt {}",
                            job.ordinal,
                            status.as_u16(),
                            attempt
                        );
                        RetryState::after_retryable(attempt, &policy)
                    } else {
                        return Err(DownloadError::Status {
                            status: status.as_u16(),
                            url: job.url.clone(),
                        });
                    }
                }

                RetryState::Backoff { attempt, wait } => {
                    debug!("Page {} retrying in {:?}", job.ordinal, wait);
                    tokio::time::sleep(wait).await;
                    RetryState::after_backoff(attempt)
                }

                RetryState::Succeeded { attempts } => {
                    if attempts > 1 {
                        info!("Page {} downloaded after {} attempts", job.ordinal, attempts);
                    }
                    if !self.config.pause_after_download.is_zero() {
                        tokio::time::sleep(self.config.pause_after_download).await;
                    }
                    return Ok(JobStatus::Downloaded {
                        bytes: stored,
                        attempts,
                    });
                }

                RetryState::Failed { attempts } => {
                    return Err(DownloadError::MaxRetriesExceeded {
                        attempts,
                        url: job.url.clone(),
                    });
                }
            };
        }
    }
}

/// Stream the body into `<destination>.part`, then rename it into place
async fn write_atomically(
    response: reqwest::Response,
    destination: &Path,
) -> DownloadResult<u64> {
    let temp_path = partial_path(destination);
    let mut file = tokio::fs::File::create(&temp_path).await?;
    let mut written = 0u64;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&temp_path, destination)
        .await
        .map_err(|_| DownloadError::AtomicOperationFailed {
            temp_path: temp_path.clone(),
            final_path: destination.to_path_buf(),
        })?;

    Ok(written)
}

async fn remove_partial(destination: &Path) {
    let temp_path = partial_path(destination);
    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("Could not remove {}: {}", temp_path.display(), e);
        }
    }
}
