//! Worker configuration management
//!
//! Download engine settings with validation and a small builder, so tests can
//! shrink delays without touching the production defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;
use crate::constants::{files, progress, workers};
use crate::errors::{DownloadError, DownloadResult};

/// Configuration for the download engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent workers to spawn
    pub worker_count: usize,
    /// Pause after each successful page download
    #[serde(with = "humantime_serde")]
    pub pause_after_download: Duration,
    /// Pages at or below this size are fetched again
    pub min_page_bytes: u64,
    /// Retry budget and backoff timings
    pub retry: RetryPolicy,
    /// Channel buffer size for progress reporting
    pub progress_buffer_size: usize,
    /// Completions between two progress reports
    pub report_every: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            pause_after_download: Duration::ZERO,
            min_page_bytes: files::MIN_PAGE_BYTES,
            retry: RetryPolicy::default(),
            progress_buffer_size: workers::CHANNEL_BUFFER_SIZE,
            report_every: progress::REPORT_EVERY,
        }
    }
}

impl WorkerConfig {
    /// Validate configuration values and return errors for invalid settings
    pub fn validate(&self) -> DownloadResult<()> {
        if self.worker_count == 0 {
            return Err(DownloadError::ConfigurationError(
                "Worker count cannot be zero".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(DownloadError::ConfigurationError(
                "At least one download attempt is required".to_string(),
            ));
        }

        if self.retry.base_delay > self.retry.max_delay {
            return Err(DownloadError::ConfigurationError(format!(
                "Retry base delay ({:?}) exceeds max delay ({:?})",
                self.retry.base_delay, self.retry.max_delay
            )));
        }

        if self.progress_buffer_size == 0 || self.report_every == 0 {
            return Err(DownloadError::ConfigurationError(
                "Progress buffer size and report interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for WorkerConfig
#[derive(Debug, Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    pub fn pause_after_download(mut self, pause: Duration) -> Self {
        self.config.pause_after_download = pause;
        self
    }

    pub fn min_page_bytes(mut self, bytes: u64) -> Self {
        self.config.min_page_bytes = bytes;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn report_every(mut self, every: usize) -> Self {
        self.config.report_every = every;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> DownloadResult<WorkerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
