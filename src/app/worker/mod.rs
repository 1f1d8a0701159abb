//! Parallel page download engine
//!
//! Workers pull jobs from a shared queue, skip pages already complete on
//! disk, and retry throttled requests (HTTP 403, 429, 503) with bounded
//! exponential backoff. Page files appear only once fully written.
//!
//! # Module Organization
//!
//! - [`config`] - Engine configuration with validation
//! - [`retry`] - Backoff policy and the per-job retry state machine
//! - [`types`] - Progress events and run summaries
//! - [`core`] - Individual worker implementation with download logic
//! - [`pool`] - Job queue and the engine driving the workers
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use gallica_fetcher::app::client::{ClientConfig, CookieSnapshot};
//! use gallica_fetcher::app::models::DownloadJob;
//! use gallica_fetcher::app::worker::{DownloadEngine, WorkerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(WorkerConfig::default(), ClientConfig::default())?;
//! let jobs = vec![DownloadJob::new(
//!     1,
//!     "https://gallica.bnf.fr/iiif/ark:/12148/bd6t54208770t/f1/full/2000,/0/default.jpg",
//!     "gallica_bd6t54208770t/images/page_0001.jpg",
//! )];
//!
//! let summary = engine.run(jobs, &CookieSnapshot::default()).await?;
//! println!("{} pages fetched", summary.downloaded);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod pool;
pub mod retry;
pub mod types;

pub use config::{WorkerConfig, WorkerConfigBuilder};
pub use core::DownloadWorker;
pub use pool::{DownloadEngine, JobQueue};
pub use retry::{RetryPolicy, RetryState};
pub use types::{
    CompletionCounter, DownloadProgress, DownloadSummary, JobStatus, WorkerProgress, WorkerReport,
};
