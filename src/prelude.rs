//! Prelude module for Gallica Fetcher Library
//!
//! Re-exports the items needed for typical library use with a single
//! `use gallica_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gallica_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let id = DocumentId::from_bare("bd6t54208770t")?;
//!     let config = FetchConfig {
//!         max_width: 1200,
//!         ..FetchConfig::for_document(id)
//!     };
//!
//!     let outcome = Coordinator::new(config).run().await?;
//!     println!("{}", outcome.output.display());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    ClientConfig, Coordinator, CookieSnapshot, DocumentId, DownloadEngine, DownloadJob,
    DownloadSummary, FetchConfig, FetchOutcome, Manifest, ManifestConfig, ManifestResolver,
    PdfAssembler, RetryPolicy, WorkerConfig, Workspace,
};

pub use crate::config::AppConfig;
