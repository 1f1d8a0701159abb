//! Core application logic for Gallica Fetcher
//!
//! This module contains the HTTP sessions, document models, manifest
//! discovery, the download engine, PDF assembly, workspace handling and the
//! coordinator that ties them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use gallica_fetcher::app::{Coordinator, DocumentId, FetchConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let id = DocumentId::from_locator("https://gallica.bnf.fr/ark:/12148/bd6t54208770t")?;
//!
//! let outcome = Coordinator::new(FetchConfig::for_document(id)).run().await?;
//! println!("{} pages written to {}", outcome.pages, outcome.output.display());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod client;
pub mod coordinator;
pub mod manifest;
pub mod models;
pub mod worker;
pub mod workspace;

// Re-export main public API
pub use assembler::{AssemblyReport, PdfAssembler, Strategy};
pub use client::{Archive, ClientConfig, CookieSnapshot, Session};
pub use coordinator::{Coordinator, FetchConfig, FetchOutcome, PipelineEvent};
pub use manifest::{Manifest, ManifestConfig, ManifestResolver};
pub use models::{DocumentId, DownloadJob};
pub use worker::{DownloadEngine, DownloadSummary, RetryPolicy, WorkerConfig};
pub use workspace::{safe_remove, CleanupOutcome, Workspace};
