//! End-to-end orchestration of one document fetch
//!
//! The coordinator runs the pipeline in order: session warm-up, manifest
//! discovery, job planning against the workspace, parallel download and PDF
//! assembly. Progress is published as [`PipelineEvent`]s for the CLI to
//! render; the coordinator itself never prints.
//!
//! # Examples
//!
//! ```rust,no_run
//! use gallica_fetcher::app::coordinator::{Coordinator, FetchConfig};
//! use gallica_fetcher::app::models::DocumentId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let id = DocumentId::from_bare("bd6t54208770t")?;
//! let coordinator = Coordinator::new(FetchConfig::for_document(id));
//!
//! let outcome = coordinator.run().await?;
//! println!("Wrote {} pages to {}", outcome.pages, outcome.output.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::assembler::{AssemblyReport, PdfAssembler};
use crate::app::client::{ClientConfig, CookieSnapshot, Session};
use crate::app::manifest::{ManifestConfig, ManifestResolver};
use crate::app::models::{DocumentId, DownloadJob};
use crate::app::worker::{DownloadEngine, DownloadProgress, DownloadSummary, WorkerConfig};
use crate::app::workspace::{is_page_complete, Workspace};
use crate::constants::{files, workers};
use crate::errors::{AppError, ManifestError, Result};

pub mod signals;

pub use signals::{wait_for_shutdown, ShutdownSignal};

/// Everything one run needs to know
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub id: DocumentId,
    /// Requested page width in pixels
    pub max_width: u32,
    pub workspace: Workspace,
    /// Final PDF location
    pub output: PathBuf,
    pub client: ClientConfig,
    pub worker: WorkerConfig,
    pub manifest: ManifestConfig,
}

impl FetchConfig {
    /// Defaults for `id`: `gallica_<id>/` workspace and `<id>.pdf` output
    pub fn for_document(id: DocumentId) -> Self {
        Self {
            max_width: workers::DEFAULT_MAX_WIDTH,
            workspace: Workspace::new(Workspace::default_root(&id)),
            output: default_output(&id),
            client: ClientConfig::default(),
            worker: WorkerConfig::default(),
            manifest: ManifestConfig::default(),
            id,
        }
    }
}

/// Default output file: `<id>.pdf` in the current directory
pub fn default_output(id: &DocumentId) -> PathBuf {
    PathBuf::from(format!("{}.{}", id, files::OUTPUT_EXTENSION))
}

/// Pipeline milestones, in the order they happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    WarmingUp,
    /// Warm-up failed; discovery continues anyway
    WarmupFailed { reason: String },
    ResolvingManifest,
    ManifestResolved { label: Option<String>, pages: usize },
    Planned { to_download: usize, present: usize },
    Download(DownloadProgress),
    Assembling { output: PathBuf },
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub output: PathBuf,
    pub pages: usize,
    pub label: Option<String>,
    pub download: DownloadSummary,
    pub assembly: AssemblyReport,
}

/// Drives one document from identifier to PDF
#[derive(Debug)]
pub struct Coordinator {
    config: FetchConfig,
    events: Option<mpsc::Sender<PipelineEvent>>,
}

impl Coordinator {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            events: None,
        }
    }

    /// Publish pipeline milestones on `events`
    pub fn with_events(mut self, events: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Run the whole pipeline
    ///
    /// # Errors
    ///
    /// Any manifest, download or assembly failure; nothing is written to
    /// the output path unless assembly completes.
    pub async fn run(&self) -> Result<FetchOutcome> {
        let config = &self.config;
        let assembler = PdfAssembler::new()?;
        let session = config.client.build_session(&CookieSnapshot::default())?;
        let resolver = ManifestResolver::new(&session, config.manifest.clone());

        self.emit(PipelineEvent::WarmingUp).await;
        if let Err(e) = resolver.warmup(&config.id).await {
            warn!("Session warm-up failed: {}", e);
            self.emit(PipelineEvent::WarmupFailed {
                reason: e.to_string(),
            })
            .await;
        }

        self.emit(PipelineEvent::ResolvingManifest).await;
        let manifest = resolver.resolve(&config.id).await?;
        let canvases = manifest.canvases();
        if canvases.is_empty() {
            return Err(ManifestError::NoCanvases.into());
        }
        let label = manifest.label().map(str::to_string);
        info!(
            "Manifest ({}) lists {} pages{}",
            manifest.schema(),
            canvases.len(),
            label
                .as_deref()
                .map(|l| format!(": {}", l))
                .unwrap_or_default()
        );
        self.emit(PipelineEvent::ManifestResolved {
            label: label.clone(),
            pages: canvases.len(),
        })
        .await;

        config.workspace.prepare().await?;
        let mut jobs = Vec::new();
        for canvas in &canvases {
            let destination = config.workspace.page_path(canvas.ordinal);
            if is_page_complete(&destination, config.worker.min_page_bytes) {
                continue;
            }
            let service = canvas.image_service()?;
            jobs.push(DownloadJob::new(
                canvas.ordinal,
                service.image_url(config.max_width),
                destination,
            ));
        }
        let present = canvases.len() - jobs.len();
        debug!("{} pages to fetch, {} already present", jobs.len(), present);
        self.emit(PipelineEvent::Planned {
            to_download: jobs.len(),
            present,
        })
        .await;

        let download = if jobs.is_empty() {
            DownloadSummary {
                skipped: present,
                ..Default::default()
            }
        } else {
            let mut summary = self.download(jobs, &session).await?;
            summary.skipped += present;
            summary
        };

        let pages = config.workspace.ensure_complete(canvases.len())?;
        self.emit(PipelineEvent::Assembling {
            output: config.output.clone(),
        })
        .await;

        let output = config.output.clone();
        let page_count = pages.len();
        let assembly = tokio::task::spawn_blocking(move || assembler.assemble(&pages, &output))
            .await
            .map_err(|e| AppError::generic(format!("PDF assembly task failed: {}", e)))??;

        Ok(FetchOutcome {
            output: config.output.clone(),
            pages: page_count,
            label,
            download,
            assembly,
        })
    }

    /// Hand the jobs to the engine, forwarding its progress as events
    async fn download(
        &self,
        jobs: Vec<DownloadJob>,
        session: &Session,
    ) -> Result<DownloadSummary> {
        let cookies = session.cookie_snapshot();
        debug!("Sharing {} session cookies with workers", cookies.len());

        let mut engine =
            DownloadEngine::new(self.config.worker.clone(), self.config.client.clone())?;
        let forwarder = match &self.events {
            Some(events) => {
                let (progress_tx, mut progress_rx) =
                    mpsc::channel(self.config.worker.progress_buffer_size);
                engine = engine.with_progress(progress_tx);
                let events = events.clone();
                Some(tokio::spawn(async move {
                    while let Some(progress) = progress_rx.recv().await {
                        if events.send(PipelineEvent::Download(progress)).await.is_err() {
                            break;
                        }
                    }
                }))
            }
            None => None,
        };

        let result = engine.run(jobs, &cookies).await;
        drop(engine);
        if let Some(forwarder) = forwarder {
            let _ = forwarder.await;
        }
        Ok(result?)
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(events) = &self.events {
            if events.send(event).await.is_err() {
                debug!("Pipeline event receiver dropped");
            }
        }
    }
}
