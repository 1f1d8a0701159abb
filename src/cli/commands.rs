//! Command handler for Gallica Fetcher
//!
//! Turns parsed arguments and file configuration into a [`FetchConfig`],
//! runs the coordinator with a progress display attached and cleans up the
//! workspace afterwards.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::coordinator::{default_output, Coordinator, FetchConfig};
use crate::app::models::DocumentId;
use crate::app::workspace::{safe_remove, CleanupOutcome, Workspace};
use crate::cli::{FetchArgs, ProgressConfig, ProgressDisplay};
use crate::config::AppConfig;
use crate::constants::workers;
use crate::errors::{ConfigError, ConfigResult, DownloadError, Result};

/// Handle a fetch from start to finish
///
/// Cleanup problems are reported but never fail the run.
pub async fn handle_fetch(args: FetchArgs, config: AppConfig, quiet: bool) -> Result<()> {
    let start_time = Instant::now();
    args.validate()?;

    let id = DocumentId::resolve(args.url.as_deref(), args.ark.as_deref())?;
    info!("Fetching document {}", id);
    let fetch = build_fetch_config(&args, &config, id)?;

    let (events_tx, events_rx) = mpsc::channel(workers::CHANNEL_BUFFER_SIZE);
    let display = ProgressDisplay::new(ProgressConfig::detect(quiet));
    let display_task = tokio::spawn(display.consume(events_rx));

    let result = Coordinator::new(fetch.clone())
        .with_events(events_tx)
        .run()
        .await;
    if let Err(e) = display_task.await {
        warn!("Progress display task failed: {}", e);
    }
    let outcome = result?;

    if !quiet {
        println!(
            "✅ PDF created: {} ({} pages, {} downloaded, {} reused)",
            outcome.output.display(),
            outcome.pages,
            outcome.download.downloaded,
            outcome.download.skipped
        );
    }
    info!(
        "Run finished in {:?} with {} image requests",
        start_time.elapsed(),
        outcome.download.requests
    );

    if args.keep {
        info!("Keeping workspace {}", fetch.workspace.root().display());
        if !quiet {
            println!("--keep: workspace kept at {}", fetch.workspace.root().display());
        }
    } else {
        cleanup(&fetch, quiet);
    }

    Ok(())
}

/// Merge command-line overrides into the file configuration
pub fn build_fetch_config(
    args: &FetchArgs,
    config: &AppConfig,
    id: DocumentId,
) -> ConfigResult<FetchConfig> {
    let (client, mut worker, manifest) = config.to_runtime_config()?;

    if let Some(workers) = args.workers {
        worker.worker_count = workers;
    }
    if let Some(sleep) = args.sleep {
        worker.pause_after_download =
            Duration::try_from_secs_f64(sleep).map_err(|e| ConfigError::InvalidValue {
                field: "--sleep".to_string(),
                value: sleep.to_string(),
                reason: e.to_string(),
            })?;
    }
    worker.validate().map_err(|e| ConfigError::InvalidValue {
        field: "[download]".to_string(),
        value: format!("workers = {}", worker.worker_count),
        reason: match e {
            DownloadError::ConfigurationError(reason) => reason,
            other => other.to_string(),
        },
    })?;

    let workspace = Workspace::new(
        args.dir
            .clone()
            .unwrap_or_else(|| Workspace::default_root(&id)),
    );
    let output = args.out.clone().unwrap_or_else(|| default_output(&id));

    Ok(FetchConfig {
        max_width: args.max_width.unwrap_or(config.download.max_width),
        workspace,
        output,
        client,
        worker,
        manifest,
        id,
    })
}

fn cleanup(fetch: &FetchConfig, quiet: bool) {
    let root = fetch.workspace.root();
    if !quiet {
        println!("5) Cleaning up {} ...", root.display());
    }

    match safe_remove(root, &fetch.id) {
        Ok(CleanupOutcome::Removed(path)) => {
            info!("Removed workspace {}", path.display());
            if !quiet {
                println!("   Workspace removed: {}", path.display());
            }
        }
        Ok(CleanupOutcome::Refused(reason)) => {
            warn!("Workspace kept: {}", reason);
            if !quiet {
                println!("⚠️  {}", reason);
            }
        }
        Err(e) => warn!("Could not remove {}: {}", root.display(), e),
    }
}
