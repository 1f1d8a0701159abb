//! Command-line argument parsing for Gallica Fetcher
//!
//! A single command: name a document by URL or ARK identifier, tune the
//! download, and get one PDF back.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::errors::{ConfigError, ConfigResult};

/// Gallica Fetcher - download a Gallica document as a PDF
#[derive(Parser, Debug)]
#[command(
    name = "gallica_fetcher",
    version,
    about = "Download a Gallica (BnF) document through IIIF and assemble it into a PDF",
    long_about = "Resolves the IIIF manifest of a Gallica document, downloads every page image \
in parallel with retry and backoff, and assembles the pages into a single PDF.
Interrupted runs resume: pages already on disk are not fetched again."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Document and download options
    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Logging and configuration options
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments selecting the document and shaping the run
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Gallica document URL, e.g. https://gallica.bnf.fr/ark:/12148/bd6t54208770t
    #[arg(long, value_name = "URL", conflicts_with = "ark")]
    pub url: Option<String>,

    /// Bare ARK identifier, e.g. bd6t54208770t
    #[arg(long, value_name = "ID")]
    pub ark: Option<String>,

    /// Requested page width in pixels [default: 2000]
    #[arg(long, value_name = "N")]
    pub max_width: Option<u32>,

    /// Number of parallel download workers [default: 4]
    #[arg(short = 'w', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Pause in seconds after each downloaded page [default: 0]
    #[arg(long, value_name = "SECONDS")]
    pub sleep: Option<f64>,

    /// Output PDF path [default: <id>.pdf]
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Working directory for page images [default: gallica_<id>]
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Keep the working directory after a successful run
    #[arg(long)]
    pub keep: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level from the verbosity flags, if any was given
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl FetchArgs {
    /// Reject values clap cannot check on its own
    pub fn validate(&self) -> ConfigResult<()> {
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "--workers".to_string(),
                value: "0".to_string(),
                reason: "At least one worker is required".to_string(),
            });
        }

        if self.max_width == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "--max-width".to_string(),
                value: "0".to_string(),
                reason: "Width must be greater than zero".to_string(),
            });
        }

        if let Some(sleep) = self.sleep {
            if !sleep.is_finite() || sleep < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "--sleep".to_string(),
                    value: sleep.to_string(),
                    reason: "Expected a non-negative number of seconds".to_string(),
                });
            }
        }

        Ok(())
    }
}
