//! Error types for Gallica Fetcher
//!
//! Errors are grouped by pipeline stage and aggregated into [`AppError`].
//! Every variant is fatal for the run once it reaches the top level; transient
//! HTTP conditions are absorbed by the download retry loop before they get here.

use std::path::PathBuf;
use thiserror::Error;

/// Missing, conflicting or invalid configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither a locator nor a bare identifier was supplied
    #[error("A document is required: pass --url <gallica url> or --ark <identifier>")]
    MissingSource,

    /// Both a locator and a bare identifier were supplied
    #[error("Pass either --url or --ark, not both")]
    ConflictingSources,

    /// Bare identifier is blank after trimming
    #[error("Document identifier is empty")]
    EmptyIdentifier,

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Explicit configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),
}

/// Identifier extraction errors
#[derive(Error, Debug)]
pub enum IdentifierError {
    /// The locator carries no `/ark:/12148/<id>` segment
    #[error("Cannot extract an ARK identifier from '{locator}' (expected .../ark:/12148/<id>...)")]
    NotExtractable { locator: String },
}

/// Manifest discovery and structure errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// HTTP transport error
    #[error("HTTP request failed while fetching manifest")]
    Http(#[from] reqwest::Error),

    /// Server answered with an error status
    #[error("Manifest request to {url} failed with HTTP {status}")]
    Status { status: u16, url: String },

    /// Body is not valid JSON
    #[error("Manifest at {url} is not valid JSON")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Viewer page carries no manifest link
    #[error("No manifest link found in viewer page {url}")]
    NoManifestLink { url: String },

    /// Direct fetch, warm-up retries and HTML scraping all failed
    #[error(
        "IIIF manifest for {ark} is unreachable (HTTP 403) and no alternative manifest was found in the viewer page.\n\
         Try again from another network, or open the document once in a browser and rerun."
    )]
    Unreachable { ark: String },

    /// Manifest lists no pages
    #[error("No pages found in manifest (unexpected structure)")]
    NoCanvases,

    /// A canvas carries no image service
    #[error("No IIIF image service found for page {ordinal} (unexpected structure)")]
    NoImageService { ordinal: usize },
}

/// Page download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Non-retryable error status
    #[error("Server answered HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Retry budget exhausted
    #[error("Download failed after {attempts} attempts: {url}")]
    MaxRetriesExceeded { attempts: u32, url: String },

    /// Worker task panicked or was cancelled
    #[error("Download worker {worker_id} terminated unexpectedly")]
    WorkerPanic { worker_id: usize },

    /// Invalid engine configuration
    #[error("Invalid download configuration: {0}")]
    ConfigurationError(String),
}

/// PDF assembly errors
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// No assembly strategy compiled in
    #[error(
        "Cannot assemble the PDF: no assembly strategy is available.\n\
         Rebuild with the 'jpeg-passthrough' feature (direct JPEG embedding) \
         or the 'raster' feature (decode and re-embed), e.g.\n  \
         cargo install gallica_fetcher --features jpeg-passthrough,raster"
    )]
    Unavailable,

    /// Expected page image missing before assembly
    #[error("{missing} page image(s) missing (e.g. {path}). Run again to fetch them")]
    MissingPage { path: PathBuf, missing: usize },

    /// Empty input
    #[error("No page images to assemble")]
    NoPages,

    /// Page image is not usable by the strategy
    #[error("Unsupported page image {path}: {reason}")]
    UnsupportedImage { path: PathBuf, reason: String },

    /// PDF serialization error
    #[error("PDF generation failed")]
    Pdf(#[from] lopdf::Error),

    /// Image decoding error
    #[error("Image decoding failed")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("File I/O error during assembly")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Identifier error
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Assembly error
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Identifier(_) => "identifier",
            AppError::Manifest(_) => "manifest",
            AppError::Download(_) => "download",
            AppError::Assembly(_) => "assembly",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }

    /// Process exit status for this error
    ///
    /// Pre-flight failures (configuration, identifier parsing) exit with 2,
    /// everything raised once the pipeline is running exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Identifier(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Assembly result type alias
pub type AssemblyResult<T> = std::result::Result<T, AssemblyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::from(ConfigError::MissingSource).exit_code(), 2);
        let parse = IdentifierError::NotExtractable {
            locator: "https://example.org".to_string(),
        };
        assert_eq!(AppError::from(parse).exit_code(), 2);
        assert_eq!(AppError::from(ManifestError::NoCanvases).exit_code(), 1);
        assert_eq!(AppError::from(AssemblyError::Unavailable).exit_code(), 1);
    }

    #[test]
    fn test_categories() {
        let err = AppError::from(DownloadError::MaxRetriesExceeded {
            attempts: 8,
            url: "https://example.org/x.jpg".to_string(),
        });
        assert_eq!(err.category(), "download");
        assert_eq!(AppError::generic("boom").category(), "generic");
    }

    #[test]
    fn test_messages_carry_context() {
        let err = ManifestError::Unreachable {
            ark: "bd6t54208770t".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("bd6t54208770t"));
        assert!(message.contains("another network"));

        let err = AssemblyError::MissingPage {
            path: PathBuf::from("gallica_x/images/page_0002.jpg"),
            missing: 3,
        };
        assert!(err.to_string().contains("page_0002.jpg"));

        let unavailable = AssemblyError::Unavailable.to_string();
        assert!(unavailable.contains("jpeg-passthrough"));
        assert!(unavailable.contains("raster"));
    }
}
