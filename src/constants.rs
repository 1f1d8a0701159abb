//! Application constants for Gallica Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Browser-like user agent; the archive rejects obvious bot agents
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
         AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

    /// Accept header sent with every request
    pub const ACCEPT: &str = "*/*";

    /// Accept-Language header sent with every request
    pub const ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en;q=0.8";

    /// Per-request timeout ceiling
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 50;
}

/// Gallica archive URLs and path fragments
pub mod archive {
    /// Public site of the archive
    pub const BASE_URL: &str = "https://gallica.bnf.fr";

    /// ARK naming authority prefix used by the archive
    pub const ARK_PREFIX: &str = "ark:/12148";

    /// IIIF Presentation API path segment
    pub const IIIF_PATH: &str = "iiif";

    /// Manifest file name under a document's IIIF path
    pub const MANIFEST_FILE: &str = "manifest.json";

    /// Viewer page suffix for the first folio
    pub const FIRST_FOLIO: &str = "f1.item";
}

/// Retry and backoff configuration
pub mod limits {
    use super::Duration;

    /// Maximum attempts per page download
    pub const MAX_ATTEMPTS: u32 = 8;

    /// Base delay for exponential backoff
    pub const BASE_BACKOFF: Duration = Duration::from_millis(600);

    /// Upper bound for any single backoff wait
    pub const MAX_BACKOFF: Duration = Duration::from_secs(12);

    /// Upper bound (exclusive) of the random jitter added to each wait
    pub const BACKOFF_JITTER: Duration = Duration::from_millis(350);

    /// HTTP statuses that are retried with backoff
    pub const RETRYABLE_STATUSES: [u16; 3] = [403, 429, 503];

    /// Warm-up rounds attempted after the direct manifest fetch is refused
    pub const WARMUP_ROUNDS: u32 = 3;

    /// Delay multiplied by the round number before each warm-up round
    pub const WARMUP_BASE_DELAY: Duration = Duration::from_millis(700);
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".part";

    /// Workspace subdirectory holding page images
    pub const IMAGES_DIR: &str = "images";

    /// Prefix of page image file names
    pub const PAGE_FILE_PREFIX: &str = "page_";

    /// Extension of page image files
    pub const PAGE_FILE_EXTENSION: &str = "jpg";

    /// Pages at or below this size are considered incomplete
    pub const MIN_PAGE_BYTES: u64 = 50_000;

    /// Prefix of the default workspace directory name
    pub const WORKSPACE_PREFIX: &str = "gallica_";

    /// Extension of the assembled document
    pub const OUTPUT_EXTENSION: &str = "pdf";
}

/// Worker and concurrency configuration
pub mod workers {
    /// Default number of download workers
    pub const DEFAULT_WORKER_COUNT: usize = 4;

    /// Default requested image width
    pub const DEFAULT_MAX_WIDTH: u32 = 2000;

    /// Channel buffer size for worker progress reports
    pub const CHANNEL_BUFFER_SIZE: usize = 100;
}

/// Progress reporting
pub mod progress {
    /// Completions between two progress reports
    pub const REPORT_EVERY: usize = 25;
}

/// Configuration file lookup
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_FILE: &str = "gallica-fetcher.toml";

    /// Directory under the user config dir
    pub const APP_DIR: &str = "gallica-fetcher";

    /// Configuration file name under the user config dir
    pub const FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use archive::BASE_URL as ARCHIVE_BASE_URL;
pub use files::{MIN_PAGE_BYTES, TEMP_FILE_SUFFIX};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::MAX_ATTEMPTS;
pub use workers::{DEFAULT_MAX_WIDTH, DEFAULT_WORKER_COUNT};
