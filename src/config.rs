//! Configuration management for Gallica Fetcher
//!
//! Settings come from, in increasing precedence: built-in defaults, the first
//! TOML file found, and command-line flags. Durations are written the
//! `humantime` way (`"600ms"`, `"12s"`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::client::{Archive, ClientConfig};
use crate::app::manifest::ManifestConfig;
use crate::app::worker::{RetryPolicy, WorkerConfig};
use crate::constants::{self, archive, files, http, limits, progress, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Page download settings
    pub download: DownloadConfigToml,
    /// Manifest discovery settings
    pub manifest: ManifestConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Archive origin; point at a mock server for offline runs
    pub base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout (None = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            base_url: archive::BASE_URL.to_string(),
            user_agent: http::USER_AGENT.to_string(),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfigToml {
    pub fn to_runtime_config(&self) -> ConfigResult<ClientConfig> {
        Ok(ClientConfig {
            archive: Archive::new(&self.base_url)?,
            user_agent: self.user_agent.clone(),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout,
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
        })
    }
}

/// TOML-friendly download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfigToml {
    /// Number of concurrent workers
    pub workers: usize,
    /// Requested page width in pixels
    pub max_width: u32,
    /// Pause after each successful page
    #[serde(with = "humantime_serde")]
    pub pause: Duration,
    /// Pages at or below this size are fetched again
    pub min_page_bytes: u64,
    /// Completions between two progress reports
    pub report_every: usize,
    /// Retry budget and backoff timings
    pub retry: RetryPolicy,
}

impl Default for DownloadConfigToml {
    fn default() -> Self {
        Self {
            workers: workers::DEFAULT_WORKER_COUNT,
            max_width: workers::DEFAULT_MAX_WIDTH,
            pause: Duration::ZERO,
            min_page_bytes: files::MIN_PAGE_BYTES,
            report_every: progress::REPORT_EVERY,
            retry: RetryPolicy::default(),
        }
    }
}

impl DownloadConfigToml {
    pub fn to_runtime_config(&self) -> WorkerConfig {
        WorkerConfig {
            worker_count: self.workers,
            pause_after_download: self.pause,
            min_page_bytes: self.min_page_bytes,
            retry: self.retry.clone(),
            progress_buffer_size: workers::CHANNEL_BUFFER_SIZE,
            report_every: self.report_every,
        }
    }
}

/// TOML-friendly manifest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfigToml {
    /// Warm-up rounds after the direct fetch is refused
    pub warmup_rounds: u32,
    /// Delay multiplied by the round number before each round
    #[serde(with = "humantime_serde")]
    pub warmup_base_delay: Duration,
}

impl Default for ManifestConfigToml {
    fn default() -> Self {
        Self {
            warmup_rounds: limits::WARMUP_ROUNDS,
            warmup_base_delay: limits::WARMUP_BASE_DELAY,
        }
    }
}

impl ManifestConfigToml {
    pub fn to_runtime_config(&self) -> ManifestConfig {
        ManifestConfig {
            warmup_rounds: self.warmup_rounds,
            warmup_base_delay: self.warmup_base_delay,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the first file found
    ///
    /// 1. `config_file_override` (must exist)
    /// 2. `./gallica-fetcher.toml`
    /// 3. `<user config dir>/gallica-fetcher/config.toml`
    /// 4. built-in defaults
    pub async fn load(config_file_override: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = config_file_override {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::load_from_file(path).await;
        }

        match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No config file found in standard locations");
                Ok(Self::default())
            }
        }
    }

    /// Candidate files in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(constants::config::LOCAL_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(
                config_dir
                    .join(constants::config::APP_DIR)
                    .join(constants::config::FILE_NAME),
            );
        }
        paths
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.exists())
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        debug!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Convert to the runtime configurations of client, engine and resolver
    pub fn to_runtime_config(&self) -> ConfigResult<(ClientConfig, WorkerConfig, ManifestConfig)> {
        Ok((
            self.client.to_runtime_config()?,
            self.download.to_runtime_config(),
            self.manifest.to_runtime_config(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.download.workers, 4);
        assert_eq!(config.download.max_width, 2000);
        assert_eq!(config.download.retry.max_attempts, 8);
        assert_eq!(config.manifest.warmup_rounds, 3);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.client.base_url, "https://gallica.bnf.fr");
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(&config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("gallica.toml");
        let content = r#"
[client]
base_url = "http://127.0.0.1:8080"

[download]
workers = 2
pause = "250ms"

[download.retry]
max_attempts = 3
base_delay = "10ms"

[manifest]
warmup_base_delay = "5ms"

[logging]
level = "debug"
"#;
        tokio::fs::write(&config_path, content).await.unwrap();

        let config = AppConfig::load(Some(&config_path)).await.unwrap();
        assert_eq!(config.download.workers, 2);
        assert_eq!(config.download.pause, Duration::from_millis(250));
        assert_eq!(config.download.retry.max_attempts, 3);
        assert_eq!(config.download.retry.max_delay, Duration::from_secs(12));
        assert_eq!(config.download.max_width, 2000);
        assert_eq!(config.manifest.warmup_rounds, 3);
        assert_eq!(config.logging.level, "debug");

        let (client, worker, manifest) = config.to_runtime_config().unwrap();
        assert_eq!(client.archive.origin(), "http://127.0.0.1:8080");
        assert_eq!(worker.worker_count, 2);
        assert_eq!(manifest.warmup_base_delay, Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_invalid_toml_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        tokio::fs::write(&config_path, "[download\nworkers = ")
            .await
            .unwrap();

        let result = AppConfig::load(Some(&config_path)).await;
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = AppConfig {
            client: ClientConfigToml {
                base_url: "ftp://example.org".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.to_runtime_config(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_local_file_searched_first() {
        let paths = AppConfig::search_paths();
        assert_eq!(paths[0], PathBuf::from("gallica-fetcher.toml"));
    }
}
