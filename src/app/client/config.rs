//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of sessions
//! tuned for the Gallica archive: browser identity headers, a large keep-alive
//! pool and no transport-level retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;

use super::archive::Archive;
use super::cookies::{CookieSnapshot, SessionJar};
use super::Session;
use crate::constants::http;
use crate::errors::{DownloadError, DownloadResult};

/// Configuration for HTTP sessions
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote archive location
    pub archive: Archive,
    /// User agent sent with every request
    pub user_agent: String,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            archive: Archive::default(),
            user_agent: http::USER_AGENT.to_string(),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Identity headers presented to the archive
    fn default_headers(&self) -> DownloadResult<HeaderMap> {
        let value = |name: &str, raw: &str| {
            HeaderValue::from_str(raw).map_err(|e| {
                DownloadError::ConfigurationError(format!("invalid {} header '{}': {}", name, raw, e))
            })
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, value("Accept", http::ACCEPT)?);
        headers.insert(
            header::ACCEPT_LANGUAGE,
            value("Accept-Language", http::ACCEPT_LANGUAGE)?,
        );
        headers.insert(header::REFERER, value("Referer", &self.archive.referer())?);
        headers.insert(header::ORIGIN, value("Origin", &self.archive.origin())?);
        Ok(headers)
    }

    /// Builds the HTTP client around the given cookie jar
    ///
    /// reqwest never retries on its own; every retry in this crate is explicit.
    pub fn build_http_client(&self, jar: Arc<SessionJar>) -> DownloadResult<Client> {
        let mut client_builder = Client::builder()
            .cookie_provider(jar)
            .default_headers(self.default_headers()?)
            .user_agent(self.user_agent.as_str())
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(DownloadError::Http)
    }

    /// Builds a session whose jar starts as a copy of `cookies`
    pub fn build_session(&self, cookies: &CookieSnapshot) -> DownloadResult<Session> {
        let jar = Arc::new(SessionJar::seeded(cookies, self.archive.cookie_url()));
        let client = self.build_http_client(jar.clone())?;
        Ok(Session::new(client, jar, self.archive.clone()))
    }
}
