//! HTTP sessions for Gallica archive interaction
//!
//! The module is organized into specialized components:
//! - `archive`: endpoint layout of the remote archive
//! - `config`: session configuration and building
//! - `cookies`: cookie snapshots copied from the master session into workers
//!
//! One master [`Session`] performs discovery (warm-up, manifest). Download
//! workers each build their own session from a [`CookieSnapshot`] of it.

use std::sync::Arc;

use reqwest::{Client, Response};

pub mod archive;
pub mod config;
pub mod cookies;

pub use archive::Archive;
pub use config::ClientConfig;
pub use cookies::{CookieSnapshot, SessionJar};

/// A configured HTTP client together with the cookie jar it writes to
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    jar: Arc<SessionJar>,
    archive: Archive,
}

impl Session {
    pub(crate) fn new(client: Client, jar: Arc<SessionJar>, archive: Archive) -> Self {
        Self {
            client,
            jar,
            archive,
        }
    }

    /// Issue a GET request; the status is left for the caller to interpret
    pub async fn get(&self, url: &str) -> reqwest::Result<Response> {
        self.client.get(url).send().await
    }

    /// Copy of every cookie accumulated so far, on any path or host
    pub fn cookie_snapshot(&self) -> CookieSnapshot {
        self.jar.snapshot()
    }

    /// Archive this session talks to
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}
