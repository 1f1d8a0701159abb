//! Manifest discovery against an uncooperative archive
//!
//! Gallica sometimes answers 403 to direct manifest requests from clients
//! without a warmed-up session. Discovery escalates through three strategies:
//!
//! 1. direct fetch of the canonical manifest URL,
//! 2. warm-up rounds (visit the viewer page, wait, retry the direct fetch),
//! 3. scraping a manifest URL out of the viewer page HTML.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::scrape::ManifestLinkExtractor;
use super::types::{Manifest, ManifestConfig};
use crate::app::client::Session;
use crate::app::models::DocumentId;
use crate::errors::{ManifestError, ManifestResult};

/// Discovery step currently being attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    /// Plain GET of the canonical manifest URL
    Direct,
    /// Warm-up round (1-based) followed by another direct fetch
    WarmupRetry(u32),
    /// Scraping the viewer page candidate at this index
    Scrape(usize),
    /// Every strategy failed
    Exhausted,
}

/// Resolves the IIIF manifest of one document
#[derive(Debug)]
pub struct ManifestResolver<'a> {
    session: &'a Session,
    config: ManifestConfig,
}

impl<'a> ManifestResolver<'a> {
    pub fn new(session: &'a Session, config: ManifestConfig) -> Self {
        Self { session, config }
    }

    /// Open the viewer page so the archive hands out session cookies
    ///
    /// The first viewer URL that answers at all (any status) counts as success.
    ///
    /// # Errors
    ///
    /// Returns the last transport error when no viewer URL could be reached.
    pub async fn warmup(&self, id: &DocumentId) -> ManifestResult<()> {
        let mut last_error = None;
        for url in self.session.archive().viewer_urls(id) {
            match self.session.get(&url).await {
                Ok(response) => {
                    debug!("Warm-up {} answered {}", url, response.status());
                    return Ok(());
                }
                Err(e) => {
                    debug!("Warm-up {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(ManifestError::Http(e)),
            None => Ok(()),
        }
    }

    /// Fetch and classify the manifest of `id`
    ///
    /// # Errors
    ///
    /// - Any direct-fetch failure other than HTTP 403 is returned as-is.
    /// - `ManifestError::Unreachable` when all three strategies fail.
    pub async fn resolve(&self, id: &DocumentId) -> ManifestResult<Manifest> {
        let manifest_url = self.session.archive().manifest_url(id);
        let viewer_urls = self.session.archive().viewer_urls(id);
        let mut stage = ResolveStage::Direct;

        loop {
            debug!("Manifest resolution stage: {:?}", stage);
            stage = match stage {
                ResolveStage::Direct => match self.fetch_json(&manifest_url).await {
                    Ok(value) => return Ok(Manifest::from_value(value)),
                    Err(ManifestError::Status { status, .. })
                        if status == StatusCode::FORBIDDEN.as_u16() =>
                    {
                        warn!("Manifest refused (HTTP 403), retrying after warm-up");
                        self.next_warmup_stage(0)
                    }
                    Err(e) => return Err(e),
                },

                ResolveStage::WarmupRetry(round) => {
                    tokio::time::sleep(self.warmup_delay(round)).await;
                    if let Err(e) = self.warmup(id).await {
                        debug!("Warm-up round {} failed: {}", round, e);
                    }
                    match self.fetch_json(&manifest_url).await {
                        Ok(value) => {
                            info!("Manifest obtained after warm-up round {}", round);
                            return Ok(Manifest::from_value(value));
                        }
                        Err(e) => {
                            debug!("Manifest still unavailable after round {}: {}", round, e);
                            self.next_warmup_stage(round)
                        }
                    }
                }

                ResolveStage::Scrape(index) => match viewer_urls.get(index) {
                    Some(viewer_url) => match self.scrape(viewer_url).await {
                        Ok(value) => {
                            info!("Manifest obtained from viewer page {}", viewer_url);
                            return Ok(Manifest::from_value(value));
                        }
                        Err(e) => {
                            debug!("Viewer page {} yielded no manifest: {}", viewer_url, e);
                            ResolveStage::Scrape(index + 1)
                        }
                    },
                    None => ResolveStage::Exhausted,
                },

                ResolveStage::Exhausted => {
                    return Err(ManifestError::Unreachable {
                        ark: id.to_string(),
                    })
                }
            };
        }
    }

    fn next_warmup_stage(&self, completed_round: u32) -> ResolveStage {
        if completed_round < self.config.warmup_rounds {
            ResolveStage::WarmupRetry(completed_round + 1)
        } else {
            ResolveStage::Scrape(0)
        }
    }

    fn warmup_delay(&self, round: u32) -> Duration {
        self.config.warmup_base_delay * round
    }

    /// Pull a manifest URL out of a viewer page and fetch it
    async fn scrape(&self, viewer_url: &str) -> ManifestResult<Value> {
        let response = self.session.get(viewer_url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ManifestError::Status {
                status: status.as_u16(),
                url: viewer_url.to_string(),
            });
        }
        let html = response.text().await?;

        let extractor = ManifestLinkExtractor::new(self.session.archive());
        let Some(alternative) = extractor.extract(&html) else {
            return Err(ManifestError::NoManifestLink {
                url: viewer_url.to_string(),
            });
        };
        debug!("Found manifest link {}", alternative);
        self.fetch_json(&alternative).await
    }

    /// GET `url` and decode the body as JSON
    async fn fetch_json(&self, url: &str) -> ManifestResult<Value> {
        let response = self.session.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ManifestError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| ManifestError::Json {
            url: url.to_string(),
            source,
        })
    }
}
