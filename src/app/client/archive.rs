//! Archive endpoint layout
//!
//! Gallica exposes every document under the same ARK naming authority; this
//! module derives the manifest, viewer and cookie URLs from the archive origin.

use url::Url;

use crate::app::models::DocumentId;
use crate::constants::archive;
use crate::errors::{ConfigError, ConfigResult};

/// Location of the remote archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    base: Url,
}

impl Archive {
    /// Parse the archive base URL; only its origin is used
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the URL is not absolute http(s).
    pub fn new(base_url: &str) -> ConfigResult<Self> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: reason.to_string(),
        };

        let base = Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            return Err(invalid("Expected an absolute http(s) URL"));
        }
        Ok(Self { base })
    }

    /// Origin without trailing slash, e.g. `https://gallica.bnf.fr`
    pub fn origin(&self) -> String {
        self.base.origin().ascii_serialization()
    }

    /// Referer header value
    pub fn referer(&self) -> String {
        format!("{}/", self.origin())
    }

    /// URL the cookie jar is keyed on
    pub fn cookie_url(&self) -> &Url {
        &self.base
    }

    /// Canonical IIIF manifest URL of a document
    pub fn manifest_url(&self, id: &DocumentId) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.origin(),
            archive::IIIF_PATH,
            archive::ARK_PREFIX,
            id,
            archive::MANIFEST_FILE
        )
    }

    /// Human-facing viewer pages, in the order they are tried
    pub fn viewer_urls(&self, id: &DocumentId) -> [String; 2] {
        let document = format!("{}/{}/{}", self.origin(), archive::ARK_PREFIX, id);
        [format!("{}/{}", document, archive::FIRST_FOLIO), document]
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self {
            base: Url::parse(archive::BASE_URL).expect("Archive base URL should be valid"),
        }
    }
}
