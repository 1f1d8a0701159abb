//! Data models for Gallica documents and download work
//!
//! This module contains the document identifier (resolved once at startup from
//! either a Gallica URL or a bare ARK name) and the per-page download job.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{ConfigError, IdentifierError};

/// Pattern locating the ARK name inside a Gallica URL
const ARK_PATTERN: &str = r"(?i)/ark:/12148/([^/?#]+)";

fn ark_regex() -> &'static Regex {
    static ARK_RE: OnceLock<Regex> = OnceLock::new();
    ARK_RE.get_or_init(|| Regex::new(ARK_PATTERN).expect("ARK pattern is a valid regex"))
}

/// Identifier of a document within the Gallica archive (the ARK name)
///
/// For `https://gallica.bnf.fr/ark:/12148/bd6t54208770t?rk=107296;4` the
/// identifier is `bd6t54208770t`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    /// Extract the identifier from a locator string
    ///
    /// Matches `/ark:/12148/<token>` where the token runs until the next `/`,
    /// `?`, `#` or the end of the string.
    ///
    /// # Errors
    ///
    /// Returns `IdentifierError::NotExtractable` if the locator has no ARK segment.
    pub fn from_locator(locator: &str) -> Result<Self, IdentifierError> {
        ark_regex()
            .captures(locator)
            .and_then(|caps| caps.get(1))
            .map(|token| Self(token.as_str().trim().to_string()))
            .ok_or_else(|| IdentifierError::NotExtractable {
                locator: locator.to_string(),
            })
    }

    /// Use a bare identifier as-is, trimmed of surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyIdentifier` if nothing is left after trimming.
    pub fn from_bare(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyIdentifier);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Resolve the identifier from exactly one of a locator or a bare value
    pub fn resolve(locator: Option<&str>, bare: Option<&str>) -> crate::errors::Result<Self> {
        match (locator, bare) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingSources.into()),
            (Some(locator), None) => Ok(Self::from_locator(locator)?),
            (None, Some(bare)) => Ok(Self::from_bare(bare)?),
            (None, None) => Err(ConfigError::MissingSource.into()),
        }
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page image to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// 1-based page position in the final document
    pub ordinal: usize,
    /// Fully parameterised IIIF image URL
    pub url: String,
    /// Final location of the page image
    pub destination: PathBuf,
}

impl DownloadJob {
    pub fn new(ordinal: usize, url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            ordinal,
            url: url.into(),
            destination: destination.into(),
        }
    }
}
