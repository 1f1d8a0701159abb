//! Manifest URL extraction from viewer HTML
//!
//! Last resort when the canonical manifest URL keeps answering 403: the
//! viewer page embeds the manifest location, sometimes absolute, sometimes
//! relative to the archive origin.

use regex::Regex;

use crate::app::client::Archive;

/// Finds manifest URLs in viewer pages of one archive
#[derive(Debug, Clone)]
pub struct ManifestLinkExtractor {
    origin: String,
    absolute: Regex,
    relative: Regex,
}

impl ManifestLinkExtractor {
    pub fn new(archive: &Archive) -> Self {
        let origin = archive.origin();
        let tail = r#"/iiif/ark:/12148/[^"']+/manifest\.json"#;
        let absolute = Regex::new(&format!("{}{}", regex::escape(&origin), tail))
            .expect("escaped origin yields a valid regex");
        let relative = Regex::new(tail).expect("manifest path pattern is a valid regex");

        Self {
            origin,
            absolute,
            relative,
        }
    }

    /// First manifest URL in `html`, absolute form preferred
    pub fn extract(&self, html: &str) -> Option<String> {
        if let Some(found) = self.absolute.find(html) {
            return Some(found.as_str().to_string());
        }
        self.relative
            .find(html)
            .map(|found| format!("{}{}", self.origin, found.as_str()))
    }
}
