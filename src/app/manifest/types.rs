//! Core types for IIIF manifest processing
//!
//! Gallica serves IIIF Presentation v2 manifests (`sequences[0].canvases`)
//! and occasionally v3 ones (`items`). Both are normalized here into an
//! ordered list of [`Canvas`] values whose image service yields page URLs.

use std::time::Duration;

use serde_json::Value;

use crate::constants::limits;
use crate::errors::{ManifestError, ManifestResult};

/// Configuration for manifest discovery
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Warm-up rounds attempted after the direct fetch is refused
    pub warmup_rounds: u32,
    /// Delay multiplied by the round number before each warm-up round
    pub warmup_base_delay: Duration,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            warmup_rounds: limits::WARMUP_ROUNDS,
            warmup_base_delay: limits::WARMUP_BASE_DELAY,
        }
    }
}

/// A decoded manifest, tagged by which page list it carries
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    /// IIIF Presentation v2: canvases of the first sequence
    SchemaA { label: Option<String>, canvases: Vec<Value> },
    /// IIIF Presentation v3: top-level `items`
    SchemaB { label: Option<String>, canvases: Vec<Value> },
    /// Neither key populated
    Empty,
}

impl Manifest {
    /// Classify a decoded manifest document
    ///
    /// A non-empty `sequences` list wins over `items`.
    pub fn from_value(value: Value) -> Self {
        let label = extract_label(value.get("label"));

        if let Some(first) = value
            .get("sequences")
            .and_then(Value::as_array)
            .and_then(|sequences| sequences.first())
        {
            let canvases = first
                .get("canvases")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            return Manifest::SchemaA { label, canvases };
        }

        if let Some(items) = value.get("items").and_then(Value::as_array) {
            return Manifest::SchemaB {
                label,
                canvases: items.clone(),
            };
        }

        Manifest::Empty
    }

    /// Human-readable title, if the manifest carries one
    pub fn label(&self) -> Option<&str> {
        match self {
            Manifest::SchemaA { label, .. } | Manifest::SchemaB { label, .. } => label.as_deref(),
            Manifest::Empty => None,
        }
    }

    /// Short schema name for logging
    pub fn schema(&self) -> &'static str {
        match self {
            Manifest::SchemaA { .. } => "IIIF v2",
            Manifest::SchemaB { .. } => "IIIF v3",
            Manifest::Empty => "unknown",
        }
    }

    /// Pages in document order, numbered from 1
    pub fn canvases(&self) -> Vec<Canvas<'_>> {
        let raw = match self {
            Manifest::SchemaA { canvases, .. } | Manifest::SchemaB { canvases, .. } => {
                canvases.as_slice()
            }
            Manifest::Empty => &[],
        };

        raw.iter()
            .enumerate()
            .map(|(index, value)| Canvas {
                ordinal: index + 1,
                value,
            })
            .collect()
    }
}

/// v2 labels are strings, v3 labels are language maps of string lists
fn extract_label(label: Option<&Value>) -> Option<String> {
    match label? {
        Value::String(text) => Some(text.clone()),
        Value::Object(languages) => languages
            .values()
            .find_map(|values| values.as_array()?.first()?.as_str().map(str::to_string)),
        _ => None,
    }
}

/// One page of the document
#[derive(Debug, Clone, Copy)]
pub struct Canvas<'a> {
    /// 1-based position in the document
    pub ordinal: usize,
    value: &'a Value,
}

impl<'a> Canvas<'a> {
    /// Locate the IIIF image service of this page
    ///
    /// Looks at `images[0].resource.service` (v2) first, then
    /// `items[0].items[0].body.service[0]` (v3). Either `@id` or `id` is accepted.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NoImageService` if neither path yields an id.
    pub fn image_service(&self) -> ManifestResult<ImageService> {
        v2_service_id(self.value)
            .or_else(|| v3_service_id(self.value))
            .map(|id| ImageService { id: id.to_string() })
            .ok_or(ManifestError::NoImageService {
                ordinal: self.ordinal,
            })
    }
}

fn service_id(service: &Value) -> Option<&str> {
    service
        .get("@id")
        .and_then(Value::as_str)
        .or_else(|| service.get("id").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
}

fn v2_service_id(canvas: &Value) -> Option<&str> {
    let service = canvas
        .get("images")?
        .as_array()?
        .first()?
        .get("resource")?
        .get("service")?;
    service_id(service)
}

fn v3_service_id(canvas: &Value) -> Option<&str> {
    let body = canvas
        .get("items")?
        .as_array()?
        .first()?
        .get("items")?
        .as_array()?
        .first()?
        .get("body")?;
    let service = body.get("service")?.as_array()?.first()?;
    service_id(service)
}

/// IIIF Image API endpoint of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageService {
    id: String,
}

impl ImageService {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full-region JPEG scaled to `max_width` pixels wide
    pub fn image_url(&self, max_width: u32) -> String {
        format!(
            "{}/full/{},/0/default.jpg",
            self.id.trim_end_matches('/'),
            max_width
        )
    }
}
