//! PDF assembly from page images
//!
//! Every image becomes one page whose size in points equals the image size in
//! pixels, in the order given. Two embedding strategies exist, each behind a
//! cargo feature:
//!
//! - `jpeg-passthrough` - copy JPEG bytes into the PDF untouched
//! - `raster` - decode any supported format and embed raw RGB pixels
//!
//! Passthrough is preferred; a page it cannot handle falls back to raster.
//! With neither feature compiled in, assembly fails with
//! [`AssemblyError::Unavailable`].

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, warn};

use crate::app::workspace::partial_path;
use crate::errors::{AssemblyError, AssemblyResult};

#[cfg(feature = "jpeg-passthrough")]
pub mod passthrough;
#[cfg(feature = "raster")]
pub mod raster;

const PDF_VERSION: &str = "1.5";
const IMAGE_NAME: &str = "Im0";

/// An image XObject added to the document
#[derive(Debug, Clone, Copy)]
pub struct PlacedImage {
    pub object_id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// How a page image gets into the PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Passthrough,
    Raster,
}

impl Strategy {
    /// Strategies compiled into this build, preferred first
    pub fn available() -> Vec<Strategy> {
        let mut strategies = Vec::new();
        if cfg!(feature = "jpeg-passthrough") {
            strategies.push(Strategy::Passthrough);
        }
        if cfg!(feature = "raster") {
            strategies.push(Strategy::Raster);
        }
        strategies
    }

    #[allow(unused_variables)]
    fn embed(self, doc: &mut Document, bytes: &[u8], path: &Path) -> AssemblyResult<PlacedImage> {
        match self {
            #[cfg(feature = "jpeg-passthrough")]
            Strategy::Passthrough => passthrough::embed(doc, bytes.to_vec(), path),
            #[cfg(feature = "raster")]
            Strategy::Raster => raster::embed(doc, bytes.to_vec(), path),
            #[allow(unreachable_patterns)]
            _ => Err(AssemblyError::Unavailable),
        }
    }
}

/// Pages written per strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub pages: usize,
    pub passthrough: usize,
    pub rasterized: usize,
}

/// Builds one PDF out of an ordered list of page images
#[derive(Debug, Clone)]
pub struct PdfAssembler {
    strategies: Vec<Strategy>,
}

impl PdfAssembler {
    /// Assembler using every compiled-in strategy
    ///
    /// # Errors
    ///
    /// `AssemblyError::Unavailable` when no strategy is compiled in.
    pub fn new() -> AssemblyResult<Self> {
        Self::with_strategies(Strategy::available())
    }

    /// Assembler restricted to `strategies`, tried in order for every page
    pub fn with_strategies(strategies: Vec<Strategy>) -> AssemblyResult<Self> {
        if strategies.is_empty() {
            return Err(AssemblyError::Unavailable);
        }
        Ok(Self { strategies })
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Write `pages` to `output`, one page per image
    ///
    /// The document is saved to `<output>.part` and renamed into place, so an
    /// interrupted run never leaves a truncated PDF behind.
    pub fn assemble(&self, pages: &[PathBuf], output: &Path) -> AssemblyResult<AssemblyReport> {
        if pages.is_empty() {
            return Err(AssemblyError::NoPages);
        }

        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        let mut report = AssemblyReport::default();

        for path in pages {
            let bytes = std::fs::read(path)?;
            let (image, strategy) = self.embed_image(&mut doc, &bytes, path)?;
            match strategy {
                Strategy::Passthrough => report.passthrough += 1,
                Strategy::Raster => report.rasterized += 1,
            }
            kids.push(add_page(&mut doc, pages_id, image)?.into());
            report.pages += 1;
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let temp_path = partial_path(output);
        if let Err(e) = doc.save(&temp_path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        std::fs::rename(&temp_path, output)?;

        info!(
            "Wrote {} pages to {} ({} embedded directly, {} rasterized)",
            report.pages,
            output.display(),
            report.passthrough,
            report.rasterized
        );
        Ok(report)
    }

    /// Try each strategy in turn; the last error wins
    fn embed_image(
        &self,
        doc: &mut Document,
        bytes: &[u8],
        path: &Path,
    ) -> AssemblyResult<(PlacedImage, Strategy)> {
        let mut last_error = AssemblyError::Unavailable;
        for &strategy in &self.strategies {
            match strategy.embed(doc, bytes, path) {
                Ok(image) => return Ok((image, strategy)),
                Err(e) => {
                    if self.strategies.last() != Some(&strategy) {
                        warn!(
                            "{:?} embedding failed for {}: {}; trying next strategy",
                            strategy,
                            path.display(),
                            e
                        );
                    }
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Add a page sized to the image that draws it edge to edge
fn add_page(doc: &mut Document, pages_id: ObjectId, image: PlacedImage) -> AssemblyResult<ObjectId> {
    let width = i64::from(image.width);
    let height = i64::from(image.height);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image.object_id,
            },
        },
    });
    debug!("Added {}x{} page", image.width, image.height);
    Ok(page_id)
}
