//! Decode-and-re-embed fallback
//!
//! Any format the `image` crate reads is decoded to 8-bit RGB and stored as a
//! raw pixel stream; the document-wide Flate pass compresses it on save.

use std::path::Path;

use lopdf::{dictionary, Document, Stream};
use tracing::debug;

use super::PlacedImage;
use crate::errors::AssemblyResult;

pub fn embed(doc: &mut Document, bytes: Vec<u8>, path: &Path) -> AssemblyResult<PlacedImage> {
    let rgb = image::load_from_memory(&bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!(
        "Rasterized {} ({}x{})",
        path.display(),
        width,
        height
    );

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        rgb.into_raw(),
    );

    Ok(PlacedImage {
        object_id: doc.add_object(stream),
        width,
        height,
    })
}
