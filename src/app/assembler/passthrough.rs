//! Direct JPEG embedding
//!
//! The page file is copied byte for byte into a `DCTDecode` image stream.
//! Only the JPEG header is decoded, to learn the pixel size and color space.
//! CMYK and YCCK files are rejected so the caller can rasterize them.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};
use lopdf::{dictionary, Document, Stream};

use super::PlacedImage;
use crate::errors::{AssemblyError, AssemblyResult};

/// Component count declared by the first SOF segment, `None` if there is none
///
/// The `image` decoder reports four-component files as RGB, so the frame
/// header is read directly.
pub(crate) fn frame_components(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        while *bytes.get(pos)? == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos)?;
        pos += 1;

        match marker {
            0x01 | 0xD0..=0xD8 => continue,
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = usize::from(u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]));
        // SOF0..SOF15, minus DHT (C4), JPG (C8) and DAC (CC)
        if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            return bytes.get(pos + 7).copied();
        }
        pos += length;
    }
}

/// Embed `bytes` as-is; fails for anything but 8-bit gray or RGB JPEG
pub fn embed(doc: &mut Document, bytes: Vec<u8>, path: &Path) -> AssemblyResult<PlacedImage> {
    let components = frame_components(&bytes).ok_or_else(|| AssemblyError::UnsupportedImage {
        path: path.to_path_buf(),
        reason: "no JPEG frame header".to_string(),
    })?;
    if components != 1 && components != 3 {
        return Err(AssemblyError::UnsupportedImage {
            path: path.to_path_buf(),
            reason: format!("JPEG with {} color components cannot be embedded directly", components),
        });
    }

    let decoder = JpegDecoder::new(Cursor::new(bytes.as_slice())).map_err(|e| {
        AssemblyError::UnsupportedImage {
            path: path.to_path_buf(),
            reason: format!("not a readable JPEG: {}", e),
        }
    })?;

    let (width, height) = decoder.dimensions();
    let color_space = match (decoder.color_type(), components) {
        (ColorType::L8, 1) => "DeviceGray",
        (ColorType::Rgb8, 3) => "DeviceRGB",
        (other, _) => {
            return Err(AssemblyError::UnsupportedImage {
                path: path.to_path_buf(),
                reason: format!("JPEG color type {:?} cannot be embedded directly", other),
            })
        }
    };

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes,
    )
    .with_compression(false);

    Ok(PlacedImage {
        object_id: doc.add_object(stream),
        width,
        height,
    })
}
