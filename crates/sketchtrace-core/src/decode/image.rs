//! Sketch decoding with EXIF orientation handling.
//!
//! Phone photos of paper sketches usually carry an EXIF orientation tag, so
//! the tag is applied before the raster is handed to the crop step. Without
//! it the crop rectangle drawn on the (browser-oriented) preview would map
//! onto the wrong pixels.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, Orientation, Raster};

/// Decode an uploaded sketch (JPEG, PNG, WebP, GIF, BMP) to RGBA, applying
/// EXIF orientation.
///
/// # Errors
///
/// - `DecodeError::Empty` for zero-length input
/// - `DecodeError::InvalidFormat` when the format cannot be guessed
/// - `DecodeError::CorruptedFile` when decoding fails
pub fn decode_image(bytes: &[u8]) -> Result<Raster, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let orientation = get_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = apply_orientation(img, orientation);
    Ok(Raster::from_rgba_image(oriented.into_rgba8()))
}

/// Read the EXIF orientation tag.
///
/// Returns `Orientation::Normal` when there is no EXIF block or no tag.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .map(Orientation::from)
        .unwrap_or_default()
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
