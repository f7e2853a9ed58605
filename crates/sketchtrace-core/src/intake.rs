//! Upload intake: decode, crop at source resolution, re-encode.

use thiserror::Error;

use crate::decode::{decode_image, DecodeError};
use crate::encode::{encode_raster_png, EncodeError};
use crate::transform::{extract, map_to_source, to_pixel_rect, CropRect, PixelRect};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A cropped sketch ready to become an overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedSketch {
    /// PNG bytes of the cropped region.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Region of the oriented upload that was kept.
    pub region: PixelRect,
}

/// Commit one upload.
///
/// `crop` is in the coordinates of the preview the user cropped on, which
/// was `displayed_width x displayed_height`. A missing or unusable crop keeps
/// the full image.
pub fn commit_upload(
    bytes: &[u8],
    crop: Option<&CropRect>,
    displayed_width: f64,
    displayed_height: f64,
) -> Result<CommittedSketch, IntakeError> {
    let raster = decode_image(bytes)?;
    let source_rect = map_to_source(
        crop,
        displayed_width,
        displayed_height,
        raster.width,
        raster.height,
    );
    let region = to_pixel_rect(&source_rect, raster.width, raster.height);
    let cropped = extract(&raster, &region);
    let png = encode_raster_png(&cropped)?;

    log::debug!(
        "Committed {}x{} sketch from {}x{} upload",
        cropped.width,
        cropped.height,
        raster.width,
        raster.height
    );

    Ok(CommittedSketch {
        png,
        width: cropped.width,
        height: cropped.height,
        region,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_png;

    /// 400x300 upload with R = x / 2 and G = y.
    fn upload() -> Vec<u8> {
        let (w, h) = (400u32, 300u32);
        let mut pixels = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                pixels.extend_from_slice(&[(x / 2) as u8, y as u8, 0, 255]);
            }
        }
        encode_png(&pixels, w, h).unwrap()
    }

    #[test]
    fn test_commit_with_crop() {
        let crop = CropRect::new(50.0, 25.0, 100.0, 50.0);
        let sketch = commit_upload(&upload(), Some(&crop), 200.0, 100.0).unwrap();
        assert_eq!((sketch.width, sketch.height), (200, 150));
        assert_eq!(
            sketch.region,
            PixelRect {
                x: 100,
                y: 75,
                width: 200,
                height: 150
            }
        );

        let decoded = image::load_from_memory(&sketch.png).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (200, 150));
        // top-left of the crop is source pixel (100, 75)
        assert_eq!(decoded.get_pixel(0, 0).0, [50, 75, 0, 255]);
    }

    #[test]
    fn test_commit_without_crop_keeps_full_image() {
        let sketch = commit_upload(&upload(), None, 200.0, 100.0).unwrap();
        assert_eq!((sketch.width, sketch.height), (400, 300));
    }

    #[test]
    fn test_commit_with_empty_crop_keeps_full_image() {
        let crop = CropRect::new(10.0, 10.0, 0.0, 0.0);
        let sketch = commit_upload(&upload(), Some(&crop), 200.0, 100.0).unwrap();
        assert_eq!((sketch.width, sketch.height), (400, 300));
    }

    #[test]
    fn test_commit_rejects_garbage() {
        let result = commit_upload(b"not an image", None, 10.0, 10.0);
        assert!(matches!(result, Err(IntakeError::Decode(_))));
    }
}
