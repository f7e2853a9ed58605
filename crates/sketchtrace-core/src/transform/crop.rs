//! Crop mapping from displayed coordinates to source pixels.
//!
//! The crop UI shows the upload scaled to fit its modal, so the rectangle the
//! user draws is in displayed coordinates. Before extraction it is scaled
//! back by `(naturalWidth / displayedWidth, naturalHeight / displayedHeight)`
//! about the origin and intersected with the natural rectangle.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner of the image in both spaces
//! - Source rectangles are in natural pixels, never negative
//!
//! Extraction always produces at least a 1x1 raster; a missing or unusable
//! crop falls back to the full image.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{Raster, CHANNELS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CropError {
    /// Zero-area crop, non-finite values, or a crop entirely outside the
    /// image.
    #[error("Invalid crop region")]
    InvalidCropRegion,
}

/// Axis-aligned rectangle in either displayed or source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full natural rectangle of an image.
    pub fn full(natural_width: u32, natural_height: u32) -> Self {
        Self::new(0.0, 0.0, natural_width as f64, natural_height as f64)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Integer source-pixel region ready for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Map a displayed crop rectangle to source coordinates.
///
/// # Errors
///
/// `CropError::InvalidCropRegion` when the displayed or natural size is not
/// positive, the crop has zero area, or it does not intersect the image.
pub fn try_map_to_source(
    crop: &CropRect,
    displayed_width: f64,
    displayed_height: f64,
    natural_width: u32,
    natural_height: u32,
) -> Result<CropRect, CropError> {
    let valid_display = displayed_width.is_finite()
        && displayed_height.is_finite()
        && displayed_width > 0.0
        && displayed_height > 0.0;
    if !valid_display || natural_width == 0 || natural_height == 0 {
        return Err(CropError::InvalidCropRegion);
    }
    if !crop.is_finite() || crop.width <= 0.0 || crop.height <= 0.0 {
        return Err(CropError::InvalidCropRegion);
    }

    let nw = natural_width as f64;
    let nh = natural_height as f64;
    let sx = nw / displayed_width;
    let sy = nh / displayed_height;

    let left = (crop.x * sx).max(0.0);
    let top = (crop.y * sy).max(0.0);
    let right = ((crop.x + crop.width) * sx).min(nw);
    let bottom = ((crop.y + crop.height) * sy).min(nh);

    if right <= left || bottom <= top {
        return Err(CropError::InvalidCropRegion);
    }

    Ok(CropRect::new(left, top, right - left, bottom - top))
}

/// Map a displayed crop rectangle to source coordinates, falling back to the
/// full natural rectangle when there is no usable crop.
pub fn map_to_source(
    crop: Option<&CropRect>,
    displayed_width: f64,
    displayed_height: f64,
    natural_width: u32,
    natural_height: u32,
) -> CropRect {
    let Some(crop) = crop else {
        return CropRect::full(natural_width, natural_height);
    };
    match try_map_to_source(
        crop,
        displayed_width,
        displayed_height,
        natural_width,
        natural_height,
    ) {
        Ok(rect) => rect,
        Err(e) => {
            log::warn!("{e} {crop:?}; using the full {natural_width}x{natural_height} image");
            CropRect::full(natural_width, natural_height)
        }
    }
}

/// Round a source rectangle to whole pixels inside `width x height`.
///
/// The result is at least 1x1 for any non-empty image.
pub fn to_pixel_rect(rect: &CropRect, width: u32, height: u32) -> PixelRect {
    let left = round_clamped(rect.x, width).min(width.saturating_sub(1));
    let top = round_clamped(rect.y, height).min(height.saturating_sub(1));
    let right = round_clamped(rect.x + rect.width, width)
        .max(left + 1)
        .min(width.max(1));
    let bottom = round_clamped(rect.y + rect.height, height)
        .max(top + 1)
        .min(height.max(1));

    PixelRect {
        x: left,
        y: top,
        width: right.saturating_sub(left).max(1),
        height: bottom.saturating_sub(top).max(1),
    }
}

fn round_clamped(v: f64, max: u32) -> u32 {
    if v.is_finite() {
        v.round().clamp(0.0, max as f64) as u32
    } else {
        0
    }
}

/// Copy a pixel region out of a raster.
///
/// The region is clamped to the raster; the full raster comes back as a
/// clone.
pub fn extract(image: &Raster, region: &PixelRect) -> Raster {
    let covers_all = region.x == 0
        && region.y == 0
        && region.width >= image.width
        && region.height >= image.height;
    if covers_all || image.is_empty() {
        return image.clone();
    }

    let left = region.x.min(image.width.saturating_sub(1));
    let top = region.y.min(image.height.saturating_sub(1));
    let out_width = region.width.min(image.width - left).max(1);
    let out_height = region.height.min(image.height - top).max(1);

    let row_bytes = out_width as usize * CHANNELS;
    let mut output = Vec::with_capacity(row_bytes * out_height as usize);

    for y in 0..out_height {
        let src_start = (top + y) as usize * image.stride() + left as usize * CHANNELS;
        output.extend_from_slice(&image.pixels[src_start..src_start + row_bytes]);
    }

    Raster::new(out_width, out_height, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Each pixel's R channel encodes its position.
    fn test_raster(width: u32, height: u32) -> Raster {
        let mut pixels = Vec::with_capacity((width * height) as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Raster::new(width, height, pixels)
    }

    #[test]
    fn test_map_scales_to_source() {
        let crop = CropRect::new(50.0, 25.0, 100.0, 50.0);
        let rect = try_map_to_source(&crop, 200.0, 100.0, 400, 300).unwrap();
        assert_eq!(rect, CropRect::new(100.0, 75.0, 200.0, 150.0));
    }

    #[test]
    fn test_map_none_is_full_image() {
        let rect = map_to_source(None, 200.0, 100.0, 400, 300);
        assert_eq!(rect, CropRect::full(400, 300));
    }

    #[test]
    fn test_zero_area_falls_back_to_full_image() {
        let crop = CropRect::new(10.0, 10.0, 0.0, 20.0);
        assert_eq!(
            try_map_to_source(&crop, 200.0, 100.0, 400, 300),
            Err(CropError::InvalidCropRegion)
        );
        let rect = map_to_source(Some(&crop), 200.0, 100.0, 400, 300);
        assert_eq!(rect, CropRect::full(400, 300));
    }

    #[test]
    fn test_outside_crop_falls_back_to_full_image() {
        let crop = CropRect::new(250.0, 0.0, 50.0, 50.0);
        let rect = map_to_source(Some(&crop), 200.0, 100.0, 400, 300);
        assert_eq!(rect, CropRect::full(400, 300));
    }

    #[test]
    fn test_partially_outside_crop_is_intersected() {
        let crop = CropRect::new(-20.0, 80.0, 60.0, 40.0);
        let rect = try_map_to_source(&crop, 200.0, 100.0, 400, 300).unwrap();
        assert_eq!(rect, CropRect::new(0.0, 240.0, 80.0, 60.0));
    }

    #[test]
    fn test_zero_display_size_is_invalid() {
        let crop = CropRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(try_map_to_source(&crop, 0.0, 100.0, 400, 300).is_err());
        assert!(try_map_to_source(&crop, 200.0, f64::NAN, 400, 300).is_err());
    }

    #[test]
    fn test_nan_crop_is_invalid() {
        let crop = CropRect::new(f64::NAN, 0.0, 10.0, 10.0);
        assert!(try_map_to_source(&crop, 200.0, 100.0, 400, 300).is_err());
    }

    #[test]
    fn test_to_pixel_rect_rounds_edges() {
        let rect = CropRect::new(10.4, 9.6, 20.2, 20.0);
        let px = to_pixel_rect(&rect, 100, 100);
        assert_eq!(
            px,
            PixelRect {
                x: 10,
                y: 10,
                width: 21,
                height: 20
            }
        );
    }

    #[test]
    fn test_to_pixel_rect_minimum_size() {
        let rect = CropRect::new(99.9, 99.9, 0.01, 0.01);
        let px = to_pixel_rect(&rect, 100, 100);
        assert_eq!(px.width, 1);
        assert_eq!(px.height, 1);
        assert!(px.x + px.width <= 100);
        assert!(px.y + px.height <= 100);
    }

    #[test]
    fn test_extract_region() {
        let img = test_raster(10, 10);
        let out = extract(
            &img,
            &PixelRect {
                x: 3,
                y: 3,
                width: 4,
                height: 4,
            },
        );
        assert_eq!((out.width, out.height), (4, 4));
        // (3, 3) -> 33
        assert_eq!(out.pixels[0], 33);
        // (6, 6) -> 66, last pixel
        assert_eq!(out.pixels[out.pixels.len() - 4], 66);
        assert_eq!(out.pixels[3], 255);
    }

    #[test]
    fn test_extract_full_is_identity() {
        let img = test_raster(8, 5);
        let out = extract(
            &img,
            &PixelRect {
                x: 0,
                y: 0,
                width: 8,
                height: 5,
            },
        );
        assert_eq!(out, img);
    }

    #[test]
    fn test_extract_clamps_oversized_region() {
        let img = test_raster(10, 10);
        let out = extract(
            &img,
            &PixelRect {
                x: 8,
                y: 8,
                width: 50,
                height: 50,
            },
        );
        assert_eq!((out.width, out.height), (2, 2));
    }

    #[test]
    fn test_crop_error_display() {
        assert_eq!(CropError::InvalidCropRegion.to_string(), "Invalid crop region");
    }
}
