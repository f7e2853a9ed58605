//! Geometric transforms for placing an overlay over the camera feed.
//!
//! This module turns overlay state into the matrix the renderer applies:
//! - [`affine`]: translate / uniform scale / rotate about the element center
//! - [`homography`]: four-corner perspective warp solved by DLT
//! - [`render`]: picks one of the two per image and keeps the last valid
//!   matrix when a warp degenerates
//! - [`crop`]: maps a crop drawn on the displayed image back to source pixels
//!
//! # Coordinate System
//!
//! - Element-local coordinates are source pixels, origin at the image's
//!   top-left corner, `(0,0)..(naturalWidth, naturalHeight)`
//! - Display coordinates share the origin of the element's layout box
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Matrices are emitted column-major 4x4 with identity z pass-through

pub mod affine;
pub mod crop;
pub mod homography;
pub mod render;

use thiserror::Error;

pub use affine::{
    clamp_scale, compose, compose_about, wrap_rotation, Affine2, AffineParams, PinchBaseline,
    MAX_SCALE, MIN_SCALE,
};
pub use crop::{
    extract, map_to_source, to_pixel_rect, try_map_to_source, CropError, CropRect, PixelRect,
};
pub use homography::{Homography, DEFAULT_COLLINEAR_EPSILON};
pub use render::{RenderMode, RenderTransform, TransformComposer};

/// Errors from building a render transform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Three warp corners are collinear, the quad folds over itself, or the
    /// linear system is singular.
    #[error("Degenerate warp: corners do not span a valid quadrilateral")]
    DegenerateWarp,

    /// The image's natural size is zero or not finite.
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_error_display() {
        assert_eq!(
            TransformError::DegenerateWarp.to_string(),
            "Degenerate warp: corners do not span a valid quadrilateral"
        );
        let err = TransformError::InvalidDimensions {
            width: 0.0,
            height: 10.0,
        };
        assert_eq!(err.to_string(), "Invalid image dimensions: 0x10");
    }
}
