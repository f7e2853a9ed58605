//! Overlay images and their placement state.
//!
//! Each committed sketch becomes an [`OverlayImage`]. Its geometry is in one
//! of two mutually exclusive presentations:
//!
//! - `Affine`: translation, uniform scale and rotation about the image center
//! - `Warped`: four display-space corners solved into a homography; the
//!   affine is frozen at the value it had on entry and restored on exit
//!
//! Opacity and grayscale are independent of the presentation.

mod controller;
mod record;
mod stack;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::OverlayDefaults;
use crate::geometry::{Corner, Point, Quad};
use crate::transform::{clamp_scale, wrap_rotation, AffineParams};

pub use controller::OverlayController;
pub use record::OverlayRecord;
pub use stack::OverlayStack;

pub const MIN_OPACITY: f64 = 0.1;
pub const MAX_OPACITY: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    #[error("Unknown overlay image: {0}")]
    UnknownImage(String),

    #[error("No overlay image is selected")]
    NoActiveImage,

    #[error("Overlay image is not in warp mode")]
    NotWarped,

    /// Scale and rotation are frozen while the corners define the placement.
    #[error("Overlay image is in warp mode")]
    Warped,

    #[error("Invalid overlay record: {0}")]
    InvalidRecord(String),
}

/// Where the pixels of an overlay come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceImage {
    /// URL the renderer loads (usually a PNG data URL or blob URL)
    pub url: String,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl SourceImage {
    pub fn new(url: impl Into<String>, natural_width: u32, natural_height: u32) -> Self {
        Self {
            url: url.into(),
            natural_width,
            natural_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presentation {
    Affine(AffineParams),
    Warped { corners: Quad, frozen: AffineParams },
}

/// One uploaded sketch.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayImage {
    id: String,
    source: SourceImage,
    opacity: f64,
    grayscale: bool,
    presentation: Presentation,
}

/// Clamp opacity to `[0.1, 1.0]`; NaN becomes fully opaque.
pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        MAX_OPACITY
    } else {
        opacity.clamp(MIN_OPACITY, MAX_OPACITY)
    }
}

impl OverlayImage {
    pub fn new(id: impl Into<String>, source: SourceImage, defaults: &OverlayDefaults) -> Self {
        let affine = AffineParams {
            scale: clamp_scale(defaults.scale),
            ..AffineParams::default()
        };
        Self {
            id: id.into(),
            source,
            opacity: clamp_opacity(defaults.opacity),
            grayscale: defaults.grayscale,
            presentation: Presentation::Affine(affine),
        }
    }

    pub(crate) fn from_parts(
        id: String,
        source: SourceImage,
        opacity: f64,
        grayscale: bool,
        presentation: Presentation,
    ) -> Self {
        Self {
            id,
            source,
            opacity: clamp_opacity(opacity),
            grayscale,
            presentation,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Natural size in pixels as `f64`.
    pub fn natural_size(&self) -> (f64, f64) {
        (
            self.source.natural_width as f64,
            self.source.natural_height as f64,
        )
    }

    /// Record the natural size once the renderer has loaded the image.
    pub fn set_natural_size(&mut self, width: u32, height: u32) {
        self.source.natural_width = width;
        self.source.natural_height = height;
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        if !opacity.is_nan() {
            self.opacity = clamp_opacity(opacity);
        }
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.grayscale = grayscale;
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn is_warped(&self) -> bool {
        matches!(self.presentation, Presentation::Warped { .. })
    }

    /// Current affine parameters (frozen values while warped).
    pub fn affine(&self) -> AffineParams {
        match self.presentation {
            Presentation::Affine(params) => params,
            Presentation::Warped { frozen, .. } => frozen,
        }
    }

    pub fn warp_corners(&self) -> Option<Quad> {
        match self.presentation {
            Presentation::Affine(_) => None,
            Presentation::Warped { corners, .. } => Some(corners),
        }
    }

    fn affine_mut(&mut self) -> Result<&mut AffineParams, OverlayError> {
        match &mut self.presentation {
            Presentation::Affine(params) => Ok(params),
            Presentation::Warped { .. } => Err(OverlayError::Warped),
        }
    }

    pub fn set_translation(&mut self, translation: Point) -> Result<(), OverlayError> {
        let params = self.affine_mut()?;
        if translation.is_finite() {
            params.translation = translation;
        }
        Ok(())
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<(), OverlayError> {
        let params = self.affine_mut()?;
        params.scale = clamp_scale(scale);
        Ok(())
    }

    pub fn set_rotation(&mut self, rotation: f64) -> Result<(), OverlayError> {
        let params = self.affine_mut()?;
        params.rotation = wrap_rotation(rotation);
        Ok(())
    }

    pub fn set_scale_rotation(&mut self, scale: f64, rotation: f64) -> Result<(), OverlayError> {
        let params = self.affine_mut()?;
        params.scale = clamp_scale(scale);
        params.rotation = wrap_rotation(rotation);
        Ok(())
    }

    /// Back to the untransformed rectangle, leaving warp mode if needed.
    pub fn reset_transform(&mut self) {
        self.presentation = Presentation::Affine(AffineParams::default());
    }

    /// The image rectangle mapped through the current affine.
    pub fn footprint(&self) -> Quad {
        let (w, h) = self.natural_size();
        self.affine().footprint(w, h)
    }

    /// Enter warp mode with the corners on the current footprint.
    pub fn enter_warp(&mut self) -> Result<(), OverlayError> {
        let Presentation::Affine(params) = self.presentation else {
            return Err(OverlayError::Warped);
        };
        self.presentation = Presentation::Warped {
            corners: self.footprint(),
            frozen: params,
        };
        Ok(())
    }

    /// Leave warp mode, restoring the frozen affine.
    pub fn exit_warp(&mut self) -> Result<(), OverlayError> {
        let Presentation::Warped { frozen, .. } = self.presentation else {
            return Err(OverlayError::NotWarped);
        };
        self.presentation = Presentation::Affine(frozen);
        Ok(())
    }

    /// Snap the corners back onto the footprint.
    pub fn reset_warp(&mut self) -> Result<(), OverlayError> {
        let footprint = self.footprint();
        match &mut self.presentation {
            Presentation::Warped { corners, .. } => {
                *corners = footprint;
                Ok(())
            }
            Presentation::Affine(_) => Err(OverlayError::NotWarped),
        }
    }

    pub fn move_corner(&mut self, corner: Corner, position: Point) -> Result<(), OverlayError> {
        match &mut self.presentation {
            Presentation::Warped { corners, .. } => {
                corners.set_corner(corner, position);
                Ok(())
            }
            Presentation::Affine(_) => Err(OverlayError::NotWarped),
        }
    }
}
