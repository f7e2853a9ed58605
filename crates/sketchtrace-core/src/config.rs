//! Runtime configuration passed in from the host.
//!
//! Every field has a default, so the host may send a partial object (or
//! nothing at all).

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureConstraints, FacingMode};
use crate::transform::DEFAULT_COLLINEAR_EPSILON;

/// Initial panel values for a newly committed sketch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayDefaults {
    /// Starting opacity (0.1 to 1.0)
    pub opacity: f64,
    /// Starting scale (0.5 to 3.0)
    pub scale: f64,
    pub grayscale: bool,
}

impl Default for OverlayDefaults {
    fn default() -> Self {
        Self {
            opacity: 0.5,
            scale: 1.0,
            grayscale: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SketchConfig {
    pub capture: CaptureConstraints,
    /// Camera requested on first mount
    pub facing_mode: FacingMode,
    pub overlay: OverlayDefaults,
    /// Sine of the smallest angle allowed between warp corner edges
    pub collinear_epsilon: f64,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConstraints::default(),
            facing_mode: FacingMode::default(),
            overlay: OverlayDefaults::default(),
            collinear_epsilon: DEFAULT_COLLINEAR_EPSILON,
        }
    }
}
