//! Final render transform for each overlay.
//!
//! An affine image renders its composed 2-D matrix; a warped image renders
//! the homography from its natural rectangle to the four corners. The two
//! are never multiplied together.
//!
//! A warp that cannot be solved (collinear or folded corners) does not
//! reach the renderer: the composer re-emits the last matrix that solved
//! for that image and marks the output `stale`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::homography;
use crate::overlay::{OverlayImage, Presentation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Affine,
    Warped,
}

/// What the renderer needs to draw one overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTransform {
    pub id: String,
    pub mode: RenderMode,
    /// Column-major 4x4 matrix, applied with the transform origin at the
    /// element's top-left corner.
    pub matrix: [f64; 16],
    pub opacity: f64,
    pub grayscale: bool,
    /// The current warp is degenerate and `matrix` is the last valid one.
    pub stale: bool,
}

impl RenderTransform {
    /// CSS `transform` value.
    pub fn css_transform(&self) -> String {
        let values: Vec<String> = self.matrix.iter().map(|v| format_css_number(*v)).collect();
        format!("matrix3d({})", values.join(", "))
    }

    /// CSS `filter` value.
    pub fn css_filter(&self) -> &'static str {
        if self.grayscale {
            "grayscale(100%)"
        } else {
            "none"
        }
    }
}

fn format_css_number(v: f64) -> String {
    // CSS has no exponent-free way to print 1e-17, and -0 reads oddly
    if v.abs() < 1e-12 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

/// Builds render transforms and remembers the last valid warp per image.
#[derive(Debug, Clone)]
pub struct TransformComposer {
    collinear_epsilon: f64,
    last_valid: HashMap<String, [f64; 16]>,
}

impl Default for TransformComposer {
    fn default() -> Self {
        Self::new(homography::DEFAULT_COLLINEAR_EPSILON)
    }
}

impl TransformComposer {
    pub fn new(collinear_epsilon: f64) -> Self {
        Self {
            collinear_epsilon,
            last_valid: HashMap::new(),
        }
    }

    pub fn render(&mut self, image: &OverlayImage) -> RenderTransform {
        let (width, height) = image.natural_size();
        let (mode, matrix, stale) = match image.presentation() {
            Presentation::Affine(params) => {
                self.last_valid.remove(image.id());
                (
                    RenderMode::Affine,
                    params.matrix(width, height).to_mat4(),
                    false,
                )
            }
            Presentation::Warped { corners, frozen } => {
                match homography::solve(width, height, corners, self.collinear_epsilon) {
                    Ok(h) => {
                        let matrix = h.to_mat4();
                        self.last_valid.insert(image.id().to_string(), matrix);
                        (RenderMode::Warped, matrix, false)
                    }
                    Err(e) => {
                        log::warn!("{e} for {}; keeping previous transform", image.id());
                        let matrix = self
                            .last_valid
                            .get(image.id())
                            .copied()
                            .unwrap_or_else(|| frozen.matrix(width, height).to_mat4());
                        (RenderMode::Warped, matrix, true)
                    }
                }
            }
        };

        RenderTransform {
            id: image.id().to_string(),
            mode,
            matrix,
            opacity: image.opacity(),
            grayscale: image.grayscale(),
            stale,
        }
    }

    pub fn render_all<'a>(
        &mut self,
        images: impl IntoIterator<Item = &'a OverlayImage>,
    ) -> Vec<RenderTransform> {
        images.into_iter().map(|image| self.render(image)).collect()
    }

    /// Drop the remembered warp of a deleted image.
    pub fn forget(&mut self, id: &str) {
        self.last_valid.remove(id);
    }

    pub fn collinear_epsilon(&self) -> f64 {
        self.collinear_epsilon
    }
}
