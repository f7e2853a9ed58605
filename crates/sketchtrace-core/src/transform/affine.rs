//! Affine placement of an overlay: translate, uniform scale, rotate.
//!
//! # Composition Order
//!
//! The overlay is translated in outer (display) space, then scaled and
//! rotated about its own center. For an element-local point `p`, origin `o`
//! (the element center), translation `t`, scale `s` and rotation `R(θ)`:
//!
//! ```text
//! p' = o + t + s * R(θ) * (p - o)
//! ```
//!
//! Rotation angles are in degrees, positive = clockwise on screen (y points
//! down), matching the CSS `rotate()` convention.
//!
//! # Pinch Gestures
//!
//! [`PinchBaseline`] records scale, rotation and the two pointer positions at
//! pinch start. Each move derives `scale = baseline.scale * distanceRatio` and
//! `rotation = baseline.rotation + angleDelta`, clamped and wrapped.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Quad};

/// Smallest allowed overlay scale.
pub const MIN_SCALE: f64 = 0.5;
/// Largest allowed overlay scale.
pub const MAX_SCALE: f64 = 3.0;

/// Below this many pixels two pointers are treated as coincident.
const MIN_PINCH_DISTANCE: f64 = 1e-6;

/// Clamp a scale factor to `[MIN_SCALE, MAX_SCALE]`.
///
/// Non-finite input resets to `1.0`.
#[inline]
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Wrap a rotation in degrees to `[0, 360)`.
///
/// Non-finite input resets to `0.0`.
#[inline]
pub fn wrap_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// A 2-D affine matrix in CSS `matrix(a, b, c, d, e, f)` layout:
///
/// ```text
/// x' = a*x + c*y + e
/// y' = b*x + d*y + f
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine2 {
    pub m: [f64; 6],
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }

    /// Apply the transform to a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.m;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        let [a, b, c, d, _, _] = self.m;
        a * d - b * c
    }

    /// Row-major 3x3 homogeneous matrix.
    pub fn to_mat3(&self) -> [f64; 9] {
        let [a, b, c, d, e, f] = self.m;
        [a, c, e, b, d, f, 0.0, 0.0, 1.0]
    }

    /// Column-major 4x4 matrix with identity z pass-through, as consumed by
    /// CSS `matrix3d()` and WebGL uniforms.
    pub fn to_mat4(&self) -> [f64; 16] {
        let [a, b, c, d, e, f] = self.m;
        [
            a, b, 0.0, 0.0, //
            c, d, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            e, f, 0.0, 1.0,
        ]
    }
}

/// Compose translation, scale and rotation about the element center.
///
/// Points are expressed relative to the element center, so the center is the
/// fixed point of scale and rotation. Use [`compose_about`] for element-local
/// pixel coordinates.
pub fn compose(translation: Point, scale: f64, rotation_degrees: f64) -> Affine2 {
    compose_about(translation, scale, rotation_degrees, Point::ORIGIN)
}

/// Compose translation, scale and rotation with `origin` as the fixed point
/// of scale and rotation.
pub fn compose_about(
    translation: Point,
    scale: f64,
    rotation_degrees: f64,
    origin: Point,
) -> Affine2 {
    let (sin, cos) = rotation_degrees.to_radians().sin_cos();
    let a = scale * cos;
    let b = scale * sin;
    let c = -scale * sin;
    let d = scale * cos;
    let e = origin.x + translation.x - (a * origin.x + c * origin.y);
    let f = origin.y + translation.y - (b * origin.x + d * origin.y);
    Affine2 {
        m: [a, b, c, d, e, f],
    }
}

/// Affine placement parameters of one overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineParams {
    /// Offset accumulated from drag gestures (unconstrained)
    pub translation: Point,
    /// Uniform scale (0.5 to 3.0)
    pub scale: f64,
    /// Rotation in degrees (0 to 360)
    pub rotation: f64,
}

impl Default for AffineParams {
    fn default() -> Self {
        Self {
            translation: Point::ORIGIN,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl AffineParams {
    pub fn new(translation: Point, scale: f64, rotation: f64) -> Self {
        Self {
            translation,
            scale: clamp_scale(scale),
            rotation: wrap_rotation(rotation),
        }
    }

    /// Matrix for an element of the given natural size, rotating and
    /// scaling about its center.
    pub fn matrix(&self, width: f64, height: f64) -> Affine2 {
        compose_about(
            self.translation,
            self.scale,
            self.rotation,
            Point::new(width * 0.5, height * 0.5),
        )
    }

    /// The element rectangle mapped through [`AffineParams::matrix`].
    pub fn footprint(&self, width: f64, height: f64) -> Quad {
        let m = self.matrix(width, height);
        Quad::from_size(width, height).map(|p| m.apply(p))
    }
}

/// Scale, rotation and pointer geometry captured when a pinch starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchBaseline {
    pub scale: f64,
    pub rotation: f64,
    /// Inter-pointer distance at pinch start
    pub distance: f64,
    /// Inter-pointer angle at pinch start, in degrees
    pub angle: f64,
}

impl PinchBaseline {
    pub fn begin(scale: f64, rotation: f64, a: Point, b: Point) -> Self {
        Self {
            scale,
            rotation,
            distance: a.distance(b),
            angle: a.angle_to(b),
        }
    }

    /// Resolve `(scale, rotation)` for the current pointer positions.
    ///
    /// Coincident pointers (at start or now) leave the baseline unchanged.
    pub fn resolve(&self, a: Point, b: Point) -> (f64, f64) {
        let distance = a.distance(b);
        if self.distance < MIN_PINCH_DISTANCE || distance < MIN_PINCH_DISTANCE {
            return (clamp_scale(self.scale), wrap_rotation(self.rotation));
        }
        let ratio = distance / self.distance;
        let delta = a.angle_to(b) - self.angle;
        (
            clamp_scale(self.scale * ratio),
            wrap_rotation(self.rotation + delta),
        )
    }
}
