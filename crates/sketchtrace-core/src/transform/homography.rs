//! Four-point homography solver for perspective warping.
//!
//! # Algorithm
//!
//! Direct Linear Transform with the ninth coefficient fixed at 1. Each
//! correspondence `(x, y) -> (u, v)` contributes two rows:
//!
//! ```text
//! [x y 1 0 0 0 -u*x -u*y] · h = u
//! [0 0 0 x y 1 -v*x -v*y] · h = v
//! ```
//!
//! The 8x8 system is solved with Gaussian elimination and partial pivoting.
//! Both point sets are first normalized (centroid at the origin, mean
//! distance sqrt(2)) so the pivots are comparable regardless of image size,
//! and the result is denormalized as `H = Td⁻¹ · Hn · Ts`.
//!
//! # Degeneracy
//!
//! The solve is rejected with [`TransformError::DegenerateWarp`] when
//! - any three destination corners are (nearly) collinear,
//! - the linear system is singular,
//! - the destination quad is folded or concave, so that part of the image
//!   would be projected through the line at infinity.

use serde::{Deserialize, Serialize};

use super::TransformError;
use crate::geometry::{cross, Point, Quad};

/// Default collinearity tolerance: sine of the smallest admissible angle
/// between two edges meeting at a corner.
pub const DEFAULT_COLLINEAR_EPSILON: f64 = 1e-6;

/// Pivot magnitude below which the normalized system counts as singular.
const SINGULAR_PIVOT: f64 = 1e-10;

/// A 3x3 projective matrix, row-major, with `h[2][2] == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: [[f64; 3]; 3],
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            h: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Map a point, returning `None` when it lands on the line at infinity.
    #[inline]
    pub fn apply(&self, p: Point) -> Option<Point> {
        let h = &self.h;
        let w = h[2][0] * p.x + h[2][1] * p.y + h[2][2];
        if w.abs() < 1e-12 {
            return None;
        }
        Some(Point::new(
            (h[0][0] * p.x + h[0][1] * p.y + h[0][2]) / w,
            (h[1][0] * p.x + h[1][1] * p.y + h[1][2]) / w,
        ))
    }

    /// The nine coefficients, row-major.
    pub fn to_array(&self) -> [f64; 9] {
        let h = &self.h;
        [
            h[0][0], h[0][1], h[0][2], h[1][0], h[1][1], h[1][2], h[2][0], h[2][1], h[2][2],
        ]
    }

    /// Column-major 4x4 matrix for 2-D-in-3-D rendering (CSS `matrix3d()`).
    ///
    /// The z row and column are identity pass-through; `w` carries the
    /// perspective terms.
    pub fn to_mat4(&self) -> [f64; 16] {
        let h = &self.h;
        [
            h[0][0], h[1][0], 0.0, h[2][0], //
            h[0][1], h[1][1], 0.0, h[2][1], //
            0.0, 0.0, 1.0, 0.0, //
            h[0][2], h[1][2], 0.0, h[2][2],
        ]
    }
}

/// Solve the homography mapping the natural rectangle `(0,0)..(w,h)` onto
/// `corners`.
pub fn solve(
    width: f64,
    height: f64,
    corners: &Quad,
    collinear_epsilon: f64,
) -> Result<Homography, TransformError> {
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(TransformError::InvalidDimensions { width, height });
    }
    solve_points(
        &Quad::from_size(width, height).points(),
        &corners.points(),
        collinear_epsilon,
    )
}

/// Solve `dst ~ H * src` from four correspondences given in the same corner
/// order.
pub fn solve_points(
    src: &[Point; 4],
    dst: &[Point; 4],
    collinear_epsilon: f64,
) -> Result<Homography, TransformError> {
    if !src.iter().chain(dst.iter()).all(|p| p.is_finite()) {
        return Err(TransformError::DegenerateWarp);
    }
    if has_collinear_triple(src, collinear_epsilon) || has_collinear_triple(dst, collinear_epsilon)
    {
        return Err(TransformError::DegenerateWarp);
    }

    let (src_n, t_src) = normalize_points(src);
    let (dst_n, t_dst) = normalize_points(dst);

    let mut a = [[0.0f64; 8]; 8];
    let mut b = [0.0f64; 8];
    for i in 0..4 {
        let (x, y) = (src_n[i].x, src_n[i].y);
        let (u, v) = (dst_n[i].x, dst_n[i].y);

        a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y];
        b[2 * i] = u;

        a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y];
        b[2 * i + 1] = v;
    }

    let coeffs = solve_linear_system(&mut a, &mut b).ok_or(TransformError::DegenerateWarp)?;
    let hn = [
        [coeffs[0], coeffs[1], coeffs[2]],
        [coeffs[3], coeffs[4], coeffs[5]],
        [coeffs[6], coeffs[7], 1.0],
    ];

    // H = Td^-1 * Hn * Ts
    let h = mat3_mul(&mat3_mul(&invert_normalization(&t_dst), &hn), &t_src);
    let s = h[2][2];
    if s.abs() < 1e-12 || !s.is_finite() {
        return Err(TransformError::DegenerateWarp);
    }
    let mut h = h;
    for row in h.iter_mut() {
        for v in row.iter_mut() {
            *v /= s;
        }
    }
    if !h.iter().flatten().all(|v| v.is_finite()) {
        return Err(TransformError::DegenerateWarp);
    }

    // The projective depth must keep one sign over the source quad, otherwise
    // the destination is folded or concave.
    let depths: Vec<f64> = src
        .iter()
        .map(|p| h[2][0] * p.x + h[2][1] * p.y + h[2][2])
        .collect();
    let positive = depths.iter().all(|w| *w > 1e-12);
    let negative = depths.iter().all(|w| *w < -1e-12);
    if !(positive || negative) {
        return Err(TransformError::DegenerateWarp);
    }

    Ok(Homography { h })
}

/// True when any three of the four points are (nearly) collinear or
/// coincident.
pub fn has_collinear_triple(points: &[Point; 4], epsilon: f64) -> bool {
    (0..4).any(|skip| {
        let mut triple = points
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, p)| *p);
        match (triple.next(), triple.next(), triple.next()) {
            (Some(a), Some(b), Some(c)) => is_collinear(a, b, c, epsilon),
            _ => true,
        }
    })
}

/// Collinearity test normalized by edge lengths, so `epsilon` is the sine of
/// the angle at `a`.
fn is_collinear(a: Point, b: Point, c: Point, epsilon: f64) -> bool {
    let scale = a.distance(b) * a.distance(c);
    if scale < 1e-12 {
        return true;
    }
    cross(a, b, c).abs() <= epsilon * scale
}

fn normalize_points(pts: &[Point; 4]) -> ([Point; 4], [[f64; 3]; 3]) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = [[s, 0.0, -s * cx], [0.0, s, -s * cy], [0.0, 0.0, 1.0]];
    let out = pts.map(|p| Point::new(s * (p.x - cx), s * (p.y - cy)));
    (out, t)
}

/// Inverse of a similarity normalization `[s 0 -s*cx; 0 s -s*cy; 0 0 1]`.
fn invert_normalization(t: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let s = t[0][0];
    let cx = -t[0][2] / s;
    let cy = -t[1][2] / s;
    [[1.0 / s, 0.0, cx], [0.0, 1.0 / s, cy], [0.0, 0.0, 1.0]]
}

fn mat3_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Solve an 8x8 linear system using Gaussian elimination with partial
/// pivoting. Returns `None` when the system is singular.
fn solve_linear_system(a: &mut [[f64; 8]; 8], b: &mut [f64; 8]) -> Option<[f64; 8]> {
    let n = 8;

    for col in 0..n {
        let max_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if max_row != col {
            a.swap(col, max_row);
            b.swap(col, max_row);
        }

        let pivot = a[col][col];
        if pivot.abs() < SINGULAR_PIVOT {
            return None;
        }

        for row in (col + 1)..n {
            let factor = a[row][col] / pivot;
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; 8];
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| a[i][j] * x[j]).sum();
        x[i] = (b[i] - sum) / a[i][i];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = DEFAULT_COLLINEAR_EPSILON;

    fn assert_maps(h: &Homography, src: Point, dst: Point) {
        let mapped = h.apply(src).expect("point should map to a finite location");
        assert!(
            (mapped.x - dst.x).abs() < 1e-6 && (mapped.y - dst.y).abs() < 1e-6,
            "{:?} mapped to {:?}, expected {:?}",
            src,
            mapped,
            dst
        );
    }

    #[test]
    fn test_identity_warp() {
        let h = solve(640.0, 480.0, &Quad::from_size(640.0, 480.0), EPS).unwrap();
        let id = Homography::identity();
        for (got, want) in h.to_array().iter().zip(id.to_array().iter()) {
            assert!((got - want).abs() < 1e-9, "{:?}", h);
        }
    }

    #[test]
    fn test_pure_translation() {
        let corners = Quad::from_size(100.0, 50.0).map(|p| p + Point::new(30.0, -10.0));
        let h = solve(100.0, 50.0, &corners, EPS).unwrap();
        assert!((h.h[0][2] - 30.0).abs() < 1e-9);
        assert!((h.h[1][2] + 10.0).abs() < 1e-9);
        assert!(h.h[2][0].abs() < 1e-12 && h.h[2][1].abs() < 1e-12);
    }

    #[test]
    fn test_perspective_quad_maps_all_corners() {
        let corners = Quad::new(
            Point::new(10.0, 10.0),
            Point::new(90.0, 0.0),
            Point::new(100.0, 90.0),
            Point::new(0.0, 100.0),
        );
        let h = solve(100.0, 100.0, &corners, EPS).unwrap();
        let src = Quad::from_size(100.0, 100.0);
        for (s, d) in src.points().iter().zip(corners.points().iter()) {
            assert_maps(&h, *s, *d);
        }
    }

    #[test]
    fn test_large_image_keeps_precision() {
        let corners = Quad::new(
            Point::new(120.0, 80.0),
            Point::new(3900.0, 200.0),
            Point::new(3700.0, 2900.0),
            Point::new(300.0, 3100.0),
        );
        let h = solve(4032.0, 3024.0, &corners, EPS).unwrap();
        let src = Quad::from_size(4032.0, 3024.0);
        for (s, d) in src.points().iter().zip(corners.points().iter()) {
            assert_maps(&h, *s, *d);
        }
    }

    #[test]
    fn test_three_collinear_corners_are_degenerate() {
        let corners = Quad::new(
            Point::new(0.0, 0.0),
            Point::new(50.0, 50.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        );
        assert!(matches!(
            solve(100.0, 100.0, &corners, EPS),
            Err(TransformError::DegenerateWarp)
        ));
    }

    #[test]
    fn test_coincident_corners_are_degenerate() {
        let p = Point::new(10.0, 10.0);
        let corners = Quad::new(p, p, Point::new(100.0, 100.0), Point::new(0.0, 100.0));
        assert!(matches!(
            solve(100.0, 100.0, &corners, EPS),
            Err(TransformError::DegenerateWarp)
        ));
    }

    #[test]
    fn test_bowtie_quad_is_degenerate() {
        // tr and br swapped: the quad folds over itself
        let corners = Quad::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
        );
        assert!(matches!(
            solve(100.0, 100.0, &corners, EPS),
            Err(TransformError::DegenerateWarp)
        ));
    }

    #[test]
    fn test_concave_quad_is_degenerate() {
        let corners = Quad::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(30.0, 30.0),
            Point::new(0.0, 100.0),
        );
        assert!(matches!(
            solve(100.0, 100.0, &corners, EPS),
            Err(TransformError::DegenerateWarp)
        ));
    }

    #[test]
    fn test_non_finite_corner_is_degenerate() {
        let mut corners = Quad::from_size(10.0, 10.0);
        corners.tl = Point::new(f64::NAN, 0.0);
        assert!(matches!(
            solve(10.0, 10.0, &corners, EPS),
            Err(TransformError::DegenerateWarp)
        ));
    }

    #[test]
    fn test_invalid_dimensions() {
        let corners = Quad::from_size(10.0, 10.0);
        assert!(matches!(
            solve(0.0, 10.0, &corners, EPS),
            Err(TransformError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_to_mat4_layout() {
        let h = Homography {
            h: [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
        };
        assert_eq!(
            h.to_mat4(),
            [1.0, 4.0, 0.0, 7.0, 2.0, 5.0, 0.0, 8.0, 0.0, 0.0, 1.0, 0.0, 3.0, 6.0, 0.0, 9.0]
        );
    }

    #[test]
    fn test_apply_at_infinity() {
        let h = Homography {
            h: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
        };
        assert!(h.apply(Point::new(0.0, 5.0)).is_none());
    }

    #[test]
    fn test_collinear_triple_detection() {
        let square = Quad::from_size(1.0, 1.0).points();
        assert!(!has_collinear_triple(&square, EPS));

        let line = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 1.0),
        ];
        assert!(has_collinear_triple(&line, EPS));
    }
}
