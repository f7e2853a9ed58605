//! Plain 2-D geometry shared by the gesture, transform and overlay modules.
//!
//! All coordinates are `f64` display pixels with the origin at the top-left
//! and y pointing down, matching the coordinate space of pointer events.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A point (or offset) in display space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Length of the vector from the origin to this point.
    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Angle of the vector `self -> other` in degrees, measured clockwise
    /// from the +x axis (y points down).
    #[inline]
    pub fn angle_to(self, other: Point) -> f64 {
        let d = other - self;
        d.y.atan2(d.x).to_degrees()
    }

    /// Midpoint between two points.
    #[inline]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Z component of the cross product `(b - a) x (c - a)`.
#[inline]
pub fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// One of the four corners of an image quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    #[serde(rename = "tl")]
    TopLeft,
    #[serde(rename = "tr")]
    TopRight,
    #[serde(rename = "br")]
    BottomRight,
    #[serde(rename = "bl")]
    BottomLeft,
}

impl Corner {
    /// Corners in quad order: tl, tr, br, bl.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Parse the short handle names used by the front end.
    pub fn from_name(name: &str) -> Option<Corner> {
        match name {
            "tl" => Some(Corner::TopLeft),
            "tr" => Some(Corner::TopRight),
            "br" => Some(Corner::BottomRight),
            "bl" => Some(Corner::BottomLeft),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Corner::TopLeft => "tl",
            Corner::TopRight => "tr",
            Corner::BottomRight => "br",
            Corner::BottomLeft => "bl",
        }
    }
}

/// Four corner positions `{tl, tr, br, bl}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quad {
    pub tl: Point,
    pub tr: Point,
    pub br: Point,
    pub bl: Point,
}

impl Quad {
    pub fn new(tl: Point, tr: Point, br: Point, bl: Point) -> Self {
        Self { tl, tr, br, bl }
    }

    /// The axis-aligned rectangle `(0,0), (w,0), (w,h), (0,h)`.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self {
            tl: Point::new(0.0, 0.0),
            tr: Point::new(width, 0.0),
            br: Point::new(width, height),
            bl: Point::new(0.0, height),
        }
    }

    /// Corners in quad order: tl, tr, br, bl.
    pub fn points(&self) -> [Point; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => self.tl,
            Corner::TopRight => self.tr,
            Corner::BottomRight => self.br,
            Corner::BottomLeft => self.bl,
        }
    }

    pub fn set_corner(&mut self, corner: Corner, p: Point) {
        match corner {
            Corner::TopLeft => self.tl = p,
            Corner::TopRight => self.tr = p,
            Corner::BottomRight => self.br = p,
            Corner::BottomLeft => self.bl = p,
        }
    }

    /// Apply `f` to every corner.
    pub fn map(&self, mut f: impl FnMut(Point) -> Point) -> Quad {
        Quad::new(f(self.tl), f(self.tr), f(self.br), f(self.bl))
    }

    pub fn is_finite(&self) -> bool {
        self.points().iter().all(|p| p.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(3.0, 4.0);
        let b = Point::new(1.0, 1.0);
        assert_eq!(a - b, Point::new(2.0, 3.0));
        assert_eq!(a + b, Point::new(4.0, 5.0));
        assert!((Point::ORIGIN.distance(a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_angle_to_is_clockwise_in_screen_space() {
        let o = Point::ORIGIN;
        assert!((o.angle_to(Point::new(1.0, 0.0)) - 0.0).abs() < 1e-12);
        // y down: a point below the origin is at +90 degrees
        assert!((o.angle_to(Point::new(0.0, 1.0)) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_cross_sign() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        assert!(cross(a, b, Point::new(0.0, 1.0)) > 0.0);
        assert!(cross(a, b, Point::new(0.0, -1.0)) < 0.0);
        assert_eq!(cross(a, b, Point::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_quad_from_size_order() {
        let q = Quad::from_size(4.0, 2.0);
        assert_eq!(
            q.points(),
            [
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 2.0),
                Point::new(0.0, 2.0)
            ]
        );
    }

    #[test]
    fn test_quad_set_corner() {
        let mut q = Quad::from_size(10.0, 10.0);
        q.set_corner(Corner::BottomLeft, Point::new(-1.0, 12.0));
        assert_eq!(q.corner(Corner::BottomLeft), Point::new(-1.0, 12.0));
        assert_eq!(q.corner(Corner::TopLeft), Point::ORIGIN);
    }

    #[test]
    fn test_corner_names_round_trip() {
        for corner in Corner::ALL {
            assert_eq!(Corner::from_name(corner.name()), Some(corner));
        }
        assert_eq!(Corner::from_name("middle"), None);
    }

    #[test]
    fn test_quad_serializes_with_short_keys() {
        let q = Quad::from_size(1.0, 1.0);
        let json = serde_json::to_value(q).unwrap();
        assert!(json.get("tl").is_some());
        assert!(json.get("br").is_some());
    }
}
