//! Planar geometry value types.
//!
//! Coordinates are in scene pixel-space. All types here are immutable value
//! types; the vision kernel borrows them read-only and never mutates scene
//! state.

use serde::{Deserialize, Serialize};

/// A position in scene pixel-space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point2D) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Angle of the vector from `self` to `other`, in radians (atan2 range).
    pub fn angle_to(&self, other: Point2D) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// The point at `distance` from `self` along `angle` (radians).
    pub fn project(&self, angle: f64, distance: f64) -> Point2D {
        Point2D {
            x: self.x + angle.cos() * distance,
            y: self.y + angle.sin() * distance,
        }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// 2D cross product of the vectors `self -> a` and `self -> b`.
    pub fn cross(&self, a: Point2D, b: Point2D) -> f64 {
        (a.x - self.x) * (b.y - self.y) - (a.y - self.y) * (b.x - self.x)
    }
}

/// A single opaque line segment, as decomposed from a wall's point list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point2D,
    pub b: Point2D,
}

impl Segment {
    pub fn new(a: Point2D, b: Point2D) -> Self {
        Self { a, b }
    }

    /// Shortest distance from the segment to a point.
    pub fn distance_to_point(&self, p: Point2D) -> f64 {
        let dx = self.b.x - self.a.x;
        let dy = self.b.y - self.a.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.a.distance_to(p);
        }
        let t = (((p.x - self.a.x) * dx + (p.y - self.a.y) * dy) / len_sq).clamp(0.0, 1.0);
        let closest = Point2D::new(self.a.x + t * dx, self.a.y + t * dy);
        closest.distance_to(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_angle_to_cardinal_directions() {
        let o = Point2D::new(0.0, 0.0);
        assert!((o.angle_to(Point2D::new(1.0, 0.0))).abs() < 1e-12);
        assert!((o.angle_to(Point2D::new(0.0, 1.0)) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_project_roundtrip() {
        let o = Point2D::new(10.0, -2.0);
        let p = o.project(1.25, 40.0);
        assert!((o.distance_to(p) - 40.0).abs() < 1e-9);
        assert!((o.angle_to(p) - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_is_finite() {
        assert!(Point2D::new(1.0, 2.0).is_finite());
        assert!(!Point2D::new(f64::NAN, 2.0).is_finite());
        assert!(!Point2D::new(1.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_segment_distance_to_point() {
        let seg = Segment::new(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0));
        assert!((seg.distance_to_point(Point2D::new(5.0, 3.0)) - 3.0).abs() < 1e-12);
        // Beyond the endpoint the distance is to the endpoint itself
        assert!((seg.distance_to_point(Point2D::new(13.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}
