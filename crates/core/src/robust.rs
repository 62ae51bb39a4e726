//! Robust geometric predicates.
//!
//! Orientation tests use Shewchuk's adaptive precision arithmetic (via the
//! `robust` crate), so the collision checks built on top of them do not flip
//! their answer for nearly collinear input.
//!
//! ## Example
//!
//! ```rust
//! use strip_nesting_core::robust::{orient2d, Orientation};
//!
//! let a = (0.0, 0.0);
//! let b = (1.0, 0.0);
//! let c = (0.5, 1.0);
//!
//! assert_eq!(orient2d(a, b, c), Orientation::CounterClockwise);
//! ```

use robust::{orient2d as robust_orient2d, Coord};

/// Result of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Points are arranged counter-clockwise (left turn).
    CounterClockwise,
    /// Points are arranged clockwise (right turn).
    Clockwise,
    /// Points are collinear.
    Collinear,
}

impl Orientation {
    /// Returns true if the orientation is counter-clockwise.
    #[inline]
    pub fn is_ccw(self) -> bool {
        matches!(self, Orientation::CounterClockwise)
    }

    /// Returns true if the orientation is clockwise.
    #[inline]
    pub fn is_cw(self) -> bool {
        matches!(self, Orientation::Clockwise)
    }

    /// Returns true if the points are collinear.
    #[inline]
    pub fn is_collinear(self) -> bool {
        matches!(self, Orientation::Collinear)
    }
}

/// Location of a point relative to a closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Strictly inside.
    Inside,
    /// On an edge or vertex.
    Boundary,
    /// Strictly outside.
    Outside,
}

/// Determines the orientation of three 2D points.
///
/// Returns `CounterClockwise` if `pc` lies to the left of the directed line
/// from `pa` to `pb`, `Clockwise` if it lies to the right.
#[inline]
pub fn orient2d(pa: (f64, f64), pb: (f64, f64), pc: (f64, f64)) -> Orientation {
    let result = robust_orient2d(
        Coord { x: pa.0, y: pa.1 },
        Coord { x: pb.0, y: pb.1 },
        Coord { x: pc.0, y: pc.1 },
    );

    if result > 0.0 {
        Orientation::CounterClockwise
    } else if result < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Returns true if `p` lies on the closed segment `a`-`b`.
pub fn point_on_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
    orient2d(a, b, p).is_collinear()
        && p.0 >= a.0.min(b.0)
        && p.0 <= a.0.max(b.0)
        && p.1 >= a.1.min(b.1)
        && p.1 <= a.1.max(b.1)
}

/// Returns true if the closed segments `a1`-`a2` and `b1`-`b2` share a point.
pub fn segments_intersect(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> bool {
    let o1 = orient2d(a1, a2, b1);
    let o2 = orient2d(a1, a2, b2);
    let o3 = orient2d(b1, b2, a1);
    let o4 = orient2d(b1, b2, a2);

    if o1 != o2 && o3 != o4 && !o1.is_collinear() && !o2.is_collinear() {
        return true;
    }
    if o1 != o2 && o3 != o4 && !o3.is_collinear() && !o4.is_collinear() {
        return true;
    }

    point_on_segment(b1, a1, a2)
        || point_on_segment(b2, a1, a2)
        || point_on_segment(a1, b1, b2)
        || point_on_segment(a2, b1, b2)
}

/// Distance from point `p` to the closed segment `a`-`b`.
pub fn point_segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return ((p.0 - a.0).powi(2) + (p.1 - a.1).powi(2)).sqrt();
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Minimum distance between two closed segments.
pub fn segment_distance(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    point_segment_distance(a1, b1, b2)
        .min(point_segment_distance(a2, b1, b2))
        .min(point_segment_distance(b1, a1, a2))
        .min(point_segment_distance(b2, a1, a2))
}

/// Classifies a point against a closed ring (either winding).
pub fn locate_point(point: (f64, f64), ring: &[(f64, f64)]) -> Location {
    let n = ring.len();
    if n < 3 {
        return Location::Outside;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[j], ring[i]);
        if point_on_segment(point, a, b) {
            return Location::Boundary;
        }
        if (b.1 > point.1) != (a.1 > point.1) {
            // Crossing test via orientation keeps the decision exact.
            let o = orient2d(a, b, point);
            let upward = b.1 > a.1;
            if (upward && o.is_ccw()) || (!upward && o.is_cw()) {
                inside = !inside;
            }
        }
        j = i;
    }

    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}
