//! 2D polygon helpers and part profiles.
//!
//! Polygons are plain `Vec<(f64, f64)>` rings without a repeated closing
//! vertex. A [`Part`] holds one [`OrientedProfile`] per allowed angle: the
//! footprint used for packing (`inflated`) and the outline it came from
//! (`original`), both translated so the footprint's bounding box starts at
//! the origin.

use geo::{Area, Centroid, Coord, LineString, Polygon as GeoPolygon, Simplify};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use strip_nesting_core::robust::segments_intersect;
use strip_nesting_core::{Config, Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Areas below this are treated as degenerate.
const MIN_AREA: f64 = 1e-9;

/// Miter limit used when inflating outlines by half the spacing.
pub const PROFILE_MITER_LIMIT: f64 = 5.0;

/// Integer key of an angle in millidegrees.
#[inline]
pub fn angle_key(degrees: f64) -> i32 {
    (degrees * 1000.0).round() as i32
}

/// Signed area of a ring (positive when counter-clockwise).
pub fn signed_area(polygon: &[(f64, f64)]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let (x1, y1) = polygon[i];
        let (x2, y2) = polygon[(i + 1) % n];
        area += x1 * y2 - x2 * y1;
    }
    area / 2.0
}

/// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
pub fn bounding_box(polygon: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &(x, y) in polygon {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    (min_x, min_y, max_x, max_y)
}

/// Translates every vertex by `(dx, dy)`.
pub fn translate(polygon: &[(f64, f64)], dx: f64, dy: f64) -> Vec<(f64, f64)> {
    polygon.iter().map(|&(x, y)| (x + dx, y + dy)).collect()
}

/// Moves the polygon so its bounding box starts at the origin.
pub fn normalize(polygon: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let (min_x, min_y, _, _) = bounding_box(polygon);
    translate(polygon, -min_x, -min_y)
}

/// Returns the ring in counter-clockwise order.
pub fn ensure_ccw(polygon: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if signed_area(polygon) < 0.0 {
        polygon.iter().rev().copied().collect()
    } else {
        polygon.to_vec()
    }
}

/// Converts to a geo crate Polygon.
pub fn to_geo_polygon(polygon: &[(f64, f64)]) -> GeoPolygon<f64> {
    let exterior = LineString::from(
        polygon
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect::<Vec<_>>(),
    );
    GeoPolygon::new(exterior, vec![])
}

/// Rotates a polygon about its area centroid by `degrees`.
pub fn rotate_about_centroid(polygon: &[(f64, f64)], degrees: f64) -> Vec<(f64, f64)> {
    if degrees.abs() < 1e-10 {
        return polygon.to_vec();
    }

    let (cx, cy) = to_geo_polygon(polygon)
        .centroid()
        .map(|c| (c.x(), c.y()))
        .unwrap_or((0.0, 0.0));
    let (sin_a, cos_a) = degrees.to_radians().sin_cos();

    polygon
        .iter()
        .map(|&(x, y)| {
            let (dx, dy) = (x - cx, y - cy);
            (cx + dx * cos_a - dy * sin_a, cy + dx * sin_a + dy * cos_a)
        })
        .collect()
}

/// Rejects rings with fewer than 3 points, non-finite coordinates or no area.
pub fn validate_polygon(polygon: &[(f64, f64)], what: &str) -> Result<()> {
    check_vertices(polygon, what)?;
    if signed_area(polygon).abs() < MIN_AREA {
        return Err(Error::InvalidGeometry(format!("{} has zero area", what)));
    }
    Ok(())
}

fn check_vertices(polygon: &[(f64, f64)], what: &str) -> Result<()> {
    if polygon.len() < 3 {
        return Err(Error::InvalidGeometry(format!(
            "{} must have at least 3 vertices, got {}",
            what,
            polygon.len()
        )));
    }
    if polygon.iter().any(|&(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(Error::InvalidGeometry(format!(
            "{} has non-finite coordinates",
            what
        )));
    }
    Ok(())
}

/// Drops consecutive duplicate vertices (including the closing one).
fn dedup_ring(polygon: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut ring: Vec<(f64, f64)> = Vec::with_capacity(polygon.len());
    for &p in polygon {
        if ring.last().map_or(true, |&q| q != p) {
            ring.push(p);
        }
    }
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Outward offset of a ring with mitered joins.
///
/// Convex corners whose miter would reach farther than `miter_limit * delta`
/// are squared off: the corner is cut perpendicular to its bisector at
/// distance `delta` from the vertex, so the result still contains every
/// point within `delta` of the ring. Concave corners may leave small
/// reversed loops; pass the result through [`union_nonzero`] to resolve them.
pub fn offset_polygon(polygon: &[(f64, f64)], delta: f64, miter_limit: f64) -> Vec<(f64, f64)> {
    let ring = ensure_ccw(&dedup_ring(polygon));
    let n = ring.len();
    if n < 3 || delta == 0.0 {
        return ring;
    }

    let direction = |a: (f64, f64), b: (f64, f64)| {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = (dx * dx + dy * dy).sqrt();
        (dx / len, dy / len)
    };
    let dot = |a: (f64, f64), b: (f64, f64)| a.0 * b.0 + a.1 * b.1;

    let mut out = Vec::with_capacity(n * 2);
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let curr = ring[i];
        let next = ring[(i + 1) % n];

        let d1 = direction(prev, curr);
        let d2 = direction(curr, next);
        let n1 = (d1.1, -d1.0);
        let n2 = (d2.1, -d2.0);
        let cos_turn = dot(n1, n2);
        let cross = n1.0 * n2.1 - n1.1 * n2.0;

        let p1 = (curr.0 + n1.0 * delta, curr.1 + n1.1 * delta);
        let p2 = (curr.0 + n2.0 * delta, curr.1 + n2.1 * delta);

        // Concave corner (for a positive delta): the offset edges cross.
        if cross * delta < 0.0 {
            out.push(p1);
            out.push(curr);
            out.push(p2);
            continue;
        }

        let denom = 1.0 + cos_turn;
        if denom >= 1e-12 && (2.0 / denom).sqrt() <= miter_limit {
            let k = delta / denom;
            out.push((curr.0 + (n1.0 + n2.0) * k, curr.1 + (n1.1 + n2.1) * k));
            continue;
        }

        // Square join. A reversing spike has no bisector; cut along its direction.
        let bisector = if denom < 1e-12 {
            d1
        } else {
            let (bx, by) = (n1.0 + n2.0, n1.1 + n2.1);
            let len = (bx * bx + by * by).sqrt();
            (bx / len, by / len)
        };
        let t1 = delta * (1.0 - dot(n1, bisector)) / dot(d1, bisector);
        let t2 = delta * (1.0 - dot(n2, bisector)) / dot(d2, bisector);
        out.push((p1.0 + d1.0 * t1, p1.1 + d1.1 * t1));
        out.push((p2.0 + d2.0 * t2, p2.1 + d2.1 * t2));
    }

    dedup_ring(&out)
}

/// Unions contours with the non-zero fill rule.
///
/// Returns shapes, each an outer contour followed by its holes.
pub(crate) fn union_nonzero(contours: Vec<Vec<(f64, f64)>>) -> Vec<Vec<Vec<(f64, f64)>>> {
    let subject: Vec<Vec<[f64; 2]>> = contours
        .into_iter()
        .filter(|c| c.len() >= 3)
        .map(|c| c.into_iter().map(|(x, y)| [x, y]).collect())
        .collect();

    let Some(first) = subject.first() else {
        return Vec::new();
    };
    // Non-zero union with a copy of one member leaves the union unchanged.
    let clip: Vec<Vec<[f64; 2]>> = vec![first.clone()];

    let shapes = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);

    shapes
        .into_iter()
        .map(|shape| {
            shape
                .into_iter()
                .filter(|contour| contour.len() >= 3)
                .map(|contour| contour.into_iter().map(|[x, y]| (x, y)).collect())
                .collect::<Vec<Vec<(f64, f64)>>>()
        })
        .filter(|shape| !shape.is_empty())
        .collect()
}

/// Outward miter offset followed by a cleanup union, keeping the largest outer contour.
pub fn inflate(polygon: &[(f64, f64)], delta: f64, miter_limit: f64) -> Result<Vec<(f64, f64)>> {
    if delta <= 0.0 {
        return Ok(polygon.to_vec());
    }
    let raw = offset_polygon(polygon, delta, miter_limit);
    largest_outer(vec![raw]).ok_or_else(|| Error::InvalidGeometry("offset produced no contour".into()))
}

/// Largest outer contour of the non-zero union of `contours`.
fn largest_outer(contours: Vec<Vec<(f64, f64)>>) -> Option<Vec<(f64, f64)>> {
    union_nonzero(contours)
        .into_iter()
        .filter_map(|mut shape| {
            if shape.is_empty() {
                None
            } else {
                Some(shape.swap_remove(0))
            }
        })
        .max_by(|a, b| {
            signed_area(a)
                .abs()
                .partial_cmp(&signed_area(b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Returns true if no two non-adjacent edges of the ring touch.
pub fn is_simple(polygon: &[(f64, f64)]) -> bool {
    let n = polygon.len();
    for i in 0..n {
        let (a1, a2) = (polygon[i], polygon[(i + 1) % n]);
        for j in i + 2..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments_intersect(a1, a2, polygon[j], polygon[(j + 1) % n]) {
                return false;
            }
        }
    }
    true
}

/// Cleans a raw outline before it becomes a part.
///
/// A self-intersecting ring is resolved with a non-zero union and only its
/// largest piece is kept. With a positive `tolerance` the ring is then
/// simplified (Ramer-Douglas-Peucker); a simplification that degenerates or
/// crosses itself is repaired again, and dropped if that still fails.
pub fn prepare_outline(outline: &[(f64, f64)], tolerance: f64, what: &str) -> Result<Vec<(f64, f64)>> {
    check_vertices(outline, what)?;
    let ring = repair(&dedup_ring(outline), what)?;

    if tolerance <= 0.0 || ring.len() <= 3 {
        return Ok(ring);
    }

    let mut coords = to_geo_polygon(&ring).simplify(&tolerance).exterior().0.clone();
    coords.pop();
    let simplified: Vec<(f64, f64)> = coords.into_iter().map(|c| (c.x, c.y)).collect();

    match repair(&simplified, what) {
        Ok(simplified) => Ok(simplified),
        Err(e) => {
            log::debug!("{}: keeping the unsimplified outline ({})", what, e);
            Ok(ring)
        }
    }
}

fn repair(ring: &[(f64, f64)], what: &str) -> Result<Vec<(f64, f64)>> {
    let ring = if ring.len() >= 3 && is_simple(ring) {
        ring.to_vec()
    } else {
        log::debug!("{} crosses itself, keeping its largest piece", what);
        largest_outer(vec![ring.to_vec()]).unwrap_or_default()
    };
    validate_polygon(&ring, what)?;
    Ok(ensure_ccw(&ring))
}

/// A part at one rotation angle.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientedProfile {
    /// Rotation angle in degrees.
    pub angle: f64,
    /// Spacing-inflated footprint, bounding box at the origin.
    pub inflated: Vec<(f64, f64)>,
    /// Original outline, in the same frame as `inflated`.
    pub original: Vec<(f64, f64)>,
    /// Footprint width.
    pub width: f64,
    /// Footprint height.
    pub height: f64,
}

impl OrientedProfile {
    /// Creates a profile, moving both polygons so the footprint starts at the origin.
    pub fn new(angle: f64, inflated: Vec<(f64, f64)>, original: Vec<(f64, f64)>) -> Result<Self> {
        validate_polygon(&inflated, "inflated polygon")?;
        validate_polygon(&original, "original polygon")?;

        let (min_x, min_y, max_x, max_y) = bounding_box(&inflated);
        Ok(Self {
            angle,
            inflated: translate(&inflated, -min_x, -min_y),
            original: translate(&original, -min_x, -min_y),
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    /// Area of the original outline.
    pub fn original_area(&self) -> f64 {
        to_geo_polygon(&self.original).unsigned_area()
    }
}

/// An immutable part: one profile per allowed angle plus its reference area.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Part {
    id: usize,
    area: f64,
    profiles: Vec<OrientedProfile>,
}

impl Part {
    /// Creates a part from precomputed profiles.
    pub fn new(id: usize, area: f64, profiles: Vec<OrientedProfile>) -> Result<Self> {
        if profiles.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "part {} has no oriented profile",
                id
            )));
        }
        if !area.is_finite() || area <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "part {} has invalid reference area {}",
                id, area
            )));
        }
        Ok(Self { id, area, profiles })
    }

    /// Builds every oriented profile from a single outline.
    ///
    /// Each angle rotates the outline about its centroid and inflates it by
    /// `spacing / 2` with a mitered join. With zero spacing the footprint is
    /// the outline itself. A self-intersecting outline is reduced to its
    /// largest simple piece first; see [`prepare_outline`].
    pub fn from_outline(
        id: usize,
        outline: &[(f64, f64)],
        angles: &[f64],
        spacing: f64,
    ) -> Result<Self> {
        Self::from_prepared(id, outline, angles, spacing, 0.0)
    }

    /// Builds a part with the angles, spacing and simplification tolerance of `config`.
    pub fn from_config(id: usize, outline: &[(f64, f64)], config: &Config) -> Result<Self> {
        Self::from_prepared(
            id,
            outline,
            &config.allowed_angles,
            config.spacing,
            config.simplify_tolerance,
        )
    }

    fn from_prepared(
        id: usize,
        outline: &[(f64, f64)],
        angles: &[f64],
        spacing: f64,
        tolerance: f64,
    ) -> Result<Self> {
        if angles.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "part {} has no rotation angle",
                id
            )));
        }

        let outline = prepare_outline(outline, tolerance, &format!("outline of part {}", id))?;
        let area = to_geo_polygon(&outline).unsigned_area();

        let mut profiles = Vec::with_capacity(angles.len());
        for &angle in angles {
            let original = normalize(&rotate_about_centroid(&outline, angle));
            let inflated = inflate(&original, spacing / 2.0, PROFILE_MITER_LIMIT)?;
            profiles.push(OrientedProfile::new(angle, inflated, original)?);
        }

        Self::new(id, area, profiles)
    }

    /// Axis-aligned rectangle part.
    pub fn rectangle(id: usize, width: f64, height: f64, angles: &[f64], spacing: f64) -> Result<Self> {
        Self::from_outline(
            id,
            &[(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)],
            angles,
            spacing,
        )
    }

    /// Part identifier.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Reference area, used to rank parts big-first.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// All oriented profiles.
    pub fn profiles(&self) -> &[OrientedProfile] {
        &self.profiles
    }

    /// Profile at the given angle, if the part has one.
    pub fn profile(&self, angle: f64) -> Option<&OrientedProfile> {
        let key = angle_key(angle);
        self.profiles.iter().find(|p| angle_key(p.angle) == key)
    }

    /// Angles (in profile order) whose footprint fits in the strip width.
    pub fn feasible_angles(&self, bin_width: f64) -> Vec<f64> {
        self.profiles
            .iter()
            .filter(|p| p.width <= bin_width + 1e-9)
            .map(|p| p.angle)
            .collect()
    }

    /// Narrowest footprint over all profiles.
    pub fn min_width(&self) -> f64 {
        self.profiles
            .iter()
            .map(|p| p.width)
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strip_nesting_core::robust::{locate_point, Location};

    fn rect(w: f64, h: f64) -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
    }

    fn l_shape() -> Vec<(f64, f64)> {
        vec![
            (0.0, 0.0),
            (20.0, 0.0),
            (20.0, 10.0),
            (10.0, 10.0),
            (10.0, 20.0),
            (0.0, 20.0),
        ]
    }

    #[test]
    fn test_signed_area() {
        assert_relative_eq!(signed_area(&rect(10.0, 5.0)), 50.0);
        let cw: Vec<_> = rect(10.0, 5.0).into_iter().rev().collect();
        assert_relative_eq!(signed_area(&cw), -50.0);
    }

    #[test]
    fn test_normalize() {
        let poly = translate(&rect(10.0, 5.0), 7.0, -3.0);
        let (min_x, min_y, max_x, max_y) = bounding_box(&normalize(&poly));
        assert_relative_eq!(min_x, 0.0);
        assert_relative_eq!(min_y, 0.0);
        assert_relative_eq!(max_x, 10.0);
        assert_relative_eq!(max_y, 5.0);
    }

    #[test]
    fn test_rotate_about_centroid() {
        let rotated = rotate_about_centroid(&rect(10.0, 4.0), 90.0);
        let (min_x, min_y, max_x, max_y) = bounding_box(&rotated);
        assert_relative_eq!(max_x - min_x, 4.0, epsilon = 1e-9);
        assert_relative_eq!(max_y - min_y, 10.0, epsilon = 1e-9);
        assert_relative_eq!((min_x + max_x) / 2.0, 5.0, epsilon = 1e-9);
        assert_relative_eq!((min_y + max_y) / 2.0, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_offset_rectangle_is_mitered() {
        let grown = offset_polygon(&rect(10.0, 10.0), 1.0, 2.0);
        assert_eq!(grown.len(), 4);
        let (min_x, min_y, max_x, max_y) = bounding_box(&grown);
        assert_relative_eq!(min_x, -1.0, epsilon = 1e-9);
        assert_relative_eq!(min_y, -1.0, epsilon = 1e-9);
        assert_relative_eq!(max_x, 11.0, epsilon = 1e-9);
        assert_relative_eq!(max_y, 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inflate_concave_outline() {
        let grown = inflate(&l_shape(), 1.0, PROFILE_MITER_LIMIT).unwrap();
        // area 300 + perimeter 80, five convex corners add 1 each, the concave one loses 1
        assert_relative_eq!(signed_area(&grown).abs(), 384.0, epsilon = 1e-6);
    }

    fn sliver() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (40.0, 0.0), (0.0, 8.0)]
    }

    fn assert_covers_disks(grown: &[(f64, f64)], outline: &[(f64, f64)], radius: f64) {
        for &(vx, vy) in outline {
            for k in 0..72 {
                let a = (k as f64 * 5.0).to_radians();
                let p = (vx + radius * a.cos(), vy + radius * a.sin());
                assert_ne!(
                    locate_point(p, grown),
                    Location::Outside,
                    "({:.3}, {:.3}) is within {} of ({}, {})",
                    p.0,
                    p.1,
                    radius,
                    vx,
                    vy
                );
            }
        }
    }

    #[test]
    fn test_offset_sharp_corner_is_squared() {
        let grown = offset_polygon(&sliver(), 1.0, 2.0);
        assert_covers_disks(&grown, &sliver(), 0.999);

        // A full miter at the 11 degree tip would reach about 10 past it.
        let (_, _, max_x, _) = bounding_box(&grown);
        assert!(max_x > 40.99 && max_x < 42.0, "max_x = {}", max_x);
    }

    #[test]
    fn test_inflate_sharp_outline_keeps_clearance() {
        let grown = inflate(&sliver(), 1.5, PROFILE_MITER_LIMIT).unwrap();
        assert_covers_disks(&grown, &sliver(), 1.499);
        assert!(signed_area(&grown).abs() > signed_area(&sliver()).abs());
    }

    #[test]
    fn test_prepare_outline_keeps_largest_piece() {
        let bowtie = vec![(0.0, 0.0), (20.0, 10.0), (20.0, 0.0), (0.0, 4.0)];
        assert!(!is_simple(&bowtie));

        let repaired = prepare_outline(&bowtie, 0.0, "bowtie").unwrap();
        assert!(is_simple(&repaired));
        assert!(signed_area(&repaired) > 0.0);
        assert_relative_eq!(signed_area(&repaired), 500.0 / 7.0, epsilon = 1e-3);

        let part = Part::from_outline(4, &bowtie, &[0.0], 0.0).unwrap();
        assert_relative_eq!(part.area(), 500.0 / 7.0, epsilon = 1e-3);
    }

    #[test]
    fn test_prepare_outline_simplifies() {
        let mut ragged = vec![(0.0, 0.0), (50.0, 0.0), (50.0, 20.0)];
        for i in (1..50).rev() {
            let bump = if i % 2 == 0 { 0.1 } else { 0.0 };
            ragged.push((i as f64, 20.0 + bump));
        }
        ragged.push((0.0, 20.0));

        let kept = prepare_outline(&ragged, 0.0, "ragged").unwrap();
        assert_eq!(kept.len(), ragged.len());

        let simplified = prepare_outline(&ragged, 0.5, "ragged").unwrap();
        assert!(simplified.len() <= 6, "{} vertices left", simplified.len());
        assert_relative_eq!(signed_area(&simplified), 1000.0, epsilon = 5.0);

        let config = Config::new().with_angles(vec![0.0]).with_spacing(0.0);
        let part = Part::from_config(0, &ragged, &config).unwrap();
        assert!(part.profiles()[0].original.len() <= 6);
    }

    #[test]
    fn test_prepare_outline_rejects_degenerate() {
        assert!(prepare_outline(&[(0.0, 0.0), (1.0, 1.0)], 0.5, "segment").is_err());
        assert!(prepare_outline(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], 0.0, "flat").is_err());
    }

    #[test]
    fn test_validate_polygon() {
        assert!(validate_polygon(&rect(1.0, 1.0), "rect").is_ok());
        assert!(matches!(
            validate_polygon(&[(0.0, 0.0), (1.0, 0.0)], "segment"),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(validate_polygon(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], "flat").is_err());
        assert!(validate_polygon(&[(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)], "nan").is_err());
    }

    #[test]
    fn test_part_from_outline() {
        let part = Part::from_outline(3, &rect(100.0, 50.0), &[0.0, 90.0], 4.0).unwrap();
        assert_eq!(part.id(), 3);
        assert_relative_eq!(part.area(), 5000.0);

        let upright = part.profile(0.0).unwrap();
        assert_relative_eq!(upright.width, 104.0, epsilon = 1e-6);
        assert_relative_eq!(upright.height, 54.0, epsilon = 1e-6);
        assert_relative_eq!(upright.original_area(), 5000.0, epsilon = 1e-6);
        let (min_x, min_y, _, _) = bounding_box(&upright.original);
        assert_relative_eq!(min_x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(min_y, 2.0, epsilon = 1e-6);

        let turned = part.profile(90.0).unwrap();
        assert_relative_eq!(turned.width, 54.0, epsilon = 1e-6);
        assert_relative_eq!(turned.height, 104.0, epsilon = 1e-6);
        assert!(part.profile(180.0).is_none());
    }

    #[test]
    fn test_zero_spacing_keeps_outline() {
        let part = Part::rectangle(0, 30.0, 20.0, &[0.0], 0.0).unwrap();
        let profile = &part.profiles()[0];
        assert_eq!(profile.inflated, profile.original);
    }

    #[test]
    fn test_feasible_angles() {
        let part = Part::rectangle(1, 250.0, 40.0, &[0.0, 90.0], 0.0).unwrap();
        assert_eq!(part.feasible_angles(220.0), vec![90.0]);
        assert!(part.feasible_angles(30.0).is_empty());
        assert_relative_eq!(part.min_width(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_outline_rejected() {
        let result = Part::from_outline(9, &[(0.0, 0.0), (5.0, 0.0)], &[0.0], 1.0);
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));
    }
}
