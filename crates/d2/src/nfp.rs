//! No-Fit Polygon (NFP) computation.
//!
//! The NFP of a stationary polygon A and an orbiting polygon B is the set of
//! translations of B's reference point for which B would overlap A or come
//! closer than the gap.
//!
//! ## Algorithm
//!
//! 1. Move B so its bounding-box minimum is the reference point
//! 2. Scale both polygons to an integer grid (`scale`, e.g. 1000)
//! 3. Offset B outward by the gap with mitered joins
//! 4. Reflect the offset B through the origin
//! 5. Minkowski sum of A and reflected B: every edge/edge sweep quad, plus A
//!    and reflected B translated onto each other, unioned with `i_overlay`
//! 6. Arrange the union into lobes, holes and islands by nesting depth
//!
//! A query point is forbidden when it lies strictly inside a lobe and not in
//! one of its holes, unless it is again inside an island of that hole.
//! Boundaries are legal: a boundary point places B exactly at the gap.

use crate::geometry::{bounding_box, ensure_ccw, inflate, signed_area, union_nonzero, validate_polygon};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use strip_nesting_core::robust::{locate_point, Location};
use strip_nesting_core::{Error, Result};

/// Miter limit for the gap offset of the orbiting polygon.
const NFP_MITER_LIMIT: f64 = 2.0;

/// A forbidden region with its safe pockets.
#[derive(Debug, Clone)]
pub struct NfpLobe {
    outer: Vec<(f64, f64)>,
    bbox: (f64, f64, f64, f64),
    area: f64,
    holes: Vec<NfpHole>,
}

/// A safe pocket inside a lobe, possibly containing forbidden islands.
#[derive(Debug, Clone)]
pub struct NfpHole {
    ring: Vec<(f64, f64)>,
    islands: Vec<NfpLobe>,
}

impl NfpLobe {
    fn from_shape(mut shape: Vec<Vec<(f64, f64)>>) -> Option<Self> {
        if shape.is_empty() {
            return None;
        }
        let outer = shape.remove(0);
        Some(Self {
            bbox: bounding_box(&outer),
            area: signed_area(&outer).abs(),
            outer,
            holes: shape
                .into_iter()
                .map(|ring| NfpHole {
                    ring,
                    islands: Vec::new(),
                })
                .collect(),
        })
    }

    /// Outer contour in scaled coordinates.
    pub fn outer(&self) -> &[(f64, f64)] {
        &self.outer
    }

    /// Holes of this lobe.
    pub fn holes(&self) -> &[NfpHole] {
        &self.holes
    }

    fn forbids(&self, p: (f64, f64)) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bbox;
        if p.0 <= min_x || p.0 >= max_x || p.1 <= min_y || p.1 >= max_y {
            return false;
        }
        if locate_point(p, &self.outer) != Location::Inside {
            return false;
        }
        for hole in &self.holes {
            match locate_point(p, &hole.ring) {
                Location::Inside => return hole.islands.iter().any(|island| island.forbids(p)),
                Location::Boundary => return false,
                Location::Outside => {}
            }
        }
        true
    }

    fn count_holes(&self) -> usize {
        self.holes
            .iter()
            .map(|h| 1 + h.islands.iter().map(NfpLobe::count_holes).sum::<usize>())
            .sum()
    }
}

impl NfpHole {
    /// Hole contour in scaled coordinates.
    pub fn ring(&self) -> &[(f64, f64)] {
        &self.ring
    }

    /// Forbidden islands nested in this hole.
    pub fn islands(&self) -> &[NfpLobe] {
        &self.islands
    }
}

/// Forbidden-placement region of one ordered (stationary, orbiting) pair.
#[derive(Debug, Clone)]
pub struct NfpRecord {
    lobes: Vec<NfpLobe>,
    ref_offset: (f64, f64),
    gap: f64,
    scale: f64,
}

impl NfpRecord {
    /// Returns true if placing the orbiting polygon at `(dx, dy)` relative to
    /// the stationary one overlaps it or violates the gap.
    pub fn is_forbidden(&self, dx: f64, dy: f64) -> bool {
        let p = (
            (dx - self.ref_offset.0) * self.scale,
            (dy - self.ref_offset.1) * self.scale,
        );
        self.lobes.iter().any(|lobe| lobe.forbids(p))
    }

    /// Top-level lobes.
    pub fn lobes(&self) -> &[NfpLobe] {
        &self.lobes
    }

    /// Total number of holes at every depth.
    pub fn hole_count(&self) -> usize {
        self.lobes.iter().map(NfpLobe::count_holes).sum()
    }

    /// Translation that moved the orbiting polygon's bounding box to the origin.
    #[cfg(test)]
    pub(crate) fn ref_offset(&self) -> (f64, f64) {
        self.ref_offset
    }

    /// Effective gap after snapping to the integer grid.
    pub fn gap(&self) -> f64 {
        self.gap
    }

    /// Bounds of the forbidden region in unscaled translation space.
    #[cfg(test)]
    pub(crate) fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut bounds = (
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for lobe in &self.lobes {
            let (x0, y0, x1, y1) = lobe.bbox;
            bounds.0 = bounds.0.min(x0 / self.scale + self.ref_offset.0);
            bounds.1 = bounds.1.min(y0 / self.scale + self.ref_offset.1);
            bounds.2 = bounds.2.max(x1 / self.scale + self.ref_offset.0);
            bounds.3 = bounds.3.max(y1 / self.scale + self.ref_offset.1);
        }
        bounds
    }
}

fn to_grid(polygon: &[(f64, f64)], scale: f64) -> Vec<(f64, f64)> {
    polygon
        .iter()
        .map(|&(x, y)| ((x * scale).round(), (y * scale).round()))
        .collect()
}

/// Computes the NFP of `orbiting` around `stationary` with a minimum `gap`.
///
/// The gap is snapped to the grid and never smaller than one grid unit, so
/// touching polygons count as colliding.
pub fn compute_nfp(
    stationary: &[(f64, f64)],
    orbiting: &[(f64, f64)],
    gap: f64,
    scale: u32,
) -> Result<NfpRecord> {
    validate_polygon(stationary, "stationary polygon")?;
    validate_polygon(orbiting, "orbiting polygon")?;
    if scale == 0 {
        return Err(Error::NfpError("scale must be positive".into()));
    }
    let scale = f64::from(scale);

    let (min_x, min_y, _, _) = bounding_box(orbiting);
    let ref_offset = (-min_x, -min_y);
    let orbiting: Vec<(f64, f64)> = orbiting
        .iter()
        .map(|&(x, y)| (x + ref_offset.0, y + ref_offset.1))
        .collect();

    let gap_units = (gap * scale).round().max(1.0);

    let a = ensure_ccw(&to_grid(stationary, scale));
    let grown = inflate(&to_grid(&orbiting, scale), gap_units, NFP_MITER_LIMIT)?;
    let reflected: Vec<(f64, f64)> = ensure_ccw(&grown)
        .into_iter()
        .map(|(x, y)| (-x.round(), -y.round()))
        .collect();

    let lobes = build_forest(union_nonzero(minkowski_contours(&a, &reflected)));
    if lobes.is_empty() {
        return Err(Error::NfpError(
            "Minkowski union produced no contour".into(),
        ));
    }

    Ok(NfpRecord {
        lobes,
        ref_offset,
        gap: gap_units / scale,
        scale,
    })
}

/// Contours whose union is the Minkowski sum of two counter-clockwise rings.
fn minkowski_contours(a: &[(f64, f64)], b: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let (n, m) = (a.len(), b.len());
    let mut contours = Vec::with_capacity(n * m + 2);

    for i in 0..n {
        let (a0, a1) = (a[i], a[(i + 1) % n]);
        for j in 0..m {
            let (b0, b1) = (b[j], b[(j + 1) % m]);
            let quad = vec![
                (a0.0 + b0.0, a0.1 + b0.1),
                (a1.0 + b0.0, a1.1 + b0.1),
                (a1.0 + b1.0, a1.1 + b1.1),
                (a0.0 + b1.0, a0.1 + b1.1),
            ];
            // Parallel edges sweep no area.
            if signed_area(&quad).abs() < 0.5 {
                continue;
            }
            contours.push(ensure_ccw(&quad));
        }
    }

    contours.push(a.iter().map(|&(x, y)| (x + b[0].0, y + b[0].1)).collect());
    contours.push(b.iter().map(|&(x, y)| (x + a[0].0, y + a[0].1)).collect());
    contours
}

/// Nests union shapes: a shape lying in a hole of a larger one becomes its island.
fn build_forest(shapes: Vec<Vec<Vec<(f64, f64)>>>) -> Vec<NfpLobe> {
    let mut lobes: Vec<NfpLobe> = shapes
        .into_iter()
        .filter_map(|shape| {
            let shape = shape
                .into_iter()
                .map(|ring| ring.into_iter().map(|(x, y)| (x.round(), y.round())).collect())
                .collect();
            NfpLobe::from_shape(shape)
        })
        .filter(|lobe| lobe.area > 0.0)
        .collect();
    lobes.sort_by(|a, b| {
        b.area
            .partial_cmp(&a.area)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut forest = Vec::new();
    for lobe in lobes {
        insert_lobe(&mut forest, lobe);
    }
    forest
}

fn insert_lobe(forest: &mut Vec<NfpLobe>, lobe: NfpLobe) {
    let probe = lobe.outer[0];
    for parent in forest.iter_mut() {
        for hole in parent.holes.iter_mut() {
            if locate_point(probe, &hole.ring) != Location::Outside {
                insert_lobe(&mut hole.islands, lobe);
                return;
            }
        }
    }
    forest.push(lobe);
}

/// Cache key: ordered (stationary, orbiting) parts with angles in millidegrees.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct NfpKey {
    /// Stationary part id.
    pub part_a: usize,
    /// Stationary angle in millidegrees.
    pub angle_a: i32,
    /// Orbiting part id.
    pub part_b: usize,
    /// Orbiting angle in millidegrees.
    pub angle_b: i32,
}

impl NfpKey {
    /// Creates a key from ids and angles in degrees.
    pub fn new(part_a: usize, angle_a: f64, part_b: usize, angle_b: f64) -> Self {
        Self {
            part_a,
            angle_a: crate::geometry::angle_key(angle_a),
            part_b,
            angle_b: crate::geometry::angle_key(angle_b),
        }
    }
}

/// Thread-safe NFP cache. Records are never evicted.
#[derive(Debug, Default)]
pub struct NfpCache {
    cache: RwLock<HashMap<NfpKey, Arc<NfpRecord>>>,
}

impl NfpCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a cached NFP or computes and caches it.
    ///
    /// When two workers race on the same key, the first record stored wins
    /// and both receive it.
    pub fn get_or_compute<F>(&self, key: NfpKey, compute: F) -> Result<Arc<NfpRecord>>
    where
        F: FnOnce() -> Result<NfpRecord>,
    {
        {
            let cache = self.cache.read().map_err(|e| {
                Error::Internal(format!("Failed to acquire cache read lock: {}", e))
            })?;
            if let Some(nfp) = cache.get(&key) {
                return Ok(Arc::clone(nfp));
            }
        }

        let nfp = compute()?;
        log::trace!(
            "NFP cache miss: {:?} -> {} lobes, {} holes, gap {}",
            key,
            nfp.lobes().len(),
            nfp.hole_count(),
            nfp.gap()
        );

        let mut cache = self.cache.write().map_err(|e| {
            Error::Internal(format!("Failed to acquire cache write lock: {}", e))
        })?;
        Ok(Arc::clone(cache.entry(key).or_insert_with(|| Arc::new(nfp))))
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rect(w: f64, h: f64) -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
    }

    /// 30x30 block with a 20x20 cavity reachable only through a 2-wide slot.
    fn pocket() -> Vec<(f64, f64)> {
        vec![
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 30.0),
            (16.0, 30.0),
            (16.0, 25.0),
            (25.0, 25.0),
            (25.0, 5.0),
            (5.0, 5.0),
            (5.0, 25.0),
            (14.0, 25.0),
            (14.0, 30.0),
            (0.0, 30.0),
        ]
    }

    /// 30x30 block with an open 10-wide notch from the top.
    fn u_shape() -> Vec<(f64, f64)> {
        vec![
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 30.0),
            (20.0, 30.0),
            (20.0, 10.0),
            (10.0, 10.0),
            (10.0, 30.0),
            (0.0, 30.0),
        ]
    }

    #[test]
    fn test_nfp_two_rectangles_with_gap() {
        let nfp = compute_nfp(&rect(100.0, 50.0), &rect(100.0, 50.0), 5.0, 1000).unwrap();
        assert_eq!(nfp.lobes().len(), 1);
        assert_eq!(nfp.hole_count(), 0);

        assert!(nfp.is_forbidden(0.0, 0.0));
        assert!(nfp.is_forbidden(104.9, 0.0));
        assert!(!nfp.is_forbidden(105.0, 0.0));
        assert!(!nfp.is_forbidden(0.0, 55.0));
        assert!(nfp.is_forbidden(0.0, 54.0));
        assert!(!nfp.is_forbidden(-105.0, 10.0));
        assert!(!nfp.is_forbidden(105.0, 55.0));

        let (x0, y0, x1, y1) = nfp.bounds();
        assert_eq!((x0, y0, x1, y1), (-105.0, -55.0, 105.0, 55.0));
    }

    #[test]
    fn test_zero_gap_forbids_touching() {
        let nfp = compute_nfp(&rect(10.0, 10.0), &rect(10.0, 10.0), 0.0, 1000).unwrap();
        assert!((nfp.gap() - 0.001).abs() < 1e-12);
        assert!(nfp.is_forbidden(10.0, 0.0));
        assert!(!nfp.is_forbidden(10.0015, 0.0));
        assert!(!nfp.is_forbidden(20.0, 0.0));
    }

    #[test]
    fn test_reference_offset() {
        let shifted: Vec<_> = rect(10.0, 10.0)
            .into_iter()
            .map(|(x, y)| (x + 3.0, y - 2.0))
            .collect();
        let nfp = compute_nfp(&rect(10.0, 10.0), &shifted, 1.0, 1000).unwrap();
        assert_eq!(nfp.ref_offset(), (-3.0, 2.0));
        // The shifted copy placed at (8, 2) sits at x in [11, 21]: exactly 1 apart.
        assert!(!nfp.is_forbidden(8.0, 2.0));
        assert!(nfp.is_forbidden(7.5, 2.0));
    }

    #[test]
    fn test_open_notch_is_reachable() {
        let nfp = compute_nfp(&u_shape(), &rect(4.0, 4.0), 0.5, 1000).unwrap();
        assert_eq!(nfp.hole_count(), 0);
        // Square resting in the notch with clearance.
        assert!(!nfp.is_forbidden(13.0, 15.0));
        assert!(nfp.is_forbidden(13.0, 5.0));
        assert!(nfp.is_forbidden(8.0, 15.0));
    }

    #[test]
    fn test_closed_pocket_becomes_hole() {
        let nfp = compute_nfp(&pocket(), &rect(6.0, 6.0), 0.5, 1000).unwrap();
        assert_eq!(nfp.lobes().len(), 1);
        assert_eq!(nfp.hole_count(), 1);

        assert!(!nfp.is_forbidden(12.0, 12.0));
        assert!(nfp.is_forbidden(2.0, 2.0));
        assert!(nfp.is_forbidden(-2.0, -2.0));
        assert!(!nfp.is_forbidden(40.0, 0.0));
    }

    #[test]
    fn test_direction_is_not_interchangeable() {
        let big = rect(100.0, 50.0);
        let small = rect(30.0, 20.0);
        let ab = compute_nfp(&big, &small, 5.0, 1000).unwrap();
        let ba = compute_nfp(&small, &big, 5.0, 1000).unwrap();

        assert_ne!(ab.bounds(), ba.bounds());
        for &(dx, dy) in &[(50.0, 10.0), (-20.0, 0.0), (104.0, 0.0), (0.0, -24.0), (90.0, 60.0)] {
            assert_eq!(ab.is_forbidden(dx, dy), ba.is_forbidden(-dx, -dy));
        }
    }

    #[test]
    fn test_degenerate_input_fails() {
        let result = compute_nfp(&[(0.0, 0.0), (1.0, 0.0)], &rect(1.0, 1.0), 1.0, 1000);
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));

        let flat = [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
        assert!(compute_nfp(&rect(1.0, 1.0), &flat, 1.0, 1000).is_err());
    }

    #[test]
    fn test_nfp_cache() {
        let cache = NfpCache::new();
        let calls = AtomicUsize::new(0);
        let key = NfpKey::new(0, 0.0, 1, 90.0);

        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            compute_nfp(&rect(10.0, 10.0), &rect(5.0, 5.0), 1.0, 1000)
        };
        let first = cache.get_or_compute(key, compute).unwrap();
        let second = cache.get_or_compute(key, compute).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);

        let reversed = NfpKey::new(1, 90.0, 0, 0.0);
        assert_ne!(key, reversed);
    }
}
