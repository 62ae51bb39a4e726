//! Bottom-left placement into a fixed-width strip.
//!
//! A [`Packer`] replays an ordered `(part, angle)` sequence. Each part after
//! the first is tried at candidate positions derived from the bounding boxes
//! of the parts already placed (right of, above, corner and edge aligned),
//! the origin and the skyline's lowest fit. Candidates are visited in
//! `(y, x)` order and the first legal one wins. When none is legal the part
//! starts a new row at `x = 0` above everything placed so far.
//!
//! Collision is decided either through cached no-fit polygons
//! ([`CollisionMode::Nfp`]) or by testing the translated polygons directly
//! ([`CollisionMode::Direct`]). Both are preceded by an R*-tree broad phase.

use crate::geometry::{translate, OrientedProfile, Part};
use crate::nfp::{compute_nfp, NfpCache, NfpKey};
use crate::skyline::Skyline;
use crate::spatial_index::{PlacedBox, SpatialIndex};
use strip_nesting_core::robust::{locate_point, segment_distance, Location};
use strip_nesting_core::{CollisionMode, Config, Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance on the spacing check and the strip bounds.
const TOLERANCE: f64 = 1e-6;

/// A part at its final position.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacedItem {
    /// Part identifier.
    pub part_id: usize,
    /// Rotation angle in degrees.
    pub angle: f64,
    /// X position of the footprint's bounding box.
    pub x: f64,
    /// Y position of the footprint's bounding box.
    pub y: f64,
    /// Footprint width.
    pub width: f64,
    /// Footprint height.
    pub height: f64,
    /// Placed spacing-inflated footprint.
    pub inflated: Vec<(f64, f64)>,
    /// Placed original outline.
    pub original: Vec<(f64, f64)>,
}

impl PlacedItem {
    /// Bounds as `[min_x, min_y, max_x, max_y]`.
    pub fn aabb(&self) -> [f64; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Top edge of the footprint.
    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// Result of one packing pass.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    /// Items in placement order.
    pub items: Vec<PlacedItem>,
    /// Consumed strip length.
    pub total_length: f64,
    /// Strip width.
    pub bin_width: f64,
    skyline: Skyline,
}

impl Layout {
    /// Number of placed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing was placed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total area of the placed original outlines.
    pub fn placed_area(&self) -> f64 {
        self.items
            .iter()
            .map(|item| crate::geometry::signed_area(&item.original).abs())
            .sum()
    }

    /// Placed area over the consumed rectangle `bin_width x total_length`.
    pub fn utilization(&self) -> f64 {
        let used = self.bin_width * self.total_length;
        if used <= 0.0 {
            0.0
        } else {
            self.placed_area() / used
        }
    }

    /// Skyline segment heights, left to right.
    pub fn height_profile(&self) -> Vec<f64> {
        self.skyline.heights()
    }

    /// Sum of absolute height steps along the skyline.
    pub fn roughness(&self) -> f64 {
        self.skyline.roughness()
    }

    /// Final skyline.
    pub fn skyline(&self) -> &Skyline {
        &self.skyline
    }
}

/// Single-use placement engine.
pub struct Packer<'a> {
    config: &'a Config,
    nfp_cache: &'a NfpCache,
    items: Vec<PlacedItem>,
    index: SpatialIndex,
    skyline: Skyline,
    total_length: f64,
}

impl<'a> Packer<'a> {
    /// Creates an empty packer. The NFP cache is shared across evaluations.
    pub fn new(config: &'a Config, nfp_cache: &'a NfpCache) -> Self {
        Self {
            config,
            nfp_cache,
            items: Vec::new(),
            index: SpatialIndex::new(),
            skyline: Skyline::new(config.bin_width),
            total_length: 0.0,
        }
    }

    /// Packs a whole sequence and returns the layout.
    pub fn pack<'p, I>(config: &'a Config, nfp_cache: &'a NfpCache, sequence: I) -> Result<Layout>
    where
        I: IntoIterator<Item = (&'p Part, f64)>,
    {
        let mut packer = Self::new(config, nfp_cache);
        for (part, angle) in sequence {
            packer.place(part, angle)?;
        }
        Ok(packer.finish())
    }

    /// Current consumed length.
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Items placed so far.
    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    /// Places one part at the given angle.
    pub fn place(&mut self, part: &Part, angle: f64) -> Result<&PlacedItem> {
        let profile = part.profile(angle).ok_or_else(|| {
            Error::ConfigError(format!(
                "part {} has no profile at angle {}",
                part.id(),
                angle
            ))
        })?;

        if profile.width > self.config.bin_width + TOLERANCE {
            return Err(Error::PlacementExhausted {
                part_id: part.id(),
                width: profile.width,
                bin_width: self.config.bin_width,
            });
        }

        let (x, y) = if self.items.is_empty() {
            (0.0, 0.0)
        } else {
            match self.find_position(part.id(), profile)? {
                Some(position) => position,
                None => self.fallback_position(part.id(), profile),
            }
        };

        self.commit(part.id(), profile, x, y);
        Ok(&self.items[self.items.len() - 1])
    }

    /// Consumes the packer.
    pub fn finish(self) -> Layout {
        Layout {
            items: self.items,
            total_length: self.total_length,
            bin_width: self.config.bin_width,
            skyline: self.skyline,
        }
    }

    fn find_position(&self, part_id: usize, profile: &OrientedProfile) -> Result<Option<(f64, f64)>> {
        for (x, y) in self.candidates(profile.width, profile.height) {
            if self.is_legal(part_id, profile, x, y)? {
                return Ok(Some((x, y)));
            }
        }
        Ok(None)
    }

    fn fallback_position(&self, part_id: usize, profile: &OrientedProfile) -> (f64, f64) {
        let top = self.items.iter().map(PlacedItem::top).fold(0.0, f64::max);
        let y = top + self.config.spacing;
        log::debug!("part {} starts a new row at y={:.3}", part_id, y);
        if y + profile.height > self.config.height_bound() {
            log::warn!(
                "part {} exceeds the height bound {:.3} (top {:.3})",
                part_id,
                self.config.height_bound(),
                y + profile.height
            );
        }
        (0.0, y)
    }

    /// Candidate positions inside the strip, sorted by `(y, x)`.
    fn candidates(&self, w: f64, h: f64) -> Vec<(f64, f64)> {
        let spacing = self.config.spacing;
        let bin_width = self.config.bin_width;
        let right_aligned = bin_width - w;

        let mut candidates = vec![(0.0, 0.0)];
        for item in &self.items {
            let [px_min, py_min, px_max, py_max] = item.aabb();
            let above = py_max + spacing;

            candidates.extend_from_slice(&[
                (px_max + spacing, 0.0),
                (px_max + spacing, py_min),
                (px_max + spacing, py_max - h),
                (0.0, above),
                (px_min, above),
                (px_max - w, above),
                (px_min, py_min),
                (px_min, py_max),
                (px_max, py_min),
                (px_max, py_max),
                (right_aligned, 0.0),
                (right_aligned, py_min),
                (right_aligned, above),
            ]);
        }
        if let Some(position) = self
            .skyline
            .best_position(w, h, self.config.height_bound())
        {
            candidates.push(position);
        }

        let height_bound = self.config.height_bound();
        candidates.retain(|&(x, y)| {
            x >= -TOLERANCE
                && x + w <= bin_width + TOLERANCE
                && y >= -TOLERANCE
                && y + h <= height_bound + TOLERANCE
        });
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));
        candidates.dedup();
        candidates
    }

    fn is_legal(&self, part_id: usize, profile: &OrientedProfile, x: f64, y: f64) -> Result<bool> {
        let aabb = [x, y, x + profile.width, y + profile.height];
        for idx in self.index.potential_collisions(aabb, self.config.spacing) {
            let placed = &self.items[idx];
            let collides = match self.config.collision_mode {
                CollisionMode::Nfp => {
                    let key = NfpKey::new(placed.part_id, placed.angle, part_id, profile.angle);
                    let nfp = self.nfp_cache.get_or_compute(key, || {
                        compute_nfp(
                            &translate(&placed.inflated, -placed.x, -placed.y),
                            &profile.inflated,
                            self.config.spacing,
                            self.config.nfp_scale,
                        )
                    })?;
                    nfp.is_forbidden(x - placed.x, y - placed.y)
                }
                CollisionMode::Direct => {
                    let candidate = translate(&profile.inflated, x, y);
                    polygons_collide(&candidate, &placed.inflated, self.config.spacing)
                }
            };
            if collides {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn commit(&mut self, part_id: usize, profile: &OrientedProfile, x: f64, y: f64) {
        let item = PlacedItem {
            part_id,
            angle: profile.angle,
            x,
            y,
            width: profile.width,
            height: profile.height,
            inflated: translate(&profile.inflated, x, y),
            original: translate(&profile.original, x, y),
        };

        let top = item.top();
        let span = self.skyline.span_height(x, profile.width).unwrap_or(0.0);
        self.skyline.place(x, span.max(top), profile.width);
        self.total_length = self.total_length.max(top);

        self.index
            .insert(PlacedBox::new(self.items.len(), part_id, item.aabb()));
        self.items.push(item);
    }
}

/// Minimum distance between two polygons, zero when they touch or overlap.
pub fn polygon_distance(a: &[(f64, f64)], b: &[(f64, f64)]) -> f64 {
    if a.iter().any(|&p| locate_point(p, b) != Location::Outside)
        || b.iter().any(|&p| locate_point(p, a) != Location::Outside)
    {
        return 0.0;
    }

    let mut best = f64::INFINITY;
    for i in 0..a.len() {
        let (a1, a2) = (a[i], a[(i + 1) % a.len()]);
        for j in 0..b.len() {
            let d = segment_distance(a1, a2, b[j], b[(j + 1) % b.len()]);
            if d == 0.0 {
                return 0.0;
            }
            best = best.min(d);
        }
    }
    best
}

/// Direct collision test: intersecting, touching or closer than `spacing`.
pub fn polygons_collide(a: &[(f64, f64)], b: &[(f64, f64)], spacing: f64) -> bool {
    let distance = polygon_distance(a, b);
    distance == 0.0 || distance < spacing - TOLERANCE
}
