//! Broad-phase collision filtering with an R*-tree.
//!
//! Placed footprints are indexed by their bounding boxes. A candidate
//! position only needs a narrow-phase test against the entries whose boxes,
//! grown by the spacing, overlap the candidate's box.

use rstar::{RTree, RTreeObject, AABB};

/// A placed footprint in the index.
#[derive(Debug, Clone)]
pub struct PlacedBox {
    /// Position of the item in the layout.
    pub index: usize,
    /// Part identifier.
    pub part_id: usize,
    /// Bounds as `[min_x, min_y, max_x, max_y]`.
    pub aabb: [f64; 4],
}

impl PlacedBox {
    /// Creates a new entry.
    pub fn new(index: usize, part_id: usize, aabb: [f64; 4]) -> Self {
        Self {
            index,
            part_id,
            aabb,
        }
    }
}

impl RTreeObject for PlacedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.aabb[0], self.aabb[1]], [self.aabb[2], self.aabb[3]])
    }
}

/// R*-tree over placed footprint boxes.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<PlacedBox>,
}

impl SpatialIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry.
    pub fn insert(&mut self, entry: PlacedBox) {
        self.tree.insert(entry);
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Entries whose boxes intersect `[min, max]` (touching included).
    pub fn query_aabb(&self, min: [f64; 2], max: [f64; 2]) -> Vec<&PlacedBox> {
        let envelope = AABB::from_corners(min, max);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    /// Layout indices of entries within `margin` of the box, in ascending order.
    pub fn potential_collisions(&self, aabb: [f64; 4], margin: f64) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .query_aabb(
                [aabb[0] - margin, aabb[1] - margin],
                [aabb[2] + margin, aabb[3] + margin],
            )
            .into_iter()
            .map(|entry| entry.index)
            .collect();
        hits.sort_unstable();
        hits
    }
}
