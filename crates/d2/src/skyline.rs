//! Skyline profile of a fixed-width strip.
//!
//! The skyline is a sequence of `{x, height, width}` segments that exactly
//! covers `[0, width)` without gaps or overlaps. Adjacent segments never share
//! a height; they are merged after every update.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance for boundary and height comparisons.
pub const EPSILON: f64 = 1e-6;

/// One horizontal segment of the skyline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkylineNode {
    /// Left edge.
    pub x: f64,
    /// Occupied height over the segment.
    pub height: f64,
    /// Segment width.
    pub width: f64,
}

impl SkylineNode {
    #[inline]
    fn end(&self) -> f64 {
        self.x + self.width
    }
}

/// Top-height profile of a strip.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Skyline {
    width: f64,
    nodes: Vec<SkylineNode>,
}

impl Skyline {
    /// Creates a flat skyline at height 0.
    pub fn new(width: f64) -> Self {
        Self {
            width,
            nodes: vec![SkylineNode {
                x: 0.0,
                height: 0.0,
                width,
            }],
        }
    }

    /// Strip width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Segments from left to right.
    pub fn nodes(&self) -> &[SkylineNode] {
        &self.nodes
    }

    /// Segment heights from left to right.
    pub fn heights(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.height).collect()
    }

    /// Highest segment.
    #[cfg(test)]
    pub(crate) fn max_height(&self) -> f64 {
        self.nodes.iter().map(|n| n.height).fold(0.0, f64::max)
    }

    /// Sum of absolute height steps between neighbouring segments.
    pub fn roughness(&self) -> f64 {
        self.nodes
            .windows(2)
            .map(|pair| (pair[1].height - pair[0].height).abs())
            .sum()
    }

    /// Index of the segment containing `x`.
    fn node_index_at(&self, x: f64) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.x - EPSILON <= x && x < n.end() - EPSILON)
    }

    /// Maximum height under a footprint `[x, x + w)`, or `None` when it
    /// would leave the strip.
    pub fn span_height(&self, x: f64, w: f64) -> Option<f64> {
        let x_end = x + w;
        if x < -EPSILON || x_end > self.width + EPSILON {
            return None;
        }

        let start = self.node_index_at(x.max(0.0))?;
        let height = self.nodes[start..]
            .iter()
            .take_while(|n| n.x < x_end - EPSILON)
            .map(|n| n.height)
            .fold(0.0, f64::max);
        Some(height)
    }

    /// Lowest, then leftmost, position for a `w x h` footprint resting on the
    /// skyline with its left edge on a segment start.
    pub fn best_position(&self, w: f64, h: f64, height_bound: f64) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;

        for node in &self.nodes {
            let Some(y) = self.span_height(node.x, w) else {
                continue;
            };
            if y + h > height_bound {
                continue;
            }
            let better = match best {
                None => true,
                Some((bx, by)) => y < by || (y == by && node.x < bx),
            };
            if better {
                best = Some((node.x, y));
            }
        }

        best
    }

    /// Raises `[x, x + w)` to height `y`, splitting straddling segments and
    /// merging equal neighbours.
    pub fn place(&mut self, x: f64, y: f64, w: f64) {
        let x = x.max(0.0);
        let x_end = (x + w).min(self.width);
        if x_end - x <= EPSILON {
            return;
        }

        let mut nodes = Vec::with_capacity(self.nodes.len() + 2);
        let mut inserted = false;
        let new_node = SkylineNode {
            x,
            height: y,
            width: x_end - x,
        };

        for node in &self.nodes {
            if node.end() <= x + EPSILON {
                nodes.push(*node);
            } else if node.x >= x_end - EPSILON {
                if !inserted {
                    nodes.push(new_node);
                    inserted = true;
                }
                nodes.push(*node);
            } else {
                if node.x < x - EPSILON {
                    nodes.push(SkylineNode {
                        x: node.x,
                        height: node.height,
                        width: x - node.x,
                    });
                }
                if !inserted {
                    nodes.push(new_node);
                    inserted = true;
                }
                if node.end() > x_end + EPSILON {
                    nodes.push(SkylineNode {
                        x: x_end,
                        height: node.height,
                        width: node.end() - x_end,
                    });
                }
            }
        }
        if !inserted {
            nodes.push(new_node);
        }

        self.nodes = nodes;
        self.merge();
    }

    fn merge(&mut self) {
        let mut merged: Vec<SkylineNode> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.drain(..) {
            match merged.last_mut() {
                Some(last) if (last.height - node.height).abs() <= EPSILON => {
                    last.width = node.end() - last.x;
                }
                _ => merged.push(node),
            }
        }
        // Snap each start to the previous end so coverage stays exact.
        for i in 1..merged.len() {
            let end = merged[i - 1].end();
            let next_end = merged[i].end();
            merged[i].x = end;
            merged[i].width = next_end - end;
        }
        if let Some(last) = merged.last_mut() {
            last.width = self.width - last.x;
        }
        self.nodes = merged;
    }

    /// Checks coverage of `[0, width)` and that no neighbours share a height.
    pub fn is_consistent(&self) -> bool {
        let Some(first) = self.nodes.first() else {
            return false;
        };
        if first.x.abs() > EPSILON {
            return false;
        }
        for pair in self.nodes.windows(2) {
            if (pair[0].end() - pair[1].x).abs() > EPSILON
                || (pair[0].height - pair[1].height).abs() <= EPSILON
            {
                return false;
            }
        }
        self.nodes.iter().all(|n| n.width > 0.0)
            && self
                .nodes
                .last()
                .map_or(false, |n| (n.end() - self.width).abs() <= EPSILON)
    }
}
