//! Static binary bounding tree over the dynamic nodes.
//!
//! Slot layout: the first `leaf_count` slots are leaves (one per
//! dynamic node, in node order), the remaining `leaf_count − 1` slots
//! are internal clusters, numbered in construction order. Construction
//! pairs slots level by level, which guarantees the numbering
//! invariant the whole module rests on: **every child slot precedes
//! its parent**. Bounds recomputation and depth derivation are then
//! single linear passes — no recursion, no stack.
//!
//! The tree topology never changes after construction; bounds are
//! recomputed from scratch each time (no incremental refit).

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_model::DeformableModel;
use weft_types::{WeftError, WeftResult};

use crate::aabb::Aabb;

/// Sentinel parent of the root slot.
pub const NO_PARENT: u32 = u32::MAX;

/// Static binary hierarchy over dynamic nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingTree {
    /// Number of leaves (dynamic nodes).
    leaf_count: usize,
    /// Node index of the first leaf (the static prefix length).
    first_dynamic: usize,
    /// Children of internal slot `i` live at `children[i]`; the
    /// internal slot's id is `leaf_count + i`.
    children: Vec<[u32; 2]>,
    /// Parent slot id per slot; `NO_PARENT` for the root.
    parents: Vec<u32>,
    /// Per-slot bounds, filled by [`BoundingTree::compute_bounds`].
    bounds: Vec<Aabb>,
}

impl BoundingTree {
    /// Build the tree topology for a model's dynamic nodes.
    ///
    /// Leaves are paired in node order, level by level, so nearby nodes
    /// (which are nearby in authoring order) share low-level clusters.
    /// Returns an error if the construction would violate the
    /// children-before-parents numbering — that would break every
    /// traversal in this module.
    pub fn from_model(model: &DeformableModel) -> WeftResult<Self> {
        Self::new(model.dynamic_node_count(), model.static_node_count())
    }

    /// Build the tree topology for `leaf_count` dynamic nodes starting
    /// at node index `first_dynamic`.
    pub fn new(leaf_count: usize, first_dynamic: usize) -> WeftResult<Self> {
        let slot_count = if leaf_count == 0 {
            0
        } else {
            2 * leaf_count - 1
        };

        let mut children = Vec::with_capacity(leaf_count.saturating_sub(1));
        let mut parents = vec![NO_PARENT; slot_count];

        let mut level: Vec<u32> = (0..leaf_count as u32).collect();
        let mut next_slot = leaf_count as u32;

        while level.len() > 1 {
            let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                if let [a, b] = *pair {
                    parents[a as usize] = next_slot;
                    parents[b as usize] = next_slot;
                    children.push([a, b]);
                    next_level.push(next_slot);
                    next_slot += 1;
                } else {
                    // Odd slot out: promoted unchanged to the next level.
                    next_level.push(pair[0]);
                }
            }
            level = next_level;
        }

        let tree = Self {
            leaf_count,
            first_dynamic,
            children,
            parents,
            bounds: vec![Aabb::EMPTY; slot_count],
        };
        tree.check_numbering()?;
        Ok(tree)
    }

    /// Verify the children-before-parents invariant.
    fn check_numbering(&self) -> WeftResult<()> {
        for (i, pair) in self.children.iter().enumerate() {
            let slot = (self.leaf_count + i) as u32;
            if pair[0] >= slot || pair[1] >= slot {
                return Err(WeftError::InvariantViolation(format!(
                    "tree slot {slot} has child >= itself ({pair:?})"
                )));
            }
        }
        Ok(())
    }

    /// Number of leaf slots.
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Total slot count (leaves + internal).
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.bounds.len()
    }

    /// Root slot id, if the tree is non-empty.
    #[inline]
    pub fn root(&self) -> Option<u32> {
        self.slot_count().checked_sub(1).map(|s| s as u32)
    }

    /// Node index backing a leaf slot.
    #[inline]
    pub fn leaf_node(&self, leaf: u32) -> usize {
        self.first_dynamic + leaf as usize
    }

    /// Per-slot bounds, valid after [`BoundingTree::compute_bounds`].
    #[inline]
    pub fn bounds(&self) -> &[Aabb] {
        &self.bounds
    }

    /// Recompute all bounds from current positions in one bottom-up
    /// linear pass.
    ///
    /// `radii` is either empty (point leaves) or one radius per node.
    pub fn compute_bounds(&mut self, positions: &[Vec3], radii: &[f32]) {
        debug_assert!(radii.is_empty() || radii.len() == positions.len());

        for leaf in 0..self.leaf_count {
            let node = self.first_dynamic + leaf;
            let radius = radii.get(node).copied().unwrap_or(0.0);
            self.bounds[leaf] = Aabb::from_point_radius(positions[node], radius);
        }

        // Children always precede parents, so one forward walk over the
        // internal slots sees fully-computed child bounds.
        for i in 0..self.children.len() {
            let [a, b] = self.children[i];
            self.bounds[self.leaf_count + i] =
                self.bounds[a as usize].union(&self.bounds[b as usize]);
        }
    }

    /// Total containment error over every child/parent pair.
    ///
    /// Zero after a correct [`BoundingTree::compute_bounds`]; used by
    /// tests and validation, not at runtime.
    pub fn bounds_error(&self) -> f32 {
        let mut error = 0.0;
        for (slot, &parent) in self.parents.iter().enumerate() {
            if parent == NO_PARENT {
                continue;
            }
            error += self.bounds[parent as usize].containment_error(&self.bounds[slot]);
        }
        error
    }

    /// Depth of every slot (root = 0), derived in one linear pass.
    ///
    /// Parents follow children in the numbering, so walking the
    /// internal slots in decreasing order propagates the incremented
    /// depth counter top-down.
    pub fn depths(&self) -> Vec<u32> {
        let mut depths = vec![0_u32; self.slot_count()];
        for i in (0..self.children.len()).rev() {
            let slot = self.leaf_count + i;
            let [a, b] = self.children[i];
            depths[a as usize] = depths[slot] + 1;
            depths[b as usize] = depths[slot] + 1;
        }
        depths
    }

    /// Collect node indices of leaves whose bounds overlap `query`.
    ///
    /// Descends with an explicit stack, pruning subtrees whose cluster
    /// bounds miss the query box.
    pub fn query_overlaps(&self, query: &Aabb, out: &mut Vec<usize>) {
        out.clear();
        let Some(root) = self.root() else {
            return;
        };

        let mut stack = vec![root];
        while let Some(slot) = stack.pop() {
            if !self.bounds[slot as usize].overlaps(query) {
                continue;
            }
            if (slot as usize) < self.leaf_count {
                out.push(self.leaf_node(slot));
            } else {
                let [a, b] = self.children[slot as usize - self.leaf_count];
                stack.push(a);
                stack.push(b);
            }
        }
    }
}
