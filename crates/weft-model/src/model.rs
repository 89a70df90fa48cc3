//! The validated, immutable simulation topology.
//!
//! Everything in this module is built once by [`crate::ModelBuilder`]
//! and never mutated afterwards. Elements store rest-pose shape data in
//! element-local frames; the solver rebuilds the matching current-pose
//! frame each pass, so rest data never needs updating.

use glam::{Mat3, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use weft_types::NodeId;

/// How many of an element's corners are kinematically fixed.
///
/// Determines the solve path: free elements recover a full 3-DOF
/// rotation plus translation, one-pinned elements a 3-DOF rotation
/// about the pinned corner, two-pinned elements a single angle about
/// the pinned edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinLevel {
    /// No pinned corners; center of mass is free.
    Free,
    /// One pinned corner (element slot 0).
    One,
    /// Two pinned corners (element slots 0 and 1).
    Two,
}

/// A two-node distance constraint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rod {
    pub nodes: [NodeId; 2],
    pub min_dist: f32,
    pub max_dist: f32,
    /// Correction share of node 0; node 1 gets `1 − weight0`.
    pub weight0: f32,
    /// Fraction of the violation closed per pass.
    pub relaxation: f32,
}

/// A triangle shape-matching element.
///
/// `rest` holds each corner's rest-pose coordinates in the triangle's
/// local 2D frame (x along edge 0→1, y in-plane perpendicular).
/// For free elements the origin is the weighted rest center; for
/// pinned elements it is corner 0. Pinned corners occupy the leading
/// slots and carry zero weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriElement {
    pub nodes: [NodeId; 3],
    pub rest: [Vec2; 3],
    pub weights: [f32; 3],
}

/// A quadrilateral shape-matching element.
///
/// Same conventions as [`TriElement`], with a 3D local frame:
/// x along edge 0→1, the frame normal from `p2 + p3 − 2·p0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuadElement {
    pub nodes: [NodeId; 4],
    pub rest: [Vec3; 4],
    pub weights: [f32; 4],
}

/// An axial bend element between two adjacent triangles.
///
/// The bend axis runs from a point on the real edge (`te`) to a point
/// on the midline of the virtual vertices (`tv`); the correction drives
/// the separation along that axis toward `dist`, distributed over the
/// four virtual slots by `weights`. A slot pair that aliases the same
/// node receives its delta once per slot — preserved authoring-data
/// behavior, see the builder docs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AxialBend {
    pub edge: [NodeId; 2],
    pub virtuals: [NodeId; 4],
    pub te: f32,
    pub tv: f32,
    pub dist: f32,
    pub weights: [f32; 4],
}

/// A damped linear spring integrated over (previous, current) pairs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Spring {
    pub nodes: [NodeId; 2],
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub weight0: f32,
}

/// One member of a fit cluster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitWeight {
    pub node: NodeId,
    pub weight: f32,
    /// Rest position relative to the cluster's rest center.
    pub rest_offset: Vec3,
}

/// A bone-fit cluster: matching its members' deformed positions
/// against their rest offsets yields a rigid transform for skinning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitCluster {
    /// Node this cluster's bone is attached to (consumed by the
    /// external skinning stage to route the fitted transform).
    pub anchor: NodeId,
    /// Weighted rest center of mass of the members.
    pub rest_center: Vec3,
    /// Sum of member weights; the dynamic center divides by this.
    pub total_weight: f32,
    pub members: Vec<FitWeight>,
    /// Pseudo-inverse of the rest-shape covariance `Σ w·(r ⊗ r)`,
    /// precomputed for weight normalization of the deformed covariance.
    pub inv_qq: Mat3,
}

/// The complete immutable topology of one simulated asset.
///
/// Element arrays are partitioned by pinning level: two-pinned elements
/// first, then one-pinned, then free, with the partition boundaries
/// recorded in the `*_two_pinned` / `*_one_pinned` counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeformableModel {
    pub(crate) node_count: usize,
    pub(crate) static_node_count: usize,
    pub(crate) rest_positions: Vec<Vec3>,

    pub(crate) rods: Vec<Rod>,

    pub(crate) tris: Vec<TriElement>,
    pub(crate) tri_two_pinned: usize,
    pub(crate) tri_one_pinned: usize,

    pub(crate) quads: Vec<QuadElement>,
    pub(crate) quad_two_pinned: usize,
    pub(crate) quad_one_pinned: usize,

    pub(crate) bends: Vec<AxialBend>,
    pub(crate) springs: Vec<Spring>,
    pub(crate) fit_clusters: Vec<FitCluster>,

    /// Per-node collision radius; empty when no radii were authored.
    pub(crate) collision_radii: Vec<f32>,
}

impl DeformableModel {
    /// Total node count.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Length of the immovable node prefix.
    #[inline]
    pub fn static_node_count(&self) -> usize {
        self.static_node_count
    }

    /// Number of dynamic (simulated) nodes.
    #[inline]
    pub fn dynamic_node_count(&self) -> usize {
        self.node_count - self.static_node_count
    }

    /// Rest-pose positions, one per node.
    #[inline]
    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest_positions
    }

    #[inline]
    pub fn rods(&self) -> &[Rod] {
        &self.rods
    }

    /// Triangle elements at the given pinning level.
    pub fn tris(&self, level: PinLevel) -> &[TriElement] {
        match level {
            PinLevel::Two => &self.tris[..self.tri_two_pinned],
            PinLevel::One => {
                &self.tris[self.tri_two_pinned..self.tri_two_pinned + self.tri_one_pinned]
            }
            PinLevel::Free => &self.tris[self.tri_two_pinned + self.tri_one_pinned..],
        }
    }

    /// Quad elements at the given pinning level.
    pub fn quads(&self, level: PinLevel) -> &[QuadElement] {
        match level {
            PinLevel::Two => &self.quads[..self.quad_two_pinned],
            PinLevel::One => {
                &self.quads[self.quad_two_pinned..self.quad_two_pinned + self.quad_one_pinned]
            }
            PinLevel::Free => &self.quads[self.quad_two_pinned + self.quad_one_pinned..],
        }
    }

    /// All quad elements regardless of pinning (air drag iterates these).
    #[inline]
    pub fn all_quads(&self) -> &[QuadElement] {
        &self.quads
    }

    #[inline]
    pub fn bends(&self) -> &[AxialBend] {
        &self.bends
    }

    #[inline]
    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    #[inline]
    pub fn fit_clusters(&self) -> &[FitCluster] {
        &self.fit_clusters
    }

    /// Per-node collision radii, or an empty slice when none were set.
    #[inline]
    pub fn collision_radii(&self) -> &[f32] {
        &self.collision_radii
    }

    /// True if the node is in the immovable prefix.
    #[inline]
    pub fn is_static(&self, node: NodeId) -> bool {
        node.index() < self.static_node_count
    }
}
