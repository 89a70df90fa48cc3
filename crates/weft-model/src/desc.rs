//! Authoring descriptors — the asset-pipeline boundary.
//!
//! These are the raw, serde-friendly inputs the builder consumes.
//! Node references are plain `u32` indices here; the builder validates
//! them against the node range and converts to [`weft_types::NodeId`].

use serde::{Deserialize, Serialize};

/// A distance constraint between two nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RodDesc {
    /// First endpoint.
    pub node0: u32,
    /// Second endpoint.
    pub node1: u32,
    /// Lower distance bound (model units, scaled at solve time).
    pub min_dist: f32,
    /// Upper distance bound.
    pub max_dist: f32,
    /// Correction share of node 0; node 1 receives the remainder.
    pub weight0: f32,
    /// Fraction of the violation closed per pass (0–1).
    pub relaxation: f32,
}

/// A triangle shape-matching element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TriDesc {
    /// Corner nodes. Order is free; the builder rotates pinned corners
    /// to the front.
    pub nodes: [u32; 3],
    /// Per-corner blend weights (correction share and matching mass).
    pub weights: [f32; 3],
}

/// A quadrilateral shape-matching element. Corners are in cyclic order
/// around the quad.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuadDesc {
    pub nodes: [u32; 4],
    pub weights: [f32; 4],
}

/// An axial bend element spanning two adjacent triangles.
///
/// `edge` is the shared ("real") edge; `virtuals` are the two opposite
/// vertices of each triangle, two slots per side. A side whose opposite
/// is a single vertex repeats that node in both of its slots — the
/// midpoint of an aliased pair is the vertex itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BendDesc {
    /// Real edge endpoints.
    pub edge: [u32; 2],
    /// Virtual vertices: `[a0, a1]` for side A, `[b0, b1]` for side B.
    pub virtuals: [u32; 4],
    /// Interpolation parameter along the real edge (0–1).
    pub te: f32,
    /// Interpolation parameter along the virtual midline (0–1).
    pub tv: f32,
    /// Target separation between the edge point and the virtual point.
    /// `None` derives it from the rest pose.
    pub dist: Option<f32>,
    /// Correction share per virtual slot.
    pub weights: [f32; 4],
}

/// A damped linear spring between two nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpringDesc {
    pub node0: u32,
    pub node1: u32,
    /// Rest length. `None` derives it from the rest pose.
    pub rest_length: Option<f32>,
    /// Hookean spring constant.
    pub stiffness: f32,
    /// Velocity damping coefficient.
    pub damping: f32,
    /// Correction share of node 0.
    pub weight0: f32,
}

/// A bone-fit cluster: an anchor node and a weighted node set whose
/// deformation drives a rigid transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitClusterDesc {
    /// Node whose current position is the cluster's dynamic center.
    pub anchor: u32,
    /// `(node, mass-like weight)` members of the cluster.
    pub members: Vec<(u32, f32)>,
}
