//! Double-buffered node positions.
//!
//! The solver contract takes position slices owned by the caller; this
//! is the convenience pair for callers that want the engine to own the
//! buffers. `positions` is the current tick, `previous` the last one —
//! their difference is the backward velocity the spring, drag, and
//! smoothing passes read.

use glam::Vec3;
use weft_model::DeformableModel;

/// Current/previous position pair for one simulated asset.
///
/// These are the only per-tick mutable state; all topology is immutable
/// on the model.
#[derive(Debug, Clone)]
pub struct NodeBuffers {
    /// Current-tick positions, mutated in place by the passes.
    pub positions: Vec<Vec3>,
    /// Previous-tick positions.
    pub previous: Vec<Vec3>,
}

impl NodeBuffers {
    /// Initialize both buffers from the model's rest pose.
    pub fn from_model(model: &DeformableModel) -> Self {
        Self {
            positions: model.rest_positions().to_vec(),
            previous: model.rest_positions().to_vec(),
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Copy current positions into the previous buffer. Call at the
    /// start of each tick, before external forces move the current
    /// buffer.
    pub fn save_previous(&mut self) {
        self.previous.copy_from_slice(&self.positions);
    }

    /// Backward velocity of one node over the last tick.
    #[inline]
    pub fn backward_velocity(&self, node: usize, dt: f32) -> Vec3 {
        (self.positions[node] - self.previous[node]) / dt
    }
}
