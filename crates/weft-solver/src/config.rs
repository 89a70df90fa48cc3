//! Solver configuration.
//!
//! Parameters that control relaxation behavior: pass counts, drag
//! coefficients, SVD iteration depth. Constraint-specific parameters
//! (rod ranges, spring constants) live on the model descriptors, not
//! here.

use serde::{Deserialize, Serialize};

/// Configuration for the relaxation solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Constraint relaxation passes per tick (rods → elements → bends).
    pub relax_passes: u32,

    /// Uniform model scale applied to rod ranges and element rest
    /// shapes at solve time.
    pub model_scale: f32,

    /// Always-on air drag coefficient (per second).
    pub drag_constant: f32,

    /// Velocity-proportional air drag coefficient (per second per unit
    /// normal speed).
    pub drag_linear: f32,

    /// Blend factor for backward-velocity-field smoothing
    /// (0.0 = off, 1.0 = snap to the target velocity).
    pub velocity_blend: f32,

    /// Stiffness for fit-transform feedback (0–1).
    pub fit_stiffness: f32,

    /// Sweep count for the approximate-Jacobi SVD.
    pub svd_sweeps: u32,

    /// Early-out threshold for the SVD sweep loop.
    pub svd_epsilon: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            relax_passes: weft_types::constants::DEFAULT_RELAX_PASSES,
            model_scale: 1.0,
            drag_constant: 0.0,
            drag_linear: 0.0,
            velocity_blend: 0.0,
            fit_stiffness: 1.0,
            svd_sweeps: weft_types::constants::DEFAULT_SVD_SWEEPS,
            svd_epsilon: 1.0e-10,
        }
    }
}

impl SolverConfig {
    /// Creates a config for debugging (single pass, coarse SVD).
    pub fn debug() -> Self {
        Self {
            relax_passes: 1,
            svd_sweeps: 2,
            svd_epsilon: 1.0e-6,
            ..Default::default()
        }
    }

    /// Creates a high-quality config (more passes, deeper SVD).
    pub fn high_quality() -> Self {
        Self {
            relax_passes: 4,
            svd_sweeps: 8,
            svd_epsilon: 1.0e-12,
            ..Default::default()
        }
    }
}
