//! The per-tick pass schedule.
//!
//! Pass order is fixed and not reorderable: later passes depend on the
//! corrected positions of earlier ones. Constraint relaxation runs
//! `relax_passes` times (rods → triangles → quads → bends), then spring
//! integration, then the optional aerodynamic passes.

use glam::Vec3;
use weft_model::DeformableModel;

use crate::aero::{apply_quad_air_drag, smooth_quad_velocities};
use crate::bend::relax_bends;
use crate::config::SolverConfig;
use crate::report::TickReport;
use crate::rods::relax_rods;
use crate::shape::{relax_quads, relax_tris};
use crate::springs::integrate_springs;
use crate::state::NodeBuffers;

/// Run one full tick schedule over caller-owned buffers.
///
/// The driver is expected to have advanced `buffers` (saved previous,
/// applied external motion) before calling. Bounding-tree rebuild and
/// fit extraction are separate calls — they read the result of this.
pub fn run_tick(
    model: &DeformableModel,
    config: &SolverConfig,
    buffers: &mut NodeBuffers,
    dt: f32,
) -> TickReport {
    run_tick_split(
        model,
        config,
        &mut buffers.positions,
        &mut buffers.previous,
        dt,
    )
}

/// [`run_tick`] over raw position slices.
pub fn run_tick_split(
    model: &DeformableModel,
    config: &SolverConfig,
    positions: &mut [Vec3],
    previous: &mut [Vec3],
    dt: f32,
) -> TickReport {
    debug_assert_eq!(positions.len(), model.node_count());
    debug_assert_eq!(previous.len(), model.node_count());

    let mut report = TickReport::default();
    let scale = config.model_scale;

    for _ in 0..config.relax_passes {
        report.rods.merge(relax_rods(model, positions, scale));
        report.shapes.merge(relax_tris(model, positions, scale));
        report.shapes.merge(relax_quads(model, positions, scale));
        report.bends.merge(relax_bends(model, positions));
    }

    report
        .springs
        .merge(integrate_springs(model, positions, previous, dt));

    apply_quad_air_drag(
        model,
        positions,
        previous,
        dt,
        config.drag_constant,
        config.drag_linear,
    );
    smooth_quad_velocities(model, positions, previous, config.velocity_blend);

    report
}
