//! Damped spring integration.
//!
//! Semi-implicit: the restoring and damping terms are computed from the
//! (previous, current) position pairs and applied as a positional
//! correction on the current buffer, split between the endpoints by the
//! spring's weight.

use glam::Vec3;
use weft_model::DeformableModel;
use weft_types::constants::MIN_SPRING_DISTANCE;

use crate::report::PassReport;

/// Integrate all springs over one timestep.
///
/// Separations below [`MIN_SPRING_DISTANCE`] are skipped — the
/// correction has no usable direction at near-zero range.
pub fn integrate_springs(
    model: &DeformableModel,
    positions: &mut [Vec3],
    previous: &[Vec3],
    dt: f32,
) -> PassReport {
    debug_assert_eq!(positions.len(), model.node_count());
    debug_assert_eq!(previous.len(), model.node_count());

    let mut report = PassReport::default();
    for spring in model.springs() {
        let i0 = spring.nodes[0].index();
        let i1 = spring.nodes[1].index();

        let delta = positions[i1] - positions[i0];
        let dist = delta.length();
        if dist < MIN_SPRING_DISTANCE {
            continue;
        }
        let dir = delta / dist;

        let stretch = dist - spring.rest_length;
        // Relative frame-over-frame displacement along the spring.
        let rel_vel = (positions[i1] - previous[i1]) - (positions[i0] - previous[i0]);
        let closing = dir.dot(rel_vel);

        let impulse = (spring.stiffness * stretch + spring.damping * closing) * dt;
        if impulse == 0.0 {
            continue;
        }
        report.error += stretch * stretch;
        report.corrected += 1;

        let corr = dir * impulse;
        positions[i0] += corr * spring.weight0;
        positions[i1] -= corr * (1.0 - spring.weight0);
    }
    report
}
