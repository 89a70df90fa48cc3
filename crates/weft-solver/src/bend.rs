//! Axial bend relaxation.
//!
//! Each bend element drives the separation between a point on the real
//! edge and a point on the virtual midline toward its rest value. When
//! the two points nearly coincide (flat or buckled configuration) the
//! axis direction is recovered from the cross product of the real and
//! virtual edges, so the correction stays well-defined.
//!
//! Corrections are applied once per virtual slot. Slots that alias the
//! same node each apply their delta independently — behavior carried
//! over from the authored data format, covered by a regression test.

use glam::Vec3;
use weft_model::DeformableModel;
use weft_types::constants::MIN_BEND_AXIS_LENGTH_SQ;

use crate::report::PassReport;

/// Relax all axial bend elements against the current positions.
pub fn relax_bends(model: &DeformableModel, positions: &mut [Vec3]) -> PassReport {
    debug_assert_eq!(positions.len(), model.node_count());

    let mut report = PassReport::default();
    for bend in model.bends() {
        let e0 = positions[bend.edge[0].index()];
        let e1 = positions[bend.edge[1].index()];
        let va = 0.5
            * (positions[bend.virtuals[0].index()] + positions[bend.virtuals[1].index()]);
        let vb = 0.5
            * (positions[bend.virtuals[2].index()] + positions[bend.virtuals[3].index()]);

        let fe = e0.lerp(e1, bend.te);
        let fv = va.lerp(vb, bend.tv);

        let span = fv - fe;
        let len_sq = span.length_squared();

        let (axis, separation) = if len_sq >= MIN_BEND_AXIS_LENGTH_SQ {
            let len = len_sq.sqrt();
            (span / len, len)
        } else {
            // Near-coincident points: substitute the cross of the real
            // and virtual edges so the correction direction survives
            // flat configurations.
            let cross = (e1 - e0).cross(vb - va);
            let cross_len_sq = cross.length_squared();
            if cross_len_sq < MIN_BEND_AXIS_LENGTH_SQ {
                continue;
            }
            (cross / cross_len_sq.sqrt(), 0.0)
        };

        let violation = bend.dist - separation;
        if violation.abs() < f32::EPSILON {
            continue;
        }
        report.error += violation * violation;
        report.corrected += 1;

        let corr = axis * violation;
        for (slot, &node) in bend.virtuals.iter().enumerate() {
            positions[node.index()] += corr * bend.weights[slot];
        }
    }
    report
}
