//! Air drag and backward-velocity-field smoothing.
//!
//! Both passes operate on the (previous, current) buffer pair. Air drag
//! damps the approach velocity along each quad's face normal by writing
//! impulses into the *previous* buffer; velocity smoothing pulls each
//! free corner's backward velocity toward a per-element target, which
//! suppresses local velocity discontinuities left behind by constraint
//! corrections.

use glam::Vec3;
use weft_model::{DeformableModel, PinLevel};
use weft_types::constants::EPSILON;

/// Apply per-quad air drag impulses into the previous-position buffer.
///
/// The face normal comes from the quad's two diagonals (its magnitude
/// carries twice the quad area). Each corner's frame-over-frame
/// displacement is projected onto the unit normal and damped by
/// `clamp(dt·(drag_constant + drag_linear·|v_n|), 0, 1)` — at most 100%
/// cancellation in one step.
pub fn apply_quad_air_drag(
    model: &DeformableModel,
    positions: &[Vec3],
    previous: &mut [Vec3],
    dt: f32,
    drag_constant: f32,
    drag_linear: f32,
) {
    debug_assert_eq!(positions.len(), model.node_count());
    debug_assert_eq!(previous.len(), model.node_count());

    if drag_constant == 0.0 && drag_linear == 0.0 {
        return;
    }

    for quad in model.all_quads() {
        let p = quad.nodes.map(|n| positions[n.index()]);
        let normal = (p[2] - p[0]).cross(p[3] - p[1]);
        let area2 = normal.length();
        if area2 < EPSILON {
            continue;
        }
        let normal = normal / area2;

        for &node in &quad.nodes {
            let i = node.index();
            if i < model.static_node_count() {
                continue;
            }
            let displacement = positions[i] - previous[i];
            let v_n = normal.dot(displacement);
            let factor = (dt * (drag_constant + drag_linear * v_n.abs())).clamp(0.0, 1.0);
            // Moving previous toward current along the normal shrinks
            // the normal component of next tick's implied velocity.
            previous[i] += normal * (v_n * factor);
        }
    }
}

/// Blend each quad's backward velocities toward a per-element target.
///
/// For elements with pinned corners the target is the mean velocity of
/// the pinned corners (they carry the externally animated motion); for
/// free elements it is the weighted mean of all corners, which
/// conserves the element's momentum. `blend` of 0 is a no-op, 1 snaps
/// every free corner to the target.
pub fn smooth_quad_velocities(
    model: &DeformableModel,
    positions: &[Vec3],
    previous: &mut [Vec3],
    blend: f32,
) {
    debug_assert_eq!(positions.len(), model.node_count());
    debug_assert_eq!(previous.len(), model.node_count());

    if blend <= 0.0 {
        return;
    }
    let blend = blend.min(1.0);

    for level in [PinLevel::Two, PinLevel::One, PinLevel::Free] {
        for quad in model.quads(level) {
            let velocity =
                |i: usize| positions[quad.nodes[i].index()] - previous[quad.nodes[i].index()];

            let target = match level {
                PinLevel::Two => 0.5 * (velocity(0) + velocity(1)),
                PinLevel::One => velocity(0),
                PinLevel::Free => {
                    let mut total = 0.0;
                    let mut sum = Vec3::ZERO;
                    for i in 0..4 {
                        total += quad.weights[i];
                        sum += velocity(i) * quad.weights[i];
                    }
                    if total < EPSILON {
                        continue;
                    }
                    sum / total
                }
            };

            for (i, &node) in quad.nodes.iter().enumerate() {
                let idx = node.index();
                if idx < model.static_node_count() || quad.weights[i] == 0.0 {
                    continue;
                }
                let v = positions[idx] - previous[idx];
                let new_v = v.lerp(target, blend);
                previous[idx] = positions[idx] - new_v;
            }
        }
    }
}
