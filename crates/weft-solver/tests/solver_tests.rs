//! Integration tests for weft-solver.

use glam::{Affine3A, Quat, Vec3};
use weft_model::desc::{BendDesc, FitClusterDesc, QuadDesc, RodDesc, SpringDesc, TriDesc};
use weft_model::generators::cloth_grid;
use weft_model::{DeformableModel, ModelBuilder};
use weft_solver::aero::{apply_quad_air_drag, smooth_quad_velocities};
use weft_solver::bend::relax_bends;
use weft_solver::fit::{feedback_fit_transforms, fit_transforms};
use weft_solver::rods::{relax_rods, relax_rods_ftl, relax_rods_uninertial};
use weft_solver::shape::{relax_quads, relax_quads_scalar, relax_tris, relax_tris_scalar};
use weft_solver::springs::integrate_springs;
use weft_solver::{run_tick, NodeBuffers, SolverConfig};

const DT: f32 = 1.0 / 60.0;

fn single_rod_model(min_dist: f32, max_dist: f32, weight0: f32, relaxation: f32) -> DeformableModel {
    let mut builder = ModelBuilder::new(
        vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 5.0)],
        0,
    )
    .unwrap();
    builder.add_rod(RodDesc {
        node0: 0,
        node1: 1,
        min_dist,
        max_dist,
        weight0,
        relaxation,
    });
    builder.build().unwrap()
}

// ─── Rod Tests ────────────────────────────────────────────────

#[test]
fn rod_single_pass_reaches_exact_bound() {
    // min == max == 1, relaxation 1: one pass lands exactly on the bound.
    let model = single_rod_model(1.0, 1.0, 0.5, 1.0);
    let mut pos = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 5.0)];

    let report = relax_rods(&model, &mut pos, 1.0);
    assert_eq!(report.corrected, 1);

    // Evenly split correction: (0,0,2) and (0,0,3).
    assert!((pos[0] - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
    assert!((pos[1] - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    assert!(((pos[1] - pos[0]).length() - 1.0).abs() < 1e-5);
}

#[test]
fn rod_respects_model_scale() {
    let model = single_rod_model(1.0, 1.0, 0.5, 1.0);
    let mut pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)];

    relax_rods(&model, &mut pos, 2.0);
    assert!(((pos[1] - pos[0]).length() - 2.0).abs() < 1e-5);
}

#[test]
fn rod_inside_range_is_untouched() {
    let model = single_rod_model(1.0, 10.0, 0.5, 1.0);
    let mut pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)];

    let report = relax_rods(&model, &mut pos, 1.0);
    assert_eq!(report.corrected, 0);
    assert_eq!(report.error, 0.0);
    assert_eq!(pos[1], Vec3::new(0.0, 0.0, 5.0));
}

#[test]
fn rod_partial_relaxation_moves_toward_bound() {
    let model = single_rod_model(1.0, 1.0, 0.5, 0.5);
    let mut pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)];

    relax_rods(&model, &mut pos, 1.0);
    // Half the violation closed: distance 5 → 3.
    assert!(((pos[1] - pos[0]).length() - 3.0).abs() < 1e-5);
}

#[test]
fn rod_degenerate_distance_is_skipped() {
    let model = single_rod_model(1.0, 1.0, 0.5, 1.0);
    let mut pos = vec![Vec3::ZERO, Vec3::ZERO];

    let report = relax_rods(&model, &mut pos, 1.0);
    assert_eq!(report.corrected, 0);
    assert!(!pos[0].x.is_nan());
    assert_eq!(pos[0], Vec3::ZERO);
}

#[test]
fn rod_ftl_moves_only_second_endpoint() {
    let model = single_rod_model(1.0, 1.0, 0.5, 1.0);
    let mut pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)];

    relax_rods_ftl(&model, &mut pos, 1.0);
    assert_eq!(pos[0], Vec3::ZERO);
    assert!((pos[1] - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
}

#[test]
fn rod_uninertial_mirrors_into_previous() {
    let model = single_rod_model(1.0, 1.0, 0.5, 1.0);
    let mut pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)];
    let mut prev = pos.clone();

    relax_rods_uninertial(&model, &mut pos, &mut prev, 1.0);
    // Identical correction in both buffers: no velocity introduced.
    assert_eq!(pos[0], prev[0]);
    assert_eq!(pos[1], prev[1]);
    assert!(((pos[1] - pos[0]).length() - 1.0).abs() < 1e-5);
}

#[test]
fn rod_static_endpoint_never_moves() {
    let mut builder = ModelBuilder::new(
        vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)],
        1,
    )
    .unwrap();
    builder.add_rod(RodDesc {
        node0: 0,
        node1: 1,
        min_dist: 1.0,
        max_dist: 1.0,
        weight0: 0.5,
        relaxation: 1.0,
    });
    let model = builder.build().unwrap();

    let mut pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0)];
    relax_rods(&model, &mut pos, 1.0);
    assert_eq!(pos[0], Vec3::ZERO);
    assert!((pos[1] - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
}

// ─── Shape-Matching Tests ─────────────────────────────────────

fn one_pinned_tri_model() -> DeformableModel {
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        1,
    )
    .unwrap();
    builder.add_tri(TriDesc {
        nodes: [0, 1, 2],
        weights: [1.0; 3],
    });
    builder.build().unwrap()
}

#[test]
fn tri_at_rest_is_idempotent() {
    // A flat, undeformed one-pinned triangle: zero error, zero motion.
    let model = one_pinned_tri_model();
    let mut pos = model.rest_positions().to_vec();
    let before = pos.clone();

    let report = relax_tris(&model, &mut pos, 1.0);
    assert!(report.error < 1e-10, "error {}", report.error);
    for (a, b) in pos.iter().zip(before.iter()) {
        assert!((*a - *b).length() < 1e-6);
    }
}

#[test]
fn tri_rigidly_moved_is_idempotent() {
    // Shape matching is invariant under rigid motion of the element.
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        0,
    )
    .unwrap();
    builder.add_tri(TriDesc {
        nodes: [0, 1, 2],
        weights: [1.0; 3],
    });
    let model = builder.build().unwrap();

    let rot = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.5).normalize(), 0.8);
    let shift = Vec3::new(3.0, -2.0, 1.0);
    let mut pos: Vec<Vec3> = model
        .rest_positions()
        .iter()
        .map(|&p| rot * p + shift)
        .collect();
    let before = pos.clone();

    let report = relax_tris(&model, &mut pos, 1.0);
    assert!(report.error < 1e-6, "error {}", report.error);
    for (a, b) in pos.iter().zip(before.iter()) {
        assert!((*a - *b).length() < 1e-3);
    }
}

#[test]
fn tri_deformation_error_decreases_over_passes() {
    let model = one_pinned_tri_model();
    let mut pos = model.rest_positions().to_vec();
    pos[2] += Vec3::new(0.3, 0.1, 0.4);

    let first = relax_tris(&model, &mut pos, 1.0);
    let second = relax_tris(&model, &mut pos, 1.0);
    assert!(first.error > 1e-4);
    assert!(
        second.error < first.error,
        "second pass {} vs first {}",
        second.error,
        first.error
    );
}

fn two_pinned_quad_model() -> DeformableModel {
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
        ],
        2,
    )
    .unwrap();
    builder.add_quad(QuadDesc {
        nodes: [0, 1, 2, 3],
        weights: [1.0; 4],
    });
    builder.build().unwrap()
}

#[test]
fn quad_two_pinned_error_non_increasing() {
    // Displaced free corners: the recovered 1-DOF rotation must not
    // leave the configuration worse than the un-relaxed one.
    let model = two_pinned_quad_model();
    let mut pos = model.rest_positions().to_vec();
    pos[2] += Vec3::new(0.1, 0.2, 0.5);
    pos[3] += Vec3::new(-0.2, 0.0, 0.3);

    let first = relax_quads(&model, &mut pos, 1.0);
    let second = relax_quads(&model, &mut pos, 1.0);
    assert!(first.error > 0.0);
    assert!(
        second.error <= first.error,
        "second pass {} vs first {}",
        second.error,
        first.error
    );
}

#[test]
fn quad_two_pinned_pure_swing_recovers_exactly() {
    // Rotate the free corners rigidly about the pinned edge: the
    // 1-DOF closed form recovers the rest shape in one pass.
    let model = two_pinned_quad_model();
    let mut pos = model.rest_positions().to_vec();
    let swing = Quat::from_rotation_x(0.7);
    for i in 2..4 {
        pos[i] = swing * pos[i];
    }

    relax_quads(&model, &mut pos, 1.0);
    let second = relax_quads(&model, &mut pos, 1.0);
    assert!(second.error < 1e-6, "residual error {}", second.error);
}

#[test]
fn quad_static_corners_never_move() {
    let model = two_pinned_quad_model();
    let mut pos = model.rest_positions().to_vec();
    pos[2] += Vec3::new(0.4, 0.0, 0.2);

    relax_quads(&model, &mut pos, 1.0);
    assert_eq!(pos[0], Vec3::new(0.0, 0.0, 0.0));
    assert_eq!(pos[1], Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn free_quad_collapsed_to_point_stays_finite() {
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        0,
    )
    .unwrap();
    builder.add_quad(QuadDesc {
        nodes: [0, 1, 2, 3],
        weights: [1.0; 4],
    });
    let model = builder.build().unwrap();

    // Every node at the same point: degenerate frame, identity fallback.
    let mut pos = vec![Vec3::splat(2.0); 4];
    let report = relax_quads(&model, &mut pos, 1.0);
    assert_eq!(report.error, 0.0);
    for p in &pos {
        assert!(p.is_finite());
        assert_eq!(*p, Vec3::splat(2.0));
    }
}

// ─── Scalar/Batched Equivalence ───────────────────────────────

/// Eight disjoint free quads (no shared nodes), deformed
/// deterministically.
fn disjoint_quads_model() -> (DeformableModel, Vec<Vec3>) {
    let mut rest = Vec::new();
    let mut builder_quads = Vec::new();
    for q in 0..8 {
        let base = Vec3::new(q as f32 * 3.0, 0.0, 0.0);
        let start = rest.len() as u32;
        rest.push(base);
        rest.push(base + Vec3::new(1.0, 0.0, 0.0));
        rest.push(base + Vec3::new(1.0, 1.0, 0.0));
        rest.push(base + Vec3::new(0.0, 1.0, 0.0));
        builder_quads.push([start, start + 1, start + 2, start + 3]);
    }

    let mut builder = ModelBuilder::new(rest.clone(), 0).unwrap();
    for nodes in builder_quads {
        builder.add_quad(QuadDesc {
            nodes,
            weights: [1.0; 4],
        });
    }
    let model = builder.build().unwrap();

    // Deterministic deformation.
    let deformed: Vec<Vec3> = rest
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let k = i as f32;
            p + Vec3::new(
                (k * 0.7).sin() * 0.2,
                (k * 1.3).cos() * 0.15,
                (k * 0.4).sin() * 0.25,
            )
        })
        .collect();

    (model, deformed)
}

#[test]
fn batched_quads_match_scalar() {
    let (model, deformed) = disjoint_quads_model();

    let mut batched = deformed.clone();
    let mut scalar = deformed;
    let report_b = relax_quads(&model, &mut batched, 1.0);
    let report_s = relax_quads_scalar(&model, &mut scalar, 1.0);

    for (a, b) in batched.iter().zip(scalar.iter()) {
        assert!((*a - *b).length() < 1e-5, "{a} vs {b}");
    }
    assert!((report_b.error - report_s.error).abs() < 1e-4);
    assert_eq!(report_b.corrected, report_s.corrected);
}

#[test]
fn batched_tris_match_scalar() {
    // Six disjoint free triangles: one full chunk plus a remainder.
    let mut rest = Vec::new();
    let mut tris = Vec::new();
    for t in 0..6 {
        let base = Vec3::new(0.0, t as f32 * 3.0, 0.0);
        let start = rest.len() as u32;
        rest.push(base);
        rest.push(base + Vec3::new(1.0, 0.0, 0.0));
        rest.push(base + Vec3::new(0.0, 1.0, 0.0));
        tris.push([start, start + 1, start + 2]);
    }
    let mut builder = ModelBuilder::new(rest.clone(), 0).unwrap();
    for nodes in tris {
        builder.add_tri(TriDesc {
            nodes,
            weights: [1.0; 3],
        });
    }
    let model = builder.build().unwrap();

    let deformed: Vec<Vec3> = rest
        .iter()
        .enumerate()
        .map(|(i, &p)| p + Vec3::new((i as f32 * 0.9).sin() * 0.2, 0.0, (i as f32 * 0.5).cos() * 0.1))
        .collect();

    let mut batched = deformed.clone();
    let mut scalar = deformed;
    relax_tris(&model, &mut batched, 1.0);
    relax_tris_scalar(&model, &mut scalar, 1.0);

    for (a, b) in batched.iter().zip(scalar.iter()) {
        assert!((*a - *b).length() < 1e-5, "{a} vs {b}");
    }
}

// ─── Bend Tests ───────────────────────────────────────────────

#[test]
fn bend_restores_rest_separation() {
    // Edge 0–1, one-vertex side A (aliased slots), one-vertex side B.
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        ],
        0,
    )
    .unwrap();
    builder.add_bend(BendDesc {
        edge: [0, 1],
        virtuals: [2, 2, 3, 3],
        te: 0.5,
        tv: 0.0,
        dist: None, // rest separation: |(1,1,0) − (1,0,0)| = 1
        weights: [0.5, 0.5, 0.0, 0.0],
    });
    let model = builder.build().unwrap();

    let mut pos = model.rest_positions().to_vec();
    pos[2] = Vec3::new(1.0, 2.0, 0.0); // separation now 2

    let report = relax_bends(&model, &mut pos);
    assert_eq!(report.corrected, 1);
    // Aliased slots each apply 0.5 of the −1 correction: full restore.
    assert!((pos[2] - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
}

#[test]
fn bend_weight_aliasing_applies_per_slot() {
    // Documented quirk: a node referenced by two slots receives both
    // slot deltas, once per reference.
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        ],
        0,
    )
    .unwrap();
    builder.add_bend(BendDesc {
        edge: [0, 1],
        virtuals: [2, 2, 3, 3],
        te: 0.5,
        tv: 0.0,
        dist: None,
        weights: [0.3, 0.3, 0.2, 0.2],
    });
    let model = builder.build().unwrap();

    let mut pos = model.rest_positions().to_vec();
    pos[2] = Vec3::new(1.0, 2.0, 0.0);
    let before2 = pos[2];
    let before3 = pos[3];

    relax_bends(&model, &mut pos);
    let delta2 = (pos[2] - before2).length();
    let delta3 = (pos[3] - before3).length();
    // Node 2 accumulates 0.3 + 0.3, node 3 accumulates 0.2 + 0.2:
    // the aliased deltas stack at a 3:2 ratio.
    assert!(delta2 > 0.0 && delta3 > 0.0);
    assert!(
        (delta2 / delta3 - 1.5).abs() < 1e-4,
        "ratio {}",
        delta2 / delta3
    );
}

#[test]
fn bend_flat_configuration_uses_substitute_axis() {
    // tv = 0.5 on a symmetric flat patch: the edge point and virtual
    // point coincide, forcing the cross-product fallback axis.
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        ],
        0,
    )
    .unwrap();
    builder.add_bend(BendDesc {
        edge: [0, 1],
        virtuals: [2, 2, 3, 3],
        te: 0.5,
        tv: 0.5,
        dist: Some(0.5),
        weights: [0.5, 0.5, 0.0, 0.0],
    });
    let model = builder.build().unwrap();

    let mut pos = model.rest_positions().to_vec();
    let report = relax_bends(&model, &mut pos);
    // A correction happened, along a well-defined direction, no NaN.
    assert_eq!(report.corrected, 1);
    for p in &pos {
        assert!(p.is_finite());
    }
    assert!((pos[2] - Vec3::new(1.0, 1.0, 0.0)).length() > 1e-4);
}

// ─── Spring Tests ─────────────────────────────────────────────

#[test]
fn spring_converges_with_decaying_envelope() {
    let mut builder = ModelBuilder::new(
        vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 3.5)],
        0,
    )
    .unwrap();
    builder.add_spring(SpringDesc {
        node0: 0,
        node1: 1,
        rest_length: Some(3.0),
        stiffness: 4.0,
        damping: 2.0,
        weight0: 0.5,
    });
    let model = builder.build().unwrap();

    let mut pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 3.5)];
    let mut prev = pos.clone();
    let dt = 1.0 / 30.0;

    let mut window_max = Vec::new();
    let mut current_max = 0.0_f32;
    for step in 0..500 {
        // Verlet advance (inertia), then spring correction.
        let inertial: Vec<Vec3> = pos
            .iter()
            .zip(prev.iter())
            .map(|(p, q)| *p + (*p - *q))
            .collect();
        prev = std::mem::replace(&mut pos, inertial);
        integrate_springs(&model, &mut pos, &prev, dt);

        let stretch = ((pos[1] - pos[0]).length() - 3.0).abs();
        current_max = current_max.max(stretch);
        if step % 100 == 99 {
            window_max.push(current_max);
            current_max = 0.0;
        }
    }

    // Strictly decreasing oscillation envelope, converging to rest.
    for pair in window_max.windows(2) {
        assert!(pair[1] < pair[0], "envelope {window_max:?}");
    }
    assert!(
        *window_max.last().unwrap() < 0.05,
        "envelope {window_max:?}"
    );
}

#[test]
fn spring_below_minimum_separation_is_skipped() {
    let mut builder = ModelBuilder::new(
        vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 0.5)],
        0,
    )
    .unwrap();
    builder.add_spring(SpringDesc {
        node0: 0,
        node1: 1,
        rest_length: Some(2.0),
        stiffness: 10.0,
        damping: 1.0,
        weight0: 0.5,
    });
    let model = builder.build().unwrap();

    let mut pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 0.5)];
    let prev = pos.clone();
    let report = integrate_springs(&model, &mut pos, &prev, DT);
    assert_eq!(report.corrected, 0);
    assert_eq!(pos[1], Vec3::new(0.0, 0.0, 0.5));
}

// ─── Air Drag & Smoothing Tests ───────────────────────────────

fn free_quad_model() -> DeformableModel {
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        0,
    )
    .unwrap();
    builder.add_quad(QuadDesc {
        nodes: [0, 1, 2, 3],
        weights: [1.0; 4],
    });
    builder.build().unwrap()
}

#[test]
fn air_drag_damps_normal_velocity_only() {
    let model = free_quad_model();
    let pos = model.rest_positions().to_vec();
    // Last tick the quad moved +z (normal) and +x (tangential).
    let mut prev: Vec<Vec3> = pos
        .iter()
        .map(|p| *p - Vec3::new(0.02, 0.0, 0.1))
        .collect();

    // dt·drag_constant = 1 → full cancellation of the normal component.
    apply_quad_air_drag(&model, &pos, &mut prev, DT, 60.0, 0.0);

    for (p, q) in pos.iter().zip(prev.iter()) {
        let vel = *p - *q;
        assert!(vel.z.abs() < 1e-6, "normal velocity {} remains", vel.z);
        assert!((vel.x - 0.02).abs() < 1e-6, "tangential velocity changed");
    }
}

#[test]
fn air_drag_clamps_to_full_cancellation() {
    let model = free_quad_model();
    let pos = model.rest_positions().to_vec();
    let mut prev: Vec<Vec3> = pos.iter().map(|p| *p - Vec3::new(0.0, 0.0, 0.5)).collect();

    // Absurd coefficient: factor clamps at 1, never overshoots.
    apply_quad_air_drag(&model, &pos, &mut prev, DT, 1.0e6, 1.0e6);
    for (p, q) in pos.iter().zip(prev.iter()) {
        let vel = *p - *q;
        assert!(vel.z.abs() < 1e-5, "overshoot: {}", vel.z);
    }
}

#[test]
fn velocity_smoothing_equalizes_free_quad() {
    let model = free_quad_model();
    let pos = model.rest_positions().to_vec();
    let mut prev = pos.clone();
    // Give each corner a different backward velocity.
    prev[0] -= Vec3::new(0.0, 0.0, 0.4);
    prev[1] -= Vec3::new(0.0, 0.0, 0.2);
    prev[2] -= Vec3::new(0.2, 0.0, 0.0);
    prev[3] -= Vec3::new(0.0, 0.1, 0.0);

    // Momentum-conserving mean with equal weights.
    let mean = Vec3::new(0.05, 0.025, 0.15);

    smooth_quad_velocities(&model, &pos, &mut prev, 1.0);
    for (p, q) in pos.iter().zip(prev.iter()) {
        assert!(((*p - *q) - mean).length() < 1e-5);
    }
}

#[test]
fn velocity_smoothing_blend_zero_is_noop() {
    let model = free_quad_model();
    let pos = model.rest_positions().to_vec();
    let mut prev = pos.clone();
    prev[0] -= Vec3::new(0.0, 0.0, 0.4);
    let snapshot = prev.clone();

    smooth_quad_velocities(&model, &pos, &mut prev, 0.0);
    assert_eq!(prev, snapshot);
}

// ─── Fit Tests ────────────────────────────────────────────────

fn fit_cluster_model() -> DeformableModel {
    let mut builder = ModelBuilder::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        0,
    )
    .unwrap();
    builder.add_fit_cluster(FitClusterDesc {
        anchor: 0,
        members: vec![(0, 1.0), (1, 1.0), (2, 1.0), (3, 1.0)],
    });
    builder.build().unwrap()
}

#[test]
fn fit_transform_recovers_translation() {
    let model = fit_cluster_model();
    let config = SolverConfig::high_quality();
    let shift = Vec3::new(2.0, -1.0, 3.0);
    let pos: Vec<Vec3> = model.rest_positions().iter().map(|&p| p + shift).collect();

    let mut out = vec![Affine3A::IDENTITY; 1];
    fit_transforms(&model, &pos, &config, &mut out);

    let cluster = &model.fit_clusters()[0];
    // Transform maps rest offsets onto the deformed member positions.
    for member in &cluster.members {
        let mapped = out[0].transform_point3(member.rest_offset);
        let actual = pos[member.node.index()];
        assert!((mapped - actual).length() < 1e-4, "{mapped} vs {actual}");
    }
}

#[test]
fn fit_transform_recovers_rotation() {
    let model = fit_cluster_model();
    let config = SolverConfig::high_quality();
    let rot = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let pos: Vec<Vec3> = model.rest_positions().iter().map(|&p| rot * p).collect();

    let mut out = vec![Affine3A::IDENTITY; 1];
    fit_transforms(&model, &pos, &config, &mut out);

    let cluster = &model.fit_clusters()[0];
    for member in &cluster.members {
        let mapped = out[0].transform_point3(member.rest_offset);
        let actual = pos[member.node.index()];
        assert!((mapped - actual).length() < 1e-3, "{mapped} vs {actual}");
    }
    // The rotation part is proper (no reflection).
    assert!(out[0].matrix3.determinant() > 0.9);
}

#[test]
fn fit_transform_degenerate_cluster_is_orthonormal() {
    // All members collapsed to one point: rank-zero covariance.
    let model = fit_cluster_model();
    let config = SolverConfig::default();
    let pos = vec![Vec3::splat(5.0); 4];

    let mut out = vec![Affine3A::IDENTITY; 1];
    fit_transforms(&model, &pos, &config, &mut out);

    let m = out[0].matrix3;
    assert!(m.determinant() > 0.9, "det {}", m.determinant());
    for c in 0..3 {
        assert!((m.col(c).length() - 1.0).abs() < 1e-3);
    }
}

#[test]
fn feedback_pulls_members_toward_transform() {
    let model = fit_cluster_model();
    let mut pos = model.rest_positions().to_vec();
    let shift = Vec3::new(0.0, 0.0, 2.0);
    let cluster_center = model.fit_clusters()[0].rest_center;
    let transform = Affine3A::from_translation(cluster_center + shift);

    feedback_fit_transforms(&model, &mut pos, &[transform], 1.0);
    let cluster = &model.fit_clusters()[0];
    for member in &cluster.members {
        let expected = cluster_center + shift + member.rest_offset;
        assert!((pos[member.node.index()] - expected).length() < 1e-5);
    }
}

#[test]
fn feedback_partial_stiffness_blends() {
    let model = fit_cluster_model();
    let mut pos = model.rest_positions().to_vec();
    let cluster_center = model.fit_clusters()[0].rest_center;
    let transform = Affine3A::from_translation(cluster_center + Vec3::new(0.0, 0.0, 2.0));

    feedback_fit_transforms(&model, &mut pos, &[transform], 0.5);
    // Halfway there.
    assert!((pos[0].z - 1.0).abs() < 1e-5);
}

// ─── Tick Schedule Tests ──────────────────────────────────────

#[test]
fn tick_on_hanging_cloth_stays_finite_and_static() {
    let model = cloth_grid(4, 4, 0.1, true).unwrap();
    let config = SolverConfig::default();
    let mut buffers = NodeBuffers::from_model(&model);
    let rest_top: Vec<Vec3> = model.rest_positions()[..model.static_node_count()].to_vec();

    let gravity = Vec3::new(0.0, -9.81, 0.0);
    for _ in 0..120 {
        // Verlet advance with gravity on dynamic nodes.
        let snapshot = buffers.positions.clone();
        for i in model.static_node_count()..model.node_count() {
            let vel = buffers.positions[i] - buffers.previous[i];
            buffers.positions[i] += vel + gravity * DT * DT;
        }
        buffers.previous = snapshot;

        let report = run_tick(&model, &config, &mut buffers, DT);
        assert!(report.total_error().is_finite());
    }

    for p in &buffers.positions {
        assert!(p.is_finite());
    }
    // The static prefix never moved.
    for (i, rest) in rest_top.iter().enumerate() {
        assert_eq!(buffers.positions[i], *rest);
    }
    // Rod constraints keep the cloth near structural length: after
    // settling, edges should not be stretched more than a few percent.
    let report = run_tick(&model, &config, &mut buffers, DT);
    assert!(
        report.rods.error < 1e-2,
        "rod error after settling: {}",
        report.rods.error
    );
}
