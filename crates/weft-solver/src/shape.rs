//! Triangle/quad shape-matching relaxation.
//!
//! Elements are partitioned by pinning level and each level has its own
//! solve path:
//!
//! - **Two pinned** — one rotational degree of freedom about the pinned
//!   edge; the optimal angle comes from a single weighted dot/cross
//!   accumulation, no iteration.
//! - **One pinned** — three rotational degrees of freedom about the
//!   pinned corner; the weighted small-angle normal equations (symmetric
//!   3×3, LDLᵀ) yield an axis·tan θ vector applied as a sine-based
//!   rotation.
//! - **Free** — as one-pinned, with the weighted center of mass taking
//!   the place of the pinned corner.
//!
//! Every kernel is written once against the [`Lane`] abstraction; the
//! public passes process elements in 4-wide chunks with a scalar
//! remainder, and the `_scalar` variants exist for callers that need
//! strict Gauss–Seidel ordering. Within a 4-wide chunk corrections are
//! computed from the same snapshot and scattered as accumulated deltas,
//! so elements sharing a node combine additively inside one chunk.
//!
//! Degenerate configurations (zero-length pinned edge, vanished radial
//! reference, collapsed frame) leave the element untouched instead of
//! producing NaN.

use glam::Vec3;
use wide::f32x4;

use weft_math::lane::Lane;
use weft_math::sym3::SymMat3x;
use weft_math::vec3x::Vec3x;
use weft_model::{DeformableModel, PinLevel, QuadElement, TriElement};

use crate::report::PassReport;

/// Squared-length threshold below which a frame axis is degenerate.
const FRAME_EPSILON: f32 = 1.0e-12;

/// LDLᵀ pivot guard for the small-angle normal equations.
const PIVOT_EPSILON: f32 = 1.0e-12;

/// Bias added under `rsqrt` so masked-out degenerate lanes stay finite.
const SAFE_RSQRT_BIAS: f32 = 1.0e-30;

/// Per-element error below which it does not count as corrected.
const CORRECTED_EPSILON: f32 = 1.0e-12;

/// Current-pose element frame, same recipe as the rest frame: x along
/// edge 0→1, normal from `edge × secondary`.
#[inline]
fn element_frame<L: Lane>(
    p0: Vec3x<L>,
    p1: Vec3x<L>,
    secondary: Vec3x<L>,
) -> (Vec3x<L>, Vec3x<L>, Vec3x<L>, L::Mask) {
    let edge = p1 - p0;
    let elen2 = edge.length_squared();
    let n = edge.cross(secondary);
    let nlen2 = n.length_squared();

    let eps = L::splat(FRAME_EPSILON);
    let valid = L::mask_and(elen2.gt(eps), nlen2.gt(eps));

    let bias = L::splat(SAFE_RSQRT_BIAS);
    let e1 = edge.scale((elen2 + bias).rsqrt());
    let e3 = n.scale((nlen2 + bias).rsqrt());
    let e2 = e3.cross(e1);
    (e1, e2, e3, valid)
}

/// Rotate local rest coordinates into world orientation.
#[inline]
fn lift_rest<L: Lane, const N: usize>(
    rest: &[Vec3x<L>; N],
    e1: Vec3x<L>,
    e2: Vec3x<L>,
    e3: Vec3x<L>,
) -> [Vec3x<L>; N] {
    rest.map(|r| e1.scale(r.x) + e2.scale(r.y) + e3.scale(r.z))
}

/// Shared core for the free and one-pinned paths: recover the residual
/// rotation by the weighted small-angle normal equations and blend each
/// vertex toward its matched target. Returns the summed squared
/// pre-correction residual.
fn relax_matched<L: Lane, const N: usize>(
    p: &mut [Vec3x<L>; N],
    rest_world: &[Vec3x<L>; N],
    origin: Vec3x<L>,
    w: &[L; N],
    valid: L::Mask,
) -> L {
    let mut a = SymMat3x::zero();
    let mut b = Vec3x::zero();
    for i in 0..N {
        let d = p[i] - origin;
        a.add_cross_outer(rest_world[i], w[i]);
        b = b + rest_world[i].cross(d).scale(w[i]);
    }

    // ω = axis·tan θ. The singularity-free form below needs no axis
    // normalization: n·sin θ = ω·cos θ and (1−cos θ)/tan²θ = c²/(1+c).
    let omega = a.solve_ldlt(b, PIVOT_EPSILON);
    let t2 = omega.length_squared();
    let one = L::splat(1.0);
    let c = (one + t2).rsqrt();
    let k = c * c / (one + c);

    let mut err = L::zero();
    for i in 0..N {
        let r = rest_world[i];
        let rotated = r.scale(c) + omega.cross(r).scale(c) + omega.scale(omega.dot(r) * k);
        let target = Vec3x::select(valid, origin + rotated, p[i]);
        let diff = target - p[i];
        err = err + diff.length_squared();
        p[i] = p[i] + diff.scale(w[i]);
    }
    err
}

/// Free element: the weighted center of mass is the matching origin.
fn relax_free<L: Lane, const N: usize>(
    p: &mut [Vec3x<L>; N],
    rest: &[Vec3x<L>; N],
    w: &[L; N],
    secondary: Vec3x<L>,
) -> L {
    let (e1, e2, e3, frame_valid) = element_frame(p[0], p[1], secondary);

    let mut total = L::zero();
    let mut com = Vec3x::zero();
    for i in 0..N {
        total = total + w[i];
        com = com + p[i].scale(w[i]);
    }
    let total_valid = total.gt(L::splat(FRAME_EPSILON));
    let com = com.scale(L::splat(1.0) / (total + L::splat(SAFE_RSQRT_BIAS)));

    let rest_world = lift_rest(rest, e1, e2, e3);
    let valid = L::mask_and(frame_valid, total_valid);
    relax_matched(p, &rest_world, com, w, valid)
}

/// One pinned corner: the pinned corner is the matching origin and the
/// rest coordinates are already relative to it.
fn relax_one_pinned<L: Lane, const N: usize>(
    p: &mut [Vec3x<L>; N],
    rest: &[Vec3x<L>; N],
    w: &[L; N],
    secondary: Vec3x<L>,
) -> L {
    let (e1, e2, e3, frame_valid) = element_frame(p[0], p[1], secondary);
    let rest_world = lift_rest(rest, e1, e2, e3);
    relax_matched(p, &rest_world, p[0], w, frame_valid)
}

/// Two pinned corners: a single rotation angle about the pinned edge.
///
/// The radial reference direction comes from the first free vertex
/// (slot 2) in both the rest and current poses, so a rigidly rotated
/// element solves to the identity. The optimal angle's sine/cosine is
/// read off one weighted dot/cross pair.
fn relax_two_pinned<L: Lane, const N: usize>(
    p: &mut [Vec3x<L>; N],
    rest: &[Vec3x<L>; N],
    w: &[L; N],
) -> L {
    let eps = L::splat(FRAME_EPSILON);
    let bias = L::splat(SAFE_RSQRT_BIAS);
    let p0 = p[0];

    let axis_raw = p[1] - p0;
    let alen2 = axis_raw.length_squared();
    let axis = axis_raw.scale((alen2 + bias).rsqrt());

    // Current radial reference from the first free vertex.
    let d2 = p[2] - p0;
    let q = d2 - axis.scale(axis.dot(d2));
    let qlen2 = q.length_squared();
    let n1 = q.scale((qlen2 + bias).rsqrt());
    let n2 = axis.cross(n1);

    // Rest radial reference from the same vertex.
    let r2y = rest[2].y;
    let r2z = rest[2].z;
    let u1sq = r2y * r2y + r2z * r2z;
    let inv_u1 = (u1sq + bias).rsqrt();

    let valid = L::mask_and(
        L::mask_and(alen2.gt(eps), qlen2.gt(eps)),
        u1sq.gt(eps),
    );

    // Weighted dot/cross accumulation over the free vertices.
    let mut dot = L::zero();
    let mut crs = L::zero();
    let mut ru = [L::zero(); N];
    let mut rv = [L::zero(); N];
    for i in 2..N {
        ru[i] = (r2y * rest[i].y + r2z * rest[i].z) * inv_u1;
        rv[i] = (r2y * rest[i].z - r2z * rest[i].y) * inv_u1;
        let d = p[i] - p0;
        let cu = n1.dot(d);
        let cv = n2.dot(d);
        dot = dot + w[i] * (ru[i] * cu + rv[i] * cv);
        crs = crs + w[i] * (ru[i] * cv - rv[i] * cu);
    }

    let nrm2 = dot * dot + crs * crs;
    let rot_valid = nrm2.gt(eps);
    let inv = (nrm2 + bias).rsqrt();
    let cos = L::select(rot_valid, dot * inv, L::splat(1.0));
    let sin = L::select(rot_valid, crs * inv, L::zero());

    let mut err = L::zero();
    for i in 2..N {
        let tu = ru[i] * cos - rv[i] * sin;
        let tv = ru[i] * sin + rv[i] * cos;
        let target = p0 + axis.scale(rest[i].x) + n1.scale(tu) + n2.scale(tv);
        let target = Vec3x::select(valid, target, p[i]);
        let diff = target - p[i];
        err = err + diff.length_squared();
        p[i] = p[i] + diff.scale(w[i]);
    }
    err
}

#[inline]
fn relax_element<L: Lane, const N: usize>(
    p: &mut [Vec3x<L>; N],
    rest: &[Vec3x<L>; N],
    w: &[L; N],
    level: PinLevel,
) -> L {
    let two = L::splat(2.0);
    // Quad secondary: p2 + p3 − 2·p0; triangle secondary: p2 − p0.
    let secondary = if N == 4 {
        p[2] + p[N - 1] - p[0].scale(two)
    } else {
        p[2] - p[0]
    };
    match level {
        PinLevel::Two => relax_two_pinned(p, rest, w),
        PinLevel::One => relax_one_pinned(p, rest, w, secondary),
        PinLevel::Free => relax_free(p, rest, w, secondary),
    }
}

// ─── Scalar drivers ───────────────────────────────────────────

fn tri_rest_scalar(elem: &TriElement, scale: f32) -> [Vec3x<f32>; 3] {
    elem.rest
        .map(|r| Vec3x::new(r.x * scale, r.y * scale, 0.0))
}

fn quad_rest_scalar(elem: &QuadElement, scale: f32) -> [Vec3x<f32>; 4] {
    elem.rest
        .map(|r| Vec3x::new(r.x * scale, r.y * scale, r.z * scale))
}

fn relax_tri_single(
    elem: &TriElement,
    positions: &mut [Vec3],
    scale: f32,
    level: PinLevel,
    report: &mut PassReport,
) {
    let mut p: [Vec3x<f32>; 3] = elem.nodes.map(|n| positions[n.index()].into());
    let rest = tri_rest_scalar(elem, scale);
    let err = relax_element(&mut p, &rest, &elem.weights, level);
    for (i, &n) in elem.nodes.iter().enumerate() {
        positions[n.index()] = p[i].into();
    }
    report.error += err;
    if err > CORRECTED_EPSILON {
        report.corrected += 1;
    }
}

fn relax_quad_single(
    elem: &QuadElement,
    positions: &mut [Vec3],
    scale: f32,
    level: PinLevel,
    report: &mut PassReport,
) {
    let mut p: [Vec3x<f32>; 4] = elem.nodes.map(|n| positions[n.index()].into());
    let rest = quad_rest_scalar(elem, scale);
    let err = relax_element(&mut p, &rest, &elem.weights, level);
    for (i, &n) in elem.nodes.iter().enumerate() {
        positions[n.index()] = p[i].into();
    }
    report.error += err;
    if err > CORRECTED_EPSILON {
        report.corrected += 1;
    }
}

// ─── Batched drivers ──────────────────────────────────────────

#[inline]
fn lane_of(values: [f32; 4]) -> f32x4 {
    f32x4::from(values)
}

fn relax_tri_chunk(
    chunk: &[TriElement],
    positions: &mut [Vec3],
    scale: f32,
    level: PinLevel,
    report: &mut PassReport,
) {
    let original: [Vec3x<f32x4>; 3] = core::array::from_fn(|slot| {
        Vec3x::gather(core::array::from_fn(|lane| {
            positions[chunk[lane].nodes[slot].index()]
        }))
    });
    let rest: [Vec3x<f32x4>; 3] = core::array::from_fn(|slot| {
        Vec3x::new(
            lane_of(core::array::from_fn(|lane| chunk[lane].rest[slot].x * scale)),
            lane_of(core::array::from_fn(|lane| chunk[lane].rest[slot].y * scale)),
            f32x4::ZERO,
        )
    });
    let w: [f32x4; 3] =
        core::array::from_fn(|slot| lane_of(core::array::from_fn(|lane| chunk[lane].weights[slot])));

    let mut p = original;
    let err = relax_element(&mut p, &rest, &w, level);

    for slot in 0..3 {
        let before = original[slot].scatter();
        let after = p[slot].scatter();
        for lane in 0..4 {
            positions[chunk[lane].nodes[slot].index()] += after[lane] - before[lane];
        }
    }

    report.error += err.reduce_add();
    for &e in err.to_array().iter() {
        if e > CORRECTED_EPSILON {
            report.corrected += 1;
        }
    }
}

fn relax_quad_chunk(
    chunk: &[QuadElement],
    positions: &mut [Vec3],
    scale: f32,
    level: PinLevel,
    report: &mut PassReport,
) {
    let original: [Vec3x<f32x4>; 4] = core::array::from_fn(|slot| {
        Vec3x::gather(core::array::from_fn(|lane| {
            positions[chunk[lane].nodes[slot].index()]
        }))
    });
    let rest: [Vec3x<f32x4>; 4] = core::array::from_fn(|slot| {
        Vec3x::new(
            lane_of(core::array::from_fn(|lane| chunk[lane].rest[slot].x * scale)),
            lane_of(core::array::from_fn(|lane| chunk[lane].rest[slot].y * scale)),
            lane_of(core::array::from_fn(|lane| chunk[lane].rest[slot].z * scale)),
        )
    });
    let w: [f32x4; 4] =
        core::array::from_fn(|slot| lane_of(core::array::from_fn(|lane| chunk[lane].weights[slot])));

    let mut p = original;
    let err = relax_element(&mut p, &rest, &w, level);

    for slot in 0..4 {
        let before = original[slot].scatter();
        let after = p[slot].scatter();
        for lane in 0..4 {
            positions[chunk[lane].nodes[slot].index()] += after[lane] - before[lane];
        }
    }

    report.error += err.reduce_add();
    for &e in err.to_array().iter() {
        if e > CORRECTED_EPSILON {
            report.corrected += 1;
        }
    }
}

// ─── Public passes ────────────────────────────────────────────

const LEVEL_ORDER: [PinLevel; 3] = [PinLevel::Two, PinLevel::One, PinLevel::Free];

/// Relax all triangle elements, 4-wide batched with a scalar remainder.
pub fn relax_tris(model: &DeformableModel, positions: &mut [Vec3], model_scale: f32) -> PassReport {
    debug_assert_eq!(positions.len(), model.node_count());

    let mut report = PassReport::default();
    for level in LEVEL_ORDER {
        let elems = model.tris(level);
        let mut chunks = elems.chunks_exact(4);
        for chunk in &mut chunks {
            relax_tri_chunk(chunk, positions, model_scale, level, &mut report);
        }
        for elem in chunks.remainder() {
            relax_tri_single(elem, positions, model_scale, level, &mut report);
        }
    }
    report
}

/// Scalar variant of [`relax_tris`]: strict element-by-element
/// Gauss–Seidel ordering.
pub fn relax_tris_scalar(
    model: &DeformableModel,
    positions: &mut [Vec3],
    model_scale: f32,
) -> PassReport {
    debug_assert_eq!(positions.len(), model.node_count());

    let mut report = PassReport::default();
    for level in LEVEL_ORDER {
        for elem in model.tris(level) {
            relax_tri_single(elem, positions, model_scale, level, &mut report);
        }
    }
    report
}

/// Relax all quad elements, 4-wide batched with a scalar remainder.
pub fn relax_quads(
    model: &DeformableModel,
    positions: &mut [Vec3],
    model_scale: f32,
) -> PassReport {
    debug_assert_eq!(positions.len(), model.node_count());

    let mut report = PassReport::default();
    for level in LEVEL_ORDER {
        let elems = model.quads(level);
        let mut chunks = elems.chunks_exact(4);
        for chunk in &mut chunks {
            relax_quad_chunk(chunk, positions, model_scale, level, &mut report);
        }
        for elem in chunks.remainder() {
            relax_quad_single(elem, positions, model_scale, level, &mut report);
        }
    }
    report
}

/// Scalar variant of [`relax_quads`].
pub fn relax_quads_scalar(
    model: &DeformableModel,
    positions: &mut [Vec3],
    model_scale: f32,
) -> PassReport {
    debug_assert_eq!(positions.len(), model.node_count());

    let mut report = PassReport::default();
    for level in LEVEL_ORDER {
        for elem in model.quads(level) {
            relax_quad_single(elem, positions, model_scale, level, &mut report);
        }
    }
    report
}
