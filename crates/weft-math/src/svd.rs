//! Approximate-Jacobi SVD for 3×3 matrices.
//!
//! Diagonalizes `AᵗA` with a fixed number of cyclic sweeps of
//! *approximate Givens rotations*: the rotation for each off-diagonal
//! pair comes from a rational approximation (no `atan`, no division in
//! the selection), falling back to the exact cos/sin(π/8) quaternion
//! when the diagonal entries are nearly equal. Each rotation is
//! accumulated as a quaternion product, so repeated sweeps compose
//! cheaply and the result is orthonormal by construction.
//!
//! Everything here is lane-generic: the iteration count and the
//! branch-free selects are lane-uniform, so the scalar and 4-wide
//! instantiations walk the exact same path.

use glam::{Mat3, Quat, Vec3};

use crate::lane::Lane;
use crate::quatx::Quatx;
use crate::sym3::SymMat3x;
use crate::vec3x::Vec3x;

/// Rational-approximation threshold: γ = 3 + 2√2.
const GAMMA: f32 = 5.828_427;

/// cos(π/8) — half-angle cosine of the exact 45° fallback rotation.
const COS_PI_8: f32 = 0.923_879_5;

/// sin(π/8) — half-angle sine of the exact 45° fallback rotation.
const SIN_PI_8: f32 = 0.382_683_43;

/// Approximate Givens half-angle `(ch, sh)` for zeroing the off-diagonal
/// entry `spq` of the 2×2 block `[[spp, spq], [spq, sqq]]`.
///
/// Returns a normalized pair. When `γ·sh² < ch²` the rational
/// approximation is valid; otherwise the diagonal entries are nearly
/// equal and the exact 45° rotation (22.5° half angle) is substituted
/// via a branch-free select.
#[inline]
fn approx_givens<L: Lane>(spp: L, spq: L, sqq: L) -> (L, L) {
    let two = L::splat(2.0);
    let gamma = L::splat(GAMMA);

    let ch = two * (spp - sqq);
    let sh = spq;

    let ch_sq = ch * ch;
    let sh_sq = sh * sh;
    let use_approx = (gamma * sh_sq).lt(ch_sq);

    // ch² + sh² > 0 whenever use_approx holds, so the rsqrt is safe;
    // the fallback lanes ignore this value entirely.
    let w = (ch_sq + sh_sq + L::splat(f32::MIN_POSITIVE)).rsqrt();

    let ch_out = L::select(use_approx, w * ch, L::splat(COS_PI_8));
    let sh_out = L::select(use_approx, w * sh, L::splat(SIN_PI_8));
    (ch_out, sh_out)
}

/// Conjugate `s` by the rotation about Z with half-angle `(ch, sh)`,
/// zeroing (approximately) the `m01` entry.
#[inline]
fn conjugate_01<L: Lane>(s: &SymMat3x<L>, ch: L, sh: L) -> SymMat3x<L> {
    let two = L::splat(2.0);
    let c = ch * ch - sh * sh;
    let sn = two * ch * sh;
    let cc = c * c;
    let ss = sn * sn;
    let cs = c * sn;

    SymMat3x {
        m00: cc * s.m00 + two * cs * s.m01 + ss * s.m11,
        m01: cs * (s.m11 - s.m00) + (cc - ss) * s.m01,
        m02: c * s.m02 + sn * s.m12,
        m11: ss * s.m00 - two * cs * s.m01 + cc * s.m11,
        m12: -sn * s.m02 + c * s.m12,
        m22: s.m22,
    }
}

/// Conjugate `s` by the rotation about X, zeroing `m12`.
#[inline]
fn conjugate_12<L: Lane>(s: &SymMat3x<L>, ch: L, sh: L) -> SymMat3x<L> {
    let two = L::splat(2.0);
    let c = ch * ch - sh * sh;
    let sn = two * ch * sh;
    let cc = c * c;
    let ss = sn * sn;
    let cs = c * sn;

    SymMat3x {
        m00: s.m00,
        m01: c * s.m01 + sn * s.m02,
        m02: -sn * s.m01 + c * s.m02,
        m11: cc * s.m11 + two * cs * s.m12 + ss * s.m22,
        m12: cs * (s.m22 - s.m11) + (cc - ss) * s.m12,
        m22: ss * s.m11 - two * cs * s.m12 + cc * s.m22,
    }
}

/// Conjugate `s` by the rotation about Y, zeroing `m02`.
#[inline]
fn conjugate_02<L: Lane>(s: &SymMat3x<L>, ch: L, sh: L) -> SymMat3x<L> {
    let two = L::splat(2.0);
    let c = ch * ch - sh * sh;
    let sn = two * ch * sh;
    let cc = c * c;
    let ss = sn * sn;
    let cs = c * sn;

    SymMat3x {
        m00: cc * s.m00 - two * cs * s.m02 + ss * s.m22,
        m01: c * s.m01 - sn * s.m12,
        m02: cs * (s.m00 - s.m22) + (cc - ss) * s.m02,
        m11: s.m11,
        m12: sn * s.m01 + c * s.m12,
        m22: ss * s.m00 + two * cs * s.m02 + cc * s.m22,
    }
}

/// Diagonalize a symmetric 3×3 matrix by cyclic approximate-Jacobi sweeps.
///
/// Returns the accumulated eigenvector quaternion `V` (unit length) and
/// the conjugated matrix `Vᵗ·S·V`, whose diagonal approximates the
/// eigenvalues. Sweeps stop early once the sum of squared half-angle
/// sines over one sweep drops below `eps` in every lane.
pub fn jacobi_eigen<L: Lane>(s: &SymMat3x<L>, sweeps: u32, eps: f32) -> (Quatx<L>, SymMat3x<L>) {
    let mut m = *s;
    let mut v = Quatx::identity();

    for _ in 0..sweeps {
        // Pair (0,1): rotation about Z.
        let (ch, sh) = approx_givens(m.m00, m.m01, m.m11);
        m = conjugate_01(&m, ch, sh);
        v = v.mul(Quatx::new(L::zero(), L::zero(), sh, ch));
        let mut sin_sq = sh * sh;

        // Pair (1,2): rotation about X.
        let (ch, sh) = approx_givens(m.m11, m.m12, m.m22);
        m = conjugate_12(&m, ch, sh);
        v = v.mul(Quatx::new(sh, L::zero(), L::zero(), ch));
        sin_sq = sin_sq + sh * sh;

        // Pair (0,2): rotation about Y.
        let (ch, sh) = approx_givens(m.m22, m.m02, m.m00);
        m = conjugate_02(&m, ch, sh);
        v = v.mul(Quatx::new(L::zero(), sh, L::zero(), ch));
        sin_sq = sin_sq + sh * sh;

        if sin_sq.reduce_max() < eps {
            break;
        }
    }

    (v.normalized(), m)
}

/// Pseudo-inverse of a symmetric 3×3 matrix via the same iteration.
///
/// Eigenvalues with magnitude ≤ `pinv_eps` get a zero reciprocal rather
/// than a division, so rank-deficient matrices invert onto their range.
pub fn pseudo_inverse<L: Lane>(
    s: &SymMat3x<L>,
    sweeps: u32,
    eps: f32,
    pinv_eps: f32,
) -> SymMat3x<L> {
    let (q, d) = jacobi_eigen(s, sweeps, eps);

    let axes = [
        Vec3x::new(L::splat(1.0), L::zero(), L::zero()),
        Vec3x::new(L::zero(), L::splat(1.0), L::zero()),
        Vec3x::new(L::zero(), L::zero(), L::splat(1.0)),
    ];
    let eigvals = [d.m00, d.m11, d.m22];

    let threshold = L::splat(pinv_eps);
    let mut out = SymMat3x::zero();
    for (axis, lambda) in axes.into_iter().zip(eigvals) {
        let col = q.rotate(axis);
        let recip = L::select(lambda.abs().gt(threshold), L::splat(1.0) / lambda, L::zero());
        out.m00 = out.m00 + recip * col.x * col.x;
        out.m01 = out.m01 + recip * col.x * col.y;
        out.m02 = out.m02 + recip * col.x * col.z;
        out.m11 = out.m11 + recip * col.y * col.y;
        out.m12 = out.m12 + recip * col.y * col.z;
        out.m22 = out.m22 + recip * col.z * col.z;
    }
    out
}

/// Result of a scalar 3×3 SVD: `A = U · diag(sigma) · Vᵗ`.
///
/// `U` and `V` are rotations (right-handed, determinant +1). For inputs
/// with a reflection, the smallest singular value carries the sign
/// instead, which is the convention the bone-fit stage wants.
#[derive(Debug, Clone, Copy)]
pub struct Svd3 {
    pub u: Mat3,
    pub v: Mat3,
    pub sigma: Vec3,
}

/// Any unit vector perpendicular to `v` (assumed unit length).
fn any_perpendicular(v: Vec3) -> Vec3 {
    let ax = v.x.abs();
    let ay = v.y.abs();
    let az = v.z.abs();
    let other = if ax <= ay && ax <= az {
        Vec3::X
    } else if ay <= az {
        Vec3::Y
    } else {
        Vec3::Z
    };
    v.cross(other).normalize()
}

/// Full scalar SVD of a 3×3 matrix.
///
/// `V` comes from the approximate-Jacobi diagonalization of `AᵗA`;
/// `B = A·V` then has orthogonal columns `σᵢ·uᵢ`. Columns are sorted by
/// singular value, largest first (swapping in both `B` and `V`, with a
/// sign flip to keep `V` a rotation), and `U` is rebuilt as an
/// orthonormal right-handed frame even when one or more singular values
/// vanish.
pub fn svd3(a: &Mat3, sweeps: u32, eps: f32) -> Svd3 {
    let c0 = a.col(0);
    let c1 = a.col(1);
    let c2 = a.col(2);
    let ata = SymMat3x::<f32> {
        m00: c0.dot(c0),
        m01: c0.dot(c1),
        m02: c0.dot(c2),
        m11: c1.dot(c1),
        m12: c1.dot(c2),
        m22: c2.dot(c2),
    };

    let (q, _) = jacobi_eigen(&ata, sweeps, eps);
    let mut v = Mat3::from_quat(Quat::from(q));
    let mut b = *a * v;

    // Sort columns by descending column norm of B. Swapping a column
    // pair in both B and V preserves A = B·Vᵗ; negating the same column
    // of both keeps V right-handed.
    let mut norms = [
        b.col(0).length_squared(),
        b.col(1).length_squared(),
        b.col(2).length_squared(),
    ];
    let mut order = [0_usize, 1, 2];
    for i in 0..2 {
        for j in (i + 1)..3 {
            if norms[order[j]] > norms[order[i]] {
                order.swap(i, j);
            }
        }
    }
    if order != [0, 1, 2] {
        let b_cols = [b.col(order[0]), b.col(order[1]), b.col(order[2])];
        let v_cols = [v.col(order[0]), v.col(order[1]), v.col(order[2])];
        let flip = permutation_parity(order);
        b = Mat3::from_cols(b_cols[0], b_cols[1], b_cols[2] * flip);
        v = Mat3::from_cols(v_cols[0], v_cols[1], v_cols[2] * flip);
        norms = [
            b.col(0).length_squared(),
            b.col(1).length_squared(),
            b.col(2).length_squared(),
        ];
    }

    let s0 = norms[0].sqrt();
    let s1 = norms[1].sqrt();

    let u0 = if s0 > eps { b.col(0) / s0 } else { Vec3::X };
    let u1 = if s1 > eps {
        // Re-orthogonalize against u0; near-equal singular values can
        // leave the Jacobi columns slightly skew.
        let raw = b.col(1) - u0 * u0.dot(b.col(1));
        let len = raw.length();
        if len > eps {
            raw / len
        } else {
            any_perpendicular(u0)
        }
    } else {
        any_perpendicular(u0)
    };
    let u2 = u0.cross(u1);

    let sigma = Vec3::new(u0.dot(b.col(0)), u1.dot(b.col(1)), u2.dot(b.col(2)));

    Svd3 {
        u: Mat3::from_cols(u0, u1, u2),
        v,
        sigma,
    }
}

/// `-1.0` for odd permutations of `[0, 1, 2]`, `1.0` for even ones.
fn permutation_parity(order: [usize; 3]) -> f32 {
    let mut inversions = 0;
    for i in 0..3 {
        for j in (i + 1)..3 {
            if order[i] > order[j] {
                inversions += 1;
            }
        }
    }
    if inversions % 2 == 0 { 1.0 } else { -1.0 }
}
