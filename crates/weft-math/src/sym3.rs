//! Lane-generic symmetric 3×3 matrix.
//!
//! Stores the six unique entries. Used for the normal equations of the
//! small-angle shape-matching solve (`A·ω = b`, solved by LDLᵀ) and as
//! the `AᵗA` input to the approximate-Jacobi iteration.

use crate::lane::Lane;
use crate::vec3x::Vec3x;

/// Symmetric 3×3 matrix; entry `m[i][j]` with `i <= j` is stored once.
#[derive(Debug, Clone, Copy)]
pub struct SymMat3x<L: Lane> {
    pub m00: L,
    pub m01: L,
    pub m02: L,
    pub m11: L,
    pub m12: L,
    pub m22: L,
}

impl<L: Lane> SymMat3x<L> {
    #[inline]
    pub fn zero() -> Self {
        Self {
            m00: L::zero(),
            m01: L::zero(),
            m02: L::zero(),
            m11: L::zero(),
            m12: L::zero(),
            m22: L::zero(),
        }
    }

    #[inline]
    pub fn diagonal(d0: L, d1: L, d2: L) -> Self {
        Self {
            m00: d0,
            m01: L::zero(),
            m02: L::zero(),
            m11: d1,
            m12: L::zero(),
            m22: d2,
        }
    }

    /// Accumulate `w · (|v|² I − v vᵀ)`, the inertia-like term of the
    /// small-angle normal equations.
    #[inline]
    pub fn add_cross_outer(&mut self, v: Vec3x<L>, w: L) {
        let len_sq = v.length_squared();
        self.m00 = self.m00 + w * (len_sq - v.x * v.x);
        self.m01 = self.m01 - w * (v.x * v.y);
        self.m02 = self.m02 - w * (v.x * v.z);
        self.m11 = self.m11 + w * (len_sq - v.y * v.y);
        self.m12 = self.m12 - w * (v.y * v.z);
        self.m22 = self.m22 + w * (len_sq - v.z * v.z);
    }

    /// Matrix–vector product.
    #[inline]
    pub fn mul_vec(&self, v: Vec3x<L>) -> Vec3x<L> {
        Vec3x::new(
            self.m00 * v.x + self.m01 * v.y + self.m02 * v.z,
            self.m01 * v.x + self.m11 * v.y + self.m12 * v.z,
            self.m02 * v.x + self.m12 * v.y + self.m22 * v.z,
        )
    }

    /// Sum of squared off-diagonal entries (diagonalization residual).
    #[inline]
    pub fn off_diagonal_norm_sq(&self) -> L {
        let two = L::splat(2.0);
        two * (self.m01 * self.m01 + self.m02 * self.m02 + self.m12 * self.m12)
    }

    /// Solve `self · x = b` by LDLᵀ factorization, lane-uniform.
    ///
    /// Degenerate pivots (≤ `pivot_eps`) contribute zero instead of
    /// dividing; the corresponding solution component collapses toward
    /// zero, which projects the solve onto the non-degenerate subspace.
    #[inline]
    pub fn solve_ldlt(&self, b: Vec3x<L>, pivot_eps: f32) -> Vec3x<L> {
        let eps = L::splat(pivot_eps);
        let zero = L::zero();
        let one = L::splat(1.0);

        let d0 = self.m00;
        let inv_d0 = L::select(d0.gt(eps), one / d0, zero);
        let l10 = self.m01 * inv_d0;
        let l20 = self.m02 * inv_d0;

        let d1 = self.m11 - l10 * l10 * d0;
        let inv_d1 = L::select(d1.gt(eps), one / d1, zero);
        let l21 = (self.m12 - l20 * l10 * d0) * inv_d1;

        let d2 = self.m22 - l20 * l20 * d0 - l21 * l21 * d1;
        let inv_d2 = L::select(d2.gt(eps), one / d2, zero);

        // Forward: L y = b
        let y0 = b.x;
        let y1 = b.y - l10 * y0;
        let y2 = b.z - l20 * y0 - l21 * y1;

        // Diagonal: D z = y
        let z0 = y0 * inv_d0;
        let z1 = y1 * inv_d1;
        let z2 = y2 * inv_d2;

        // Backward: Lᵀ x = z
        let x2 = z2;
        let x1 = z1 - l21 * x2;
        let x0 = z0 - l10 * x1 - l20 * x2;

        Vec3x::new(x0, x1, x2)
    }
}
