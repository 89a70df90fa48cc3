//! Lane-generic quaternion.
//!
//! Used by the approximate-Jacobi iteration to accumulate Givens
//! rotations cheaply (one quaternion multiply per sweep step instead of
//! a 3×3 matrix multiply), and by the shape-matching kernels to apply
//! recovered rotations.

use glam::Quat;

use crate::lane::Lane;
use crate::vec3x::Vec3x;

/// A quaternion with lane-typed components. Layout is `(x, y, z, w)`.
#[derive(Debug, Clone, Copy)]
pub struct Quatx<L: Lane> {
    pub x: L,
    pub y: L,
    pub z: L,
    pub w: L,
}

impl<L: Lane> Quatx<L> {
    #[inline]
    pub fn new(x: L, y: L, z: L, w: L) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub fn identity() -> Self {
        Self {
            x: L::zero(),
            y: L::zero(),
            z: L::zero(),
            w: L::splat(1.0),
        }
    }

    /// Hamilton product `self * rhs` (apply `rhs` first, then `self`).
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }

    #[inline]
    pub fn length_squared(self) -> L {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    #[inline]
    pub fn normalized(self) -> Self {
        let inv_len = self.length_squared().rsqrt();
        Self {
            x: self.x * inv_len,
            y: self.y * inv_len,
            z: self.z * inv_len,
            w: self.w * inv_len,
        }
    }

    /// Rotate a vector. Requires `self` to be unit length.
    ///
    /// `v' = v + 2w (q × v) + 2 q × (q × v)` with `q = (x, y, z)`.
    #[inline]
    pub fn rotate(self, v: Vec3x<L>) -> Vec3x<L> {
        let q = Vec3x::new(self.x, self.y, self.z);
        let t = q.cross(v);
        let two = L::splat(2.0);
        v + (t.scale(self.w) + q.cross(t)).scale(two)
    }
}

impl From<Quatx<f32>> for Quat {
    #[inline]
    fn from(q: Quatx<f32>) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}
