//! Lane-generic 3-vector.
//!
//! `Vec3x<f32>` is one point; `Vec3x<f32x4>` is four points in
//! struct-of-arrays form. The batched element kernels in `weft-solver`
//! are written against `Vec3x<L>` and never see the width.

use std::ops::{Add, Mul, Neg, Sub};

use glam::Vec3;
use wide::f32x4;

use crate::lane::Lane;

/// A 3-vector with lane-typed components.
#[derive(Debug, Clone, Copy)]
pub struct Vec3x<L: Lane> {
    pub x: L,
    pub y: L,
    pub z: L,
}

impl<L: Lane> Vec3x<L> {
    #[inline]
    pub fn new(x: L, y: L, z: L) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn zero() -> Self {
        Self {
            x: L::zero(),
            y: L::zero(),
            z: L::zero(),
        }
    }

    /// Broadcast one scalar vector to all lanes.
    #[inline]
    pub fn broadcast(v: Vec3) -> Self {
        Self {
            x: L::splat(v.x),
            y: L::splat(v.y),
            z: L::splat(v.z),
        }
    }

    #[inline]
    pub fn dot(self, rhs: Self) -> L {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[inline]
    pub fn length_squared(self) -> L {
        self.dot(self)
    }

    /// Scale by a lane factor.
    #[inline]
    pub fn scale(self, f: L) -> Self {
        Self {
            x: self.x * f,
            y: self.y * f,
            z: self.z * f,
        }
    }

    /// Per-lane conditional, componentwise.
    #[inline]
    pub fn select(mask: L::Mask, if_true: Self, if_false: Self) -> Self {
        Self {
            x: L::select(mask, if_true.x, if_false.x),
            y: L::select(mask, if_true.y, if_false.y),
            z: L::select(mask, if_true.z, if_false.z),
        }
    }
}

impl<L: Lane> Add for Vec3x<L> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl<L: Lane> Sub for Vec3x<L> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl<L: Lane> Neg for Vec3x<L> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl<L: Lane> Mul<L> for Vec3x<L> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: L) -> Self {
        self.scale(rhs)
    }
}

impl From<Vec3> for Vec3x<f32> {
    #[inline]
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3x<f32>> for Vec3 {
    #[inline]
    fn from(v: Vec3x<f32>) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl Vec3x<f32x4> {
    /// Transpose four scalar vectors into SoA lanes.
    #[inline]
    pub fn gather(v: [Vec3; 4]) -> Self {
        Self {
            x: f32x4::from([v[0].x, v[1].x, v[2].x, v[3].x]),
            y: f32x4::from([v[0].y, v[1].y, v[2].y, v[3].y]),
            z: f32x4::from([v[0].z, v[1].z, v[2].z, v[3].z]),
        }
    }

    /// Transpose SoA lanes back into four scalar vectors.
    #[inline]
    pub fn scatter(self) -> [Vec3; 4] {
        let x = self.x.to_array();
        let y = self.y.to_array();
        let z = self.z.to_array();
        [
            Vec3::new(x[0], y[0], z[0]),
            Vec3::new(x[1], y[1], z[1]),
            Vec3::new(x[2], y[2], z[2]),
            Vec3::new(x[3], y[3], z[3]),
        ]
    }
}
