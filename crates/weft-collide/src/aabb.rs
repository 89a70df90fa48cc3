//! Axis-aligned bounding box.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that unions as the identity.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    /// Box around a single point with the given radius.
    #[inline]
    pub fn from_point_radius(p: Vec3, radius: f32) -> Self {
        let r = Vec3::splat(radius);
        Self {
            min: p - r,
            max: p + r,
        }
    }

    /// Smallest box containing both inputs.
    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// True if `other` is entirely inside `self`.
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// True if the boxes overlap (touching counts).
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Total positive exceedance of `other` outside `self`, per axis.
    /// Zero when contained.
    pub fn containment_error(&self, other: &Aabb) -> f32 {
        let low = (self.min - other.min).max(Vec3::ZERO);
        let high = (other.max - self.max).max(Vec3::ZERO);
        low.element_sum() + high.element_sum()
    }
}
