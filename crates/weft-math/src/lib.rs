//! # weft-math
//!
//! Small-matrix math for the Weft relaxation engine.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, `Mat3`, etc.)
//! - A numeric-lane abstraction ([`Lane`]) with scalar (`f32`) and
//!   4-wide (`wide::f32x4`) instantiations
//! - Lane-generic 3-vector, quaternion, and symmetric 3×3 types
//! - An approximate-Jacobi SVD built from approximate Givens rotations
//!
//! Every solver kernel that exists in both scalar and batched form is
//! written once against [`Lane`]; the two instantiations cannot diverge
//! because they are the same code.

pub mod lane;
pub mod quatx;
pub mod svd;
pub mod sym3;
pub mod vec3x;

// Re-export glam types as the canonical math types for Weft.
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use lane::Lane;
pub use quatx::Quatx;
pub use svd::{jacobi_eigen, pseudo_inverse, svd3, Svd3};
pub use sym3::SymMat3x;
pub use vec3x::Vec3x;
