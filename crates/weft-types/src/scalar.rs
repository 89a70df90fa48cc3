//! Scalar type alias for the simulation.
//!
//! The engine is single-precision throughout: node positions, rest
//! shapes and all solver arithmetic use `f32`, matching the SIMD lane
//! width the batched element kernels are built around.

/// The floating-point type used throughout the simulation.
pub type Scalar = f32;
