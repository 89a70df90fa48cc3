//! # weft-collide
//!
//! Broad-phase collision support for the Weft engine: axis-aligned
//! bounding boxes and a static binary bounding tree over the dynamic
//! nodes. The tree topology is built once from the rest pose; per-tick
//! bounds are recomputed from scratch in a single bottom-up linear
//! pass. Narrow-phase collision against the rest of the world is an
//! external consumer of the bounds array.

pub mod aabb;
pub mod tree;

pub use aabb::Aabb;
pub use tree::BoundingTree;
