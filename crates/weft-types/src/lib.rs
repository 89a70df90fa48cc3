//! # weft-types
//!
//! Shared types, identifiers, error types, and numerical constants
//! for the Weft soft-body relaxation engine.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other Weft crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{WeftError, WeftResult};
pub use ids::{FitClusterId, NodeId, QuadId, RodId, TriId};
pub use scalar::Scalar;
