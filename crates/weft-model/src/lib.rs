//! # weft-model
//!
//! Immutable simulation topology for the Weft relaxation engine.
//!
//! A [`DeformableModel`] is built once from authored descriptors
//! ([`desc`]) by the validating [`ModelBuilder`], then owned immutably
//! for the lifetime of the simulated asset. Node positions are *not*
//! stored here — every descriptor refers to nodes by index into the
//! caller-owned position buffers.
//!
//! ## Key Types
//!
//! - [`DeformableModel`] — the validated, partitioned topology
//! - [`ModelBuilder`] — build-time validation and classification
//! - [`desc`] — serde-friendly authoring descriptors
//! - [`generators`] — deterministic test/bench models

pub mod builder;
pub mod desc;
pub mod generators;
pub mod model;

pub use builder::ModelBuilder;
pub use model::{
    AxialBend, DeformableModel, FitCluster, FitWeight, PinLevel, QuadElement, Rod, Spring,
    TriElement,
};
