//! Simulation event types.
//!
//! Structured events emitted by the driving layer at various points in
//! each tick. Events are lightweight value types carrying just enough
//! data to be useful for monitoring and debugging.

use serde::{Deserialize, Serialize};

/// Which relaxation/integration pass an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassKind {
    Rods,
    Shapes,
    Bends,
    Springs,
}

/// A simulation event emitted by the engine driver.
///
/// Events are tagged with a tick index and carry domain-specific data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Tick number (0-indexed).
    pub tick: u32,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    /// Tick started.
    TickBegin {
        /// Target simulation time for this tick (seconds).
        sim_time: f64,
    },

    /// Tick completed.
    TickEnd {
        /// Wall-clock time for the entire tick (seconds).
        wall_time: f64,
    },

    /// One relaxation/integration pass completed.
    PassCompleted {
        pass: PassKind,
        /// Summed squared constraint violation before correction.
        error: f32,
        /// Number of corrected elements.
        corrected: u32,
    },

    /// Bounding-tree bounds were recomputed.
    TreeRebuilt {
        /// Number of leaf (dynamic) nodes covered.
        leaf_count: u32,
    },

    /// Fit transforms were extracted for skinning.
    FitComputed {
        cluster_count: u32,
    },

    /// Custom event for extensibility.
    Custom {
        /// Arbitrary label.
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    /// Creates a new event for the given tick.
    pub fn new(tick: u32, kind: EventKind) -> Self {
        Self { tick, kind }
    }
}
