//! # weft-telemetry
//!
//! Event bus for simulation telemetry. The driving layer emits
//! structured events (pass convergence, tree rebuilds, fit extraction)
//! that pluggable sinks consume — a `Vec` collector for tests, the
//! `tracing` ecosystem for logs. The solver itself stays silent; its
//! pass reports carry the numbers these events are built from.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, PassKind, SimulationEvent};
