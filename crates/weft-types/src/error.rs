//! Error types for the Weft engine.
//!
//! All crates return `WeftResult<T>` from fallible operations. Fallibility
//! is concentrated at build time: once a model is constructed, the hot
//! relaxation paths are infallible by design.

use thiserror::Error;

/// Unified error type for the Weft engine.
#[derive(Debug, Error)]
pub enum WeftError {
    /// Topology data is malformed or inconsistent.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// A descriptor references a node outside the model's node range.
    #[error("Node index {index} out of range (node count: {count})")]
    NodeIndexOutOfRange { index: u32, count: u32 },

    /// A weight or parameter is outside its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A structural invariant was violated (e.g., tree numbering).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias for `Result<T, WeftError>`.
pub type WeftResult<T> = Result<T, WeftError>;
