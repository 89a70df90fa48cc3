//! Numerical constants and simulation defaults.

/// Default simulation timestep (seconds). 1/60th of a second.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Default number of relaxation passes per timestep.
pub const DEFAULT_RELAX_PASSES: u32 = 2;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f32 = 1.0e-7;

/// Distance below which a rod is treated as already at its limit.
/// No correction direction can be derived from a shorter separation.
pub const MIN_ROD_DISTANCE: f32 = 9.313_226e-10; // 2^-30

/// Squared-axis-length threshold below which a bend element switches
/// to its substitute (cross-product) axis.
pub const MIN_BEND_AXIS_LENGTH_SQ: f32 = 1.0e-12;

/// Minimum node separation for spring integration. Springs shorter
/// than this are skipped — the correction has no defined direction.
pub const MIN_SPRING_DISTANCE: f32 = 1.0;

/// Default sweep count for the approximate-Jacobi SVD.
pub const DEFAULT_SVD_SWEEPS: u32 = 4;

/// Eigenvalue threshold below which the symmetric pseudo-inverse
/// zeroes the reciprocal instead of dividing.
pub const PSEUDO_INVERSE_EPSILON: f32 = 1.0e-9;
