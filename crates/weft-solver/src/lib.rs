//! # weft-solver
//!
//! The relaxation and integration passes of the Weft soft-body engine.
//!
//! All passes share one contract: they operate on flat, caller-owned
//! node-position slices, never allocate in the steady state, and handle
//! numerical degeneracy locally (identity rotation, substitute axis,
//! skipped element) instead of failing. Convergence is the caller's
//! concern — run more passes, read the returned [`PassReport`]s.
//!
//! ## Pass order per tick
//!
//! 1. [`rods::relax_rods`] — distance constraints
//! 2. [`shape::relax_tris`] / [`shape::relax_quads`] — shape matching
//! 3. [`bend::relax_bends`] — axial bends
//! 4. [`springs::integrate_springs`] — damped springs
//! 5. [`aero`] — optional air drag and velocity smoothing
//! 6. [`fit::fit_transforms`] — bone transforms for skinning
//!
//! [`tick::run_tick`] runs 1–5 in order; passes are *not* reorderable.

pub mod aero;
pub mod bend;
pub mod config;
pub mod fit;
pub mod report;
pub mod rods;
pub mod shape;
pub mod springs;
pub mod state;
pub mod tick;

pub use config::SolverConfig;
pub use report::{PassReport, TickReport};
pub use state::NodeBuffers;
pub use tick::{run_tick, run_tick_split};
