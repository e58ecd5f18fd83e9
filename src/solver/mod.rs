//! Incremental constraint solver for canvas geometry.
//!
//! This module keeps declared geometric relationships between shapes
//! consistent: when an endpoint is dragged or a shape moves, only the
//! constraints reachable from the changed variables are re-resolved.
//!
//! The pieces, leaves first: [`Variable`] is a strength-tagged scalar,
//! [`Constraint`] a rule over a fixed set of variables, [`Projection`] a
//! shared-space view over a shape-local variable pair, and [`Solver`] the
//! registry plus dependency index plus propagation driver tying them
//! together.

pub mod constraint;
pub mod engine;
pub mod error;
pub mod event;
pub mod projection;
pub mod variable;

pub use constraint::{Constraint, ConstraintId};
pub use engine::Solver;
pub use error::SolverError;
pub use event::SolverEvent;
pub use projection::{Projection, TransformId};
pub use variable::{Strength, VarId, Variable};

/// Tolerance under which a constraint's defining relation is considered to
/// hold, and under which geometry (a line, a balance band) is considered
/// degenerate.
pub const TOLERANCE: f64 = 1e-9;
