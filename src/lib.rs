//! Canvas Solver - an incremental constraint solver for diagram canvases
//!
//! A diagram-editing canvas declares geometric relationships between shapes
//! (point-on-line, equal position, weighted balance, minimum gap). This
//! library keeps those relationships consistent: external code mutates
//! variables, then calls [`Solver::solve`], and only the constraints
//! actually affected by the change are re-resolved.
//!
//! # Example
//!
//! ```rust
//! use canvas_solver::{Constraint, Solver, Strength};
//!
//! let mut solver = Solver::new();
//! let a = solver.add_variable(5.0, Strength::Normal);
//! let b = solver.add_variable(9.0, Strength::Weak);
//! solver.add_constraint(Constraint::equals(a, b)).unwrap();
//! solver.solve().unwrap();
//!
//! // The weaker side yielded.
//! assert_eq!(solver.value(a), 5.0);
//! assert_eq!(solver.value(b), 5.0);
//! ```

pub mod solver;
pub mod transform;

pub use solver::{
    Constraint, ConstraintId, Projection, Solver, SolverError, SolverEvent, Strength, TransformId,
    VarId, Variable, TOLERANCE,
};
pub use transform::Matrix;
