//! Change notifications for an external undo/redo layer.
//!
//! The solver does not implement undo. Instead every mutation — an external
//! `set_value`, a solver-resolved move during `solve()`, a constraint
//! add or remove — appends one discrete, individually reversible event to
//! an internal queue that the embedding layer drains and journals.
//!
//! Callers replaying a reversal use the silent mutation path
//! ([`Solver::set_value_silent`](super::Solver::set_value_silent)), which
//! suppresses emission for that call only; there is no global toggle.

use serde::{Deserialize, Serialize};

use super::constraint::ConstraintId;
use super::variable::VarId;

/// A single reversible mutation of solver state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolverEvent {
    /// A variable's value changed, externally or during resolution.
    VariableSet {
        variable: VarId,
        old: f64,
        new: f64,
    },

    /// A constraint was registered, indexed under `variables`.
    ConstraintAdded {
        constraint: ConstraintId,
        variables: Vec<VarId>,
    },

    /// A constraint was unregistered from every index entry.
    ConstraintRemoved {
        constraint: ConstraintId,
        variables: Vec<VarId>,
    },
}
