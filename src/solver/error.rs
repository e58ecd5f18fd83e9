//! Error types for the constraint solver.

use thiserror::Error;

use super::constraint::ConstraintId;

/// Errors reported synchronously by solver operations.
///
/// Routine degenerate geometry (a zero-length line, a collapsed balance
/// band) is handled by documented fallbacks and never errors; these
/// variants are reserved for logic errors in the caller or the constraint
/// setup.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Removal of a constraint that was never added, or was already
    /// removed (e.g. a double-removal after an undo/redo replay race).
    #[error("unknown constraint {0:?}")]
    UnknownConstraint(ConstraintId),

    /// A constraint was constructed with malformed parameters.
    #[error("invalid constraint configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Propagation exceeded its iteration bound: two or more constraints are
    /// perpetually undoing each other's adjustment, which can happen with
    /// badly authored strength assignments.
    #[error(
        "constraint propagation did not converge after {applications} applications \
         across {affected} affected constraints"
    )]
    NonConvergence {
        applications: usize,
        affected: usize,
    },

    /// A projection transform with no inverse was installed.
    #[error("transform matrix is not invertible")]
    SingularTransform,
}

impl SolverError {
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_constraint_display() {
        let err = SolverError::UnknownConstraint(ConstraintId(7));
        assert!(err.to_string().contains("unknown constraint"));
    }

    #[test]
    fn test_non_convergence_display() {
        let err = SolverError::NonConvergence {
            applications: 33,
            affected: 2,
        };
        assert!(err.to_string().contains("did not converge"));
        assert!(err.to_string().contains("33"));
    }
}
