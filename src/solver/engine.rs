//! The propagation engine.
//!
//! [`Solver`] owns the variable, transform, and constraint stores, plus a
//! variable-to-constraint index and a dirty queue. External mutations mark
//! variables dirty; [`solve`](Solver::solve) then propagates through the
//! constraints reachable from the dirty set only, so the cost of an edit is
//! proportional to the geometry it actually affects, not to the size of the
//! canvas.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, trace};

use crate::transform::Matrix;

use super::constraint::{ApplyCtx, Constraint, ConstraintId};
use super::error::SolverError;
use super::event::SolverEvent;
use super::projection::{TransformId, TransformSlot};
use super::variable::{Strength, VarId, Variable};

/// Upper bound on constraint applications per distinct affected
/// constraint. Exceeding it means two constraints are undoing each other.
const ROUND_LIMIT_FACTOR: usize = 16;

/// Registry, dependency index, and propagation driver over variables and
/// constraints.
///
/// Single-threaded and synchronous: `solve()` runs to completion with no
/// background activity, and `&mut self` keeps external code from observing
/// the not-yet-consistent intermediate values it produces.
#[derive(Debug, Default)]
pub struct Solver {
    variables: Vec<Variable>,
    transforms: Vec<TransformSlot>,
    /// Slot per registered constraint; removal empties the slot so a
    /// double-removal is detectable.
    constraints: Vec<Option<Constraint>>,
    /// Constraints indexed under every variable they reference, in
    /// registration order.
    index: HashMap<VarId, Vec<ConstraintId>>,
    queue: VecDeque<VarId>,
    queued: Vec<bool>,
    events: Vec<SolverEvent>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- variables ----------------------------------------------------

    /// Create a variable with an initial value and strength.
    pub fn add_variable(&mut self, value: f64, strength: Strength) -> VarId {
        let id = VarId(self.variables.len() as u32);
        self.variables.push(Variable::new(value, strength));
        self.queued.push(false);
        id
    }

    /// Current value of a variable.
    pub fn value(&self, id: VarId) -> f64 {
        self.variables[id.index()].get()
    }

    /// Copy of the variable, usable in arithmetic and comparisons.
    pub fn variable(&self, id: VarId) -> Variable {
        self.variables[id.index()]
    }

    /// Externally mutate a variable.
    ///
    /// Marks the variable and, transitively through the index, every
    /// constraint referencing it as pending for the next [`solve`], and
    /// emits a [`SolverEvent::VariableSet`]. Writing the value the variable
    /// already holds still marks it dirty.
    pub fn set_value(&mut self, id: VarId, value: f64) {
        self.write_value(id, value, true);
    }

    /// Same mutation as [`set_value`](Solver::set_value), but emits no
    /// event. For undo/redo replay, so reversing a recorded change does not
    /// record a new one.
    pub fn set_value_silent(&mut self, id: VarId, value: f64) {
        self.write_value(id, value, false);
    }

    fn write_value(&mut self, id: VarId, value: f64, record: bool) {
        let old = self.variables[id.index()].get();
        self.variables[id.index()].set(value);
        self.mark_dirty(id);
        if record {
            self.events.push(SolverEvent::VariableSet {
                variable: id,
                old,
                new: value,
            });
        }
    }

    fn mark_dirty(&mut self, id: VarId) {
        if !self.queued[id.index()] {
            self.queued[id.index()] = true;
            self.queue.push_back(id);
        }
    }

    // ---- transforms ---------------------------------------------------

    /// Install a shape transform for projections to read through.
    ///
    /// The matrix must be invertible: writes to a projected point go
    /// through the inverse.
    pub fn add_transform(&mut self, matrix: Matrix) -> Result<TransformId, SolverError> {
        let inverse = matrix.inverse().ok_or(SolverError::SingularTransform)?;
        let id = TransformId(self.transforms.len() as u32);
        self.transforms.push(TransformSlot { matrix, inverse });
        Ok(id)
    }

    /// Current matrix of a transform slot.
    pub fn transform(&self, id: TransformId) -> Matrix {
        self.transforms[id.index()].matrix
    }

    /// Replace a shape's transform after it moved, rotated, or scaled.
    ///
    /// Every constraint projecting through the slot has its variables
    /// marked dirty, so the next [`solve`] re-compares the affected points
    /// in up-to-date shared-space coordinates.
    pub fn set_transform(&mut self, id: TransformId, matrix: Matrix) -> Result<(), SolverError> {
        let inverse = matrix.inverse().ok_or(SolverError::SingularTransform)?;
        self.transforms[id.index()] = TransformSlot { matrix, inverse };

        let stale: Vec<VarId> = self
            .constraints
            .iter()
            .flatten()
            .filter(|c| c.uses_transform(id))
            .flat_map(|c| c.variables())
            .collect();
        for var in stale {
            self.mark_dirty(var);
        }
        Ok(())
    }

    // ---- constraints --------------------------------------------------

    /// Register a constraint.
    ///
    /// Validates its construction, captures bind-time state (line ratios)
    /// from the current geometry, indexes it under every variable it
    /// references, and marks those variables dirty so the next [`solve`]
    /// incorporates it.
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<ConstraintId, SolverError> {
        constraint.validate()?;

        let ctx = ApplyCtx::new(&mut self.variables, &self.transforms);
        constraint.bind(&ctx);

        let id = ConstraintId(self.constraints.len() as u32);
        let variables = constraint.variables();
        for &var in &variables {
            self.index.entry(var).or_default().push(id);
        }
        self.constraints.push(Some(constraint));
        for &var in &variables {
            self.mark_dirty(var);
        }
        self.events.push(SolverEvent::ConstraintAdded {
            constraint: id,
            variables,
        });
        Ok(id)
    }

    /// Unregister a constraint, removing it from every variable's index
    /// entry atomically.
    ///
    /// Fails with [`SolverError::UnknownConstraint`] if the constraint was
    /// never added or was already removed; a double-removal must not
    /// silently no-op.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<(), SolverError> {
        let constraint = self
            .constraints
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(SolverError::UnknownConstraint(id))?;

        let variables = constraint.variables();
        for &var in &variables {
            if let Some(entry) = self.index.get_mut(&var) {
                entry.retain(|&cid| cid != id);
                if entry.is_empty() {
                    self.index.remove(&var);
                }
            }
        }
        self.events.push(SolverEvent::ConstraintRemoved {
            constraint: id,
            variables,
        });
        Ok(())
    }

    /// Shared access to a registered constraint (e.g. to inspect a stored
    /// ratio), or `None` if it was removed.
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id.index()).and_then(Option::as_ref)
    }

    // ---- resolution ---------------------------------------------------

    /// Whether any variable is awaiting propagation.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Propagate pending changes until the system stabilizes.
    ///
    /// Pops dirty variables in FIFO order and applies each constraint
    /// indexed against them in registration order; variables a constraint
    /// moves are enqueued as newly dirty. Only the subgraph reachable from
    /// the initially dirty variables is traversed.
    ///
    /// Total applications are bounded by a multiple of the number of
    /// distinct affected constraints; exceeding the bound returns
    /// [`SolverError::NonConvergence`] instead of looping forever. After an
    /// error, variable values are mid-propagation and should not be
    /// rendered.
    pub fn solve(&mut self) -> Result<(), SolverError> {
        let mut affected: HashSet<ConstraintId> = HashSet::new();
        let mut applications = 0usize;

        while let Some(var) = self.queue.pop_front() {
            self.queued[var.index()] = false;

            let pending = match self.index.get(&var) {
                Some(entry) => entry.clone(),
                None => continue,
            };

            for cid in pending {
                let constraint = match self.constraints.get_mut(cid.index()) {
                    Some(Some(c)) => c,
                    _ => continue,
                };
                affected.insert(cid);
                applications += 1;
                if applications > ROUND_LIMIT_FACTOR * affected.len() {
                    debug!(applications, affected = affected.len(), "solve diverged");
                    return Err(SolverError::NonConvergence {
                        applications,
                        affected: affected.len(),
                    });
                }

                let mut ctx = ApplyCtx::new(&mut self.variables, &self.transforms);
                constraint.apply(&mut ctx, var);
                let moved = ctx.into_moved();
                trace!(?cid, trigger = var.index(), moved = moved.len(), "applied");

                for (id, old, new) in moved {
                    self.mark_dirty(id);
                    self.events.push(SolverEvent::VariableSet {
                        variable: id,
                        old,
                        new,
                    });
                }
            }
        }

        debug!(applications, affected = affected.len(), "solve converged");
        Ok(())
    }

    // ---- events -------------------------------------------------------

    /// Take every change event recorded since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<SolverEvent> {
        std::mem::take(&mut self.events)
    }
}
