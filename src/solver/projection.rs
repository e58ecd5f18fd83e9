//! Shared-space views over shape-local variable pairs.
//!
//! A constraint comparing points from two different shapes cannot compare
//! their raw variables: each shape keeps its geometry in its own local
//! coordinate system. A [`Projection`] adapts an `(x, y)` variable pair so
//! the constraint sees shared-space coordinates: reads go through the
//! owning shape's transform, writes through its inverse.
//!
//! A projection owns no state besides the handles; the transform itself
//! lives in a solver slot, so updating the slot refreshes every projection
//! over it at once and no stale coordinates can be cached.

use serde::{Deserialize, Serialize};

use crate::transform::Matrix;

use super::variable::VarId;

/// Handle to a transform slot owned by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformId(pub(crate) u32);

impl TransformId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A transform slot: the shape's matrix together with its precomputed
/// inverse. Invertibility is checked when the slot is installed or updated,
/// so reads and writes during resolution never hit a singular matrix.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransformSlot {
    pub(crate) matrix: Matrix,
    pub(crate) inverse: Matrix,
}

/// A point as seen in the shared canvas space.
///
/// Wraps an `(x, y)` variable pair and, optionally, the owning shape's
/// transform slot. Multiple projections may coexist over the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projection {
    pub x: VarId,
    pub y: VarId,
    transform: Option<TransformId>,
}

impl Projection {
    /// A point already expressed in the shared space.
    pub fn local(x: VarId, y: VarId) -> Self {
        Self {
            x,
            y,
            transform: None,
        }
    }

    /// A shape-local point, projected through the shape's transform slot.
    pub fn through(x: VarId, y: VarId, transform: TransformId) -> Self {
        Self {
            x,
            y,
            transform: Some(transform),
        }
    }

    pub fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    /// Whether this projection reads or writes the given variable.
    pub fn uses(&self, var: VarId) -> bool {
        self.x == var || self.y == var
    }
}
