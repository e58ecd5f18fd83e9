//! Variables and strength levels.
//!
//! A [`Variable`] is the atomic unit of constrained state: a scalar value
//! tagged with a [`Strength`] that decides which side of a constraint yields
//! when the relation must move one of its inputs. Variables are owned by the
//! [`Solver`](crate::solver::Solver); external code holds [`VarId`] handles
//! and reads or writes through the solver so every mutation is tracked for
//! incremental re-resolution.

use std::cmp::Ordering;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Priority of a variable when a constraint must move one of its inputs.
///
/// Totally ordered: `Weak < Normal < Strong < VeryStrong < Required`. The
/// weakest variable among a constraint's movable candidates is the one that
/// gets adjusted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Strength {
    Weak,
    #[default]
    Normal,
    Strong,
    VeryStrong,
    Required,
}

/// Handle to a variable owned by a solver.
///
/// Handles are only minted by [`Solver::add_variable`](crate::solver::Solver::add_variable)
/// and are only valid for the solver that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub(crate) u32);

impl VarId {
    /// Position of this variable in the solver's store.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A strength-tagged mutable scalar.
///
/// `Variable` substitutes for a plain number in arithmetic and comparisons:
/// it compares and combines with `f64` (and with other variables) on its
/// current value. Strength never participates in comparison; two variables
/// with equal values but different strengths are equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Variable {
    value: f64,
    strength: Strength,
}

impl Variable {
    pub fn new(value: f64, strength: Strength) -> Self {
        Self { value, strength }
    }

    /// Current value. Reading has no side effect.
    pub fn get(&self) -> f64 {
        self.value
    }

    pub(crate) fn set(&mut self, value: f64) {
        self.value = value;
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }
}

impl From<Variable> for f64 {
    fn from(v: Variable) -> f64 {
        v.value
    }
}

// Comparisons are by value only, so a Variable can stand in for a number
// inside constraint bodies and test assertions.

impl PartialEq for Variable {
    fn eq(&self, other: &Variable) -> bool {
        self.value == other.value
    }
}

impl PartialEq<f64> for Variable {
    fn eq(&self, other: &f64) -> bool {
        self.value == *other
    }
}

impl PartialEq<Variable> for f64 {
    fn eq(&self, other: &Variable) -> bool {
        *self == other.value
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Variable) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl PartialOrd<f64> for Variable {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

impl PartialOrd<Variable> for f64 {
    fn partial_cmp(&self, other: &Variable) -> Option<Ordering> {
        self.partial_cmp(&other.value)
    }
}

macro_rules! variable_ops {
    ($($trait:ident :: $method:ident => $op:tt),* $(,)?) => {
        $(
            impl $trait<f64> for Variable {
                type Output = f64;
                fn $method(self, rhs: f64) -> f64 {
                    self.value $op rhs
                }
            }

            impl $trait<Variable> for f64 {
                type Output = f64;
                fn $method(self, rhs: Variable) -> f64 {
                    self $op rhs.value
                }
            }

            impl $trait<Variable> for Variable {
                type Output = f64;
                fn $method(self, rhs: Variable) -> f64 {
                    self.value $op rhs.value
                }
            }
        )*
    };
}

variable_ops! {
    Add::add => +,
    Sub::sub => -,
    Mul::mul => *,
    Div::div => /,
}
