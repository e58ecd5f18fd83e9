//! The constraint catalog.
//!
//! A [`Constraint`] is a rule over a fixed set of variables, re-enforced by
//! a single [`apply`](Constraint::apply) entry point. The catalog is a
//! closed enum so the propagation loop dispatches without type inspection.
//!
//! Resolution is strength-based: the weakest movable candidate is the one
//! adjusted, and ties break by declared role order (the second role yields
//! before the first), so behavior is deterministic for a fixed setup.

use serde::{Deserialize, Serialize};

use super::error::SolverError;
use super::projection::{Projection, TransformId, TransformSlot};
use super::variable::{Strength, VarId, Variable};
use super::TOLERANCE;

/// Handle to a constraint registered with a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintId(pub(crate) u32);

impl ConstraintId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A geometric relation between variables.
///
/// Scalar relations (`Equals`, `LessThan`, `Balance`) reference variables
/// directly; planar relations (`Position`, `LineProjection`, `LineAlign`)
/// reference points through [`Projection`]s so the two sides may live in
/// different shapes' coordinate systems.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `a == b`. Moves the weaker side to the other's value; on a strength
    /// tie, `b` yields.
    Equals { a: VarId, b: VarId },

    /// `bigger - smaller >= delta`. Only acts while violated, and moves the
    /// weaker side by the minimal amount that restores the inequality; on a
    /// tie, `bigger` yields.
    LessThan {
        smaller: VarId,
        bigger: VarId,
        delta: f64,
    },

    /// `point == origin`. One-directional: `point` is always the dependent
    /// side, regardless of strength; `origin` is never moved.
    Position {
        origin: Projection,
        point: Projection,
    },

    /// `v == v1 + balance * (v2 - v1)` for the band `(v1, v2)`.
    ///
    /// When the band moves, `v` is recomputed from the stored ratio. When
    /// `v` itself is moved and its strength exceeds both band endpoints',
    /// the ratio is instead recomputed from v's new position (clamped to
    /// `[0, 1]`), so the ratio sticks to wherever `v` was dragged. A
    /// degenerate band (`v1 == v2`) pins `v` to the endpoint and keeps the
    /// stored ratio.
    Balance {
        band: (VarId, VarId),
        v: VarId,
        balance: f64,
    },

    /// `point` lies on the segment `p1..p2` at the ratio recorded at bind
    /// time. Moving the line re-places the point from the stored ratio;
    /// moving the point re-derives the ratio (clamped to `[0, 1]`) and
    /// snaps the point back onto the segment. A zero-length line holds the
    /// ratio fixed and pins the point to `p1`.
    LineProjection {
        line: (Projection, Projection),
        point: Projection,
        ratio: f64,
    },

    /// Like [`LineProjection`](Constraint::LineProjection), but the point
    /// rides at a signed perpendicular offset from the segment instead of
    /// on it. The offset is an absolute shared-space distance: stretching
    /// the line slides the point along it without changing its lateral
    /// distance.
    LineAlign {
        line: (Projection, Projection),
        point: Projection,
        ratio: f64,
        offset: f64,
    },
}

impl Constraint {
    pub fn equals(a: VarId, b: VarId) -> Self {
        Constraint::Equals { a, b }
    }

    pub fn less_than(smaller: VarId, bigger: VarId, delta: f64) -> Self {
        Constraint::LessThan {
            smaller,
            bigger,
            delta,
        }
    }

    pub fn position(origin: Projection, point: Projection) -> Self {
        Constraint::Position { origin, point }
    }

    /// A balance with an explicit interpolation ratio in `[0, 1]`.
    pub fn balance(band: (VarId, VarId), v: VarId, balance: f64) -> Self {
        Constraint::Balance { band, v, balance }
    }

    /// The ratio is derived from the current geometry when the constraint
    /// is added to a solver.
    pub fn line_projection(line: (Projection, Projection), point: Projection) -> Self {
        Constraint::LineProjection {
            line,
            point,
            ratio: 0.0,
        }
    }

    /// Ratio and offset are derived from the current geometry when the
    /// constraint is added to a solver.
    pub fn line_align(line: (Projection, Projection), point: Projection) -> Self {
        Constraint::LineAlign {
            line,
            point,
            ratio: 0.0,
            offset: 0.0,
        }
    }

    /// The variables this constraint reads or writes, in declared role
    /// order. Used by the solver to index the constraint.
    pub fn variables(&self) -> Vec<VarId> {
        match self {
            Constraint::Equals { a, b } => vec![*a, *b],
            Constraint::LessThan {
                smaller, bigger, ..
            } => vec![*smaller, *bigger],
            Constraint::Position { origin, point } => {
                vec![origin.x, origin.y, point.x, point.y]
            }
            Constraint::Balance { band, v, .. } => vec![band.0, band.1, *v],
            Constraint::LineProjection { line, point, .. }
            | Constraint::LineAlign { line, point, .. } => {
                vec![line.0.x, line.0.y, line.1.x, line.1.y, point.x, point.y]
            }
        }
    }

    /// Whether any of this constraint's projections read through the given
    /// transform slot.
    pub fn uses_transform(&self, transform: TransformId) -> bool {
        let uses = |p: &Projection| p.transform() == Some(transform);
        match self {
            Constraint::Equals { .. } | Constraint::LessThan { .. } | Constraint::Balance { .. } => {
                false
            }
            Constraint::Position { origin, point } => uses(origin) || uses(point),
            Constraint::LineProjection { line, point, .. }
            | Constraint::LineAlign { line, point, .. } => {
                uses(&line.0) || uses(&line.1) || uses(point)
            }
        }
    }

    /// Reject malformed constructions before registration.
    pub(crate) fn validate(&self) -> Result<(), SolverError> {
        if let Constraint::Balance { balance, .. } = self {
            if !(0.0..=1.0).contains(balance) || !balance.is_finite() {
                return Err(SolverError::invalid_configuration(format!(
                    "balance ratio {balance} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// Capture bind-time state from the current geometry. Called once when
    /// the constraint is registered.
    pub(crate) fn bind(&mut self, ctx: &ApplyCtx<'_>) {
        match self {
            Constraint::LineProjection { line, point, ratio } => {
                let (x1, y1) = ctx.read_point(&line.0);
                let (x2, y2) = ctx.read_point(&line.1);
                let (px, py) = ctx.read_point(point);
                let (dx, dy) = (x2 - x1, y2 - y1);
                let len2 = dx * dx + dy * dy;
                if len2 > TOLERANCE {
                    *ratio = (((px - x1) * dx + (py - y1) * dy) / len2).clamp(0.0, 1.0);
                }
            }
            Constraint::LineAlign {
                line,
                point,
                ratio,
                offset,
            } => {
                let (x1, y1) = ctx.read_point(&line.0);
                let (x2, y2) = ctx.read_point(&line.1);
                let (px, py) = ctx.read_point(point);
                let (dx, dy) = (x2 - x1, y2 - y1);
                let len2 = dx * dx + dy * dy;
                if len2 > TOLERANCE {
                    let len = len2.sqrt();
                    let (ux, uy) = (dx / len, dy / len);
                    let (rx, ry) = (px - x1, py - y1);
                    *ratio = ((rx * ux + ry * uy) / len).clamp(0.0, 1.0);
                    *offset = rx * -uy + ry * ux;
                }
            }
            _ => {}
        }
    }

    /// Re-establish the relation, adjusting the variables that must yield.
    ///
    /// `trigger` is the dirty variable the solver is currently propagating;
    /// constraints whose rule depends on which side moved (Balance,
    /// LineProjection, LineAlign) consult it, the rest ignore it.
    ///
    /// Idempotent: a second call with no mutation in between writes nothing,
    /// because writes of an unchanged value are dropped by the context.
    pub(crate) fn apply(&mut self, ctx: &mut ApplyCtx<'_>, trigger: VarId) {
        match self {
            Constraint::Equals { a, b } => {
                let (av, bv) = (ctx.value(*a), ctx.value(*b));
                if ctx.strength(*a) < ctx.strength(*b) {
                    ctx.write(*a, bv);
                } else {
                    ctx.write(*b, av);
                }
            }

            Constraint::LessThan {
                smaller,
                bigger,
                delta,
            } => {
                let (sv, bv) = (ctx.value(*smaller), ctx.value(*bigger));
                if bv - sv >= *delta {
                    return;
                }
                if ctx.strength(*smaller) < ctx.strength(*bigger) {
                    ctx.write(*smaller, bv - *delta);
                } else {
                    ctx.write(*bigger, sv + *delta);
                }
            }

            Constraint::Position { origin, point } => {
                let (ox, oy) = ctx.read_point(origin);
                ctx.write_point(point, ox, oy);
            }

            Constraint::Balance { band, v, balance } => {
                let (w1, w2) = (ctx.value(band.0), ctx.value(band.1));
                let span = w2 - w1;
                if trigger == *v
                    && ctx.strength(*v) > ctx.strength(band.0)
                    && ctx.strength(*v) > ctx.strength(band.1)
                    && span.abs() > TOLERANCE
                {
                    *balance = ((ctx.value(*v) - w1) / span).clamp(0.0, 1.0);
                }
                // Degenerate band: pin v to the endpoint, keep the ratio.
                let target = if span.abs() <= TOLERANCE {
                    w1
                } else {
                    w1 + *balance * span
                };
                ctx.write(*v, target);
            }

            Constraint::LineProjection { line, point, ratio } => {
                let (x1, y1) = ctx.read_point(&line.0);
                let (x2, y2) = ctx.read_point(&line.1);
                let (dx, dy) = (x2 - x1, y2 - y1);
                let len2 = dx * dx + dy * dy;
                if len2 <= TOLERANCE {
                    // Zero-length line: hold the ratio, pin to p1.
                    ctx.write_point(point, x1, y1);
                    return;
                }
                if point.uses(trigger) {
                    let (px, py) = ctx.read_point(point);
                    *ratio = (((px - x1) * dx + (py - y1) * dy) / len2).clamp(0.0, 1.0);
                }
                ctx.write_point(point, x1 + *ratio * dx, y1 + *ratio * dy);
            }

            Constraint::LineAlign {
                line,
                point,
                ratio,
                offset,
            } => {
                let (x1, y1) = ctx.read_point(&line.0);
                let (x2, y2) = ctx.read_point(&line.1);
                let (dx, dy) = (x2 - x1, y2 - y1);
                let len2 = dx * dx + dy * dy;
                if len2 <= TOLERANCE {
                    ctx.write_point(point, x1, y1);
                    return;
                }
                let len = len2.sqrt();
                let (ux, uy) = (dx / len, dy / len);
                let (nx, ny) = (-uy, ux);
                if point.uses(trigger) {
                    let (px, py) = ctx.read_point(point);
                    let (rx, ry) = (px - x1, py - y1);
                    *ratio = ((rx * ux + ry * uy) / len).clamp(0.0, 1.0);
                    *offset = rx * nx + ry * ny;
                }
                ctx.write_point(
                    point,
                    x1 + *ratio * dx + *offset * nx,
                    y1 + *ratio * dy + *offset * ny,
                );
            }
        }
    }
}

/// The solver's view of its stores during a constraint application.
///
/// Collects every effective write so the propagation loop can mark the
/// moved variables dirty and emit change events. Writes that leave the
/// value bit-identical are dropped, which is what makes `apply` idempotent
/// and the propagation terminate on stable systems.
pub(crate) struct ApplyCtx<'a> {
    variables: &'a mut [Variable],
    transforms: &'a [TransformSlot],
    moved: Vec<(VarId, f64, f64)>,
}

impl<'a> ApplyCtx<'a> {
    pub(crate) fn new(variables: &'a mut [Variable], transforms: &'a [TransformSlot]) -> Self {
        Self {
            variables,
            transforms,
            moved: Vec::new(),
        }
    }

    /// Effective writes as `(variable, old, new)`, in write order.
    pub(crate) fn into_moved(self) -> Vec<(VarId, f64, f64)> {
        self.moved
    }

    fn value(&self, id: VarId) -> f64 {
        self.variables[id.index()].get()
    }

    fn strength(&self, id: VarId) -> Strength {
        self.variables[id.index()].strength()
    }

    fn write(&mut self, id: VarId, value: f64) {
        let old = self.variables[id.index()].get();
        if old == value {
            return;
        }
        self.variables[id.index()].set(value);
        self.moved.push((id, old, value));
    }

    fn read_point(&self, p: &Projection) -> (f64, f64) {
        let (x, y) = (self.value(p.x), self.value(p.y));
        match p.transform() {
            Some(tid) => self.transforms[tid.index()].matrix.apply(x, y),
            None => (x, y),
        }
    }

    fn write_point(&mut self, p: &Projection, x: f64, y: f64) {
        let (lx, ly) = match p.transform() {
            Some(tid) => self.transforms[tid.index()].inverse.apply(x, y),
            None => (x, y),
        };
        self.write(p.x, lx);
        self.write(p.y, ly);
    }
}
