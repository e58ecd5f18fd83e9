//! Integration tests for the constraint catalog and the propagation loop.
//! These check that solved variable values actually satisfy the declared
//! relations, that resolution picks the right variable to move, and that
//! the solver fails loudly instead of hanging on oscillating systems.

use approx::assert_relative_eq;
use canvas_solver::{Constraint, Projection, Solver, SolverError, SolverEvent, Strength, VarId};

fn point(solver: &mut Solver, x: f64, y: f64, strength: Strength) -> (VarId, VarId) {
    (
        solver.add_variable(x, strength),
        solver.add_variable(y, strength),
    )
}

fn line_ratio(solver: &Solver, cid: canvas_solver::ConstraintId) -> f64 {
    match solver.constraint(cid) {
        Some(Constraint::LineProjection { ratio, .. }) => *ratio,
        Some(Constraint::LineAlign { ratio, .. }) => *ratio,
        other => panic!("expected a line constraint, got {:?}", other),
    }
}

#[test]
fn test_equals_moves_the_weaker_variable() {
    let mut solver = Solver::new();
    let a = solver.add_variable(5.0, Strength::Normal);
    let b = solver.add_variable(9.0, Strength::Weak);
    solver.add_constraint(Constraint::equals(a, b)).unwrap();
    solver.solve().unwrap();

    assert_eq!(solver.value(a), 5.0);
    assert_eq!(solver.value(b), 5.0);
}

#[test]
fn test_equals_chain_propagates_through_the_subgraph() {
    let mut solver = Solver::new();
    let a = solver.add_variable(1.0, Strength::Normal);
    let b = solver.add_variable(2.0, Strength::Weak);
    let c = solver.add_variable(3.0, Strength::Weak);
    solver.add_constraint(Constraint::equals(a, b)).unwrap();
    solver.add_constraint(Constraint::equals(b, c)).unwrap();
    solver.solve().unwrap();

    solver.set_value(a, 7.0);
    solver.solve().unwrap();
    assert_eq!(solver.value(b), 7.0);
    assert_eq!(solver.value(c), 7.0);
}

#[test]
fn test_less_than_restores_the_gap_exactly() {
    let mut solver = Solver::new();
    let smaller = solver.add_variable(10.0, Strength::Normal);
    let bigger = solver.add_variable(12.0, Strength::Normal);
    solver
        .add_constraint(Constraint::less_than(smaller, bigger, 20.0))
        .unwrap();
    solver.solve().unwrap();

    // Tie breaks toward `bigger`; the boundary is hit exactly, no overshoot.
    assert_eq!(solver.value(smaller), 10.0);
    assert_eq!(solver.value(bigger), 30.0);
    assert_eq!(solver.value(bigger) - solver.value(smaller), 20.0);
}

#[test]
fn test_less_than_leaves_satisfied_systems_alone() {
    let mut solver = Solver::new();
    let smaller = solver.add_variable(0.0, Strength::Normal);
    let bigger = solver.add_variable(100.0, Strength::Normal);
    solver
        .add_constraint(Constraint::less_than(smaller, bigger, 20.0))
        .unwrap();
    solver.solve().unwrap();

    assert_eq!(solver.value(smaller), 0.0);
    assert_eq!(solver.value(bigger), 100.0);
}

#[test]
fn test_position_moves_point_never_origin() {
    let mut solver = Solver::new();
    let (ox, oy) = point(&mut solver, 10.0, 11.0, Strength::Normal);
    let (px, py) = point(&mut solver, 12.0, 13.0, Strength::Normal);
    solver
        .add_constraint(Constraint::position(
            Projection::local(ox, oy),
            Projection::local(px, py),
        ))
        .unwrap();
    solver.solve().unwrap();

    assert_eq!(solver.value(px), 10.0);
    assert_eq!(solver.value(py), 11.0);

    solver.set_value(ox, 15.0);
    solver.solve().unwrap();
    assert_eq!(solver.value(px), 15.0);

    // Moving the point externally snaps it back; the origin never moves.
    solver.set_value(px, 99.0);
    solver.set_value(py, 99.0);
    solver.solve().unwrap();
    assert_eq!(solver.value(px), 15.0);
    assert_eq!(solver.value(py), 11.0);
    assert_eq!(solver.value(ox), 15.0);
    assert_eq!(solver.value(oy), 11.0);
}

#[test]
fn test_balance_interpolates_within_the_band() {
    let mut solver = Solver::new();
    let v1 = solver.add_variable(0.0, Strength::Normal);
    let v2 = solver.add_variable(100.0, Strength::Normal);
    let v = solver.add_variable(0.0, Strength::Weak);
    solver
        .add_constraint(Constraint::balance((v1, v2), v, 0.25))
        .unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.value(v), 25.0);

    // Moving the band keeps the ratio.
    solver.set_value(v1, 10.0);
    solver.set_value(v2, 110.0);
    solver.solve().unwrap();
    assert_eq!(solver.value(v), 35.0);
}

#[test]
fn test_balance_ratio_sticks_to_a_stronger_dependent() {
    let mut solver = Solver::new();
    let v1 = solver.add_variable(0.0, Strength::Normal);
    let v2 = solver.add_variable(100.0, Strength::Normal);
    let v = solver.add_variable(0.0, Strength::Strong);
    solver
        .add_constraint(Constraint::balance((v1, v2), v, 0.0))
        .unwrap();
    solver.solve().unwrap();

    // Dragging the stronger dependent re-derives the ratio.
    solver.set_value(v, 60.0);
    solver.solve().unwrap();
    assert_eq!(solver.value(v), 60.0);

    solver.set_value(v1, 100.0);
    solver.set_value(v2, 200.0);
    solver.solve().unwrap();
    assert_relative_eq!(solver.value(v), 160.0, epsilon = 1e-9);
}

#[test]
fn test_balance_ratio_clamps_at_the_band_edge() {
    let mut solver = Solver::new();
    let v1 = solver.add_variable(0.0, Strength::Normal);
    let v2 = solver.add_variable(100.0, Strength::Normal);
    let v = solver.add_variable(0.0, Strength::Strong);
    solver
        .add_constraint(Constraint::balance((v1, v2), v, 0.0))
        .unwrap();
    solver.solve().unwrap();

    // Dragged past the band: ratio clamps to 1 and v snaps to the endpoint.
    solver.set_value(v, 150.0);
    solver.solve().unwrap();
    assert_eq!(solver.value(v), 100.0);
}

#[test]
fn test_balance_degenerate_band_pins_the_dependent() {
    let mut solver = Solver::new();
    let v1 = solver.add_variable(40.0, Strength::Normal);
    let v2 = solver.add_variable(40.0, Strength::Normal);
    let v = solver.add_variable(7.0, Strength::Weak);
    solver
        .add_constraint(Constraint::balance((v1, v2), v, 0.25))
        .unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.value(v), 40.0);
}

#[test]
fn test_line_projection_preserves_ratio_across_line_motion() {
    let mut solver = Solver::new();
    let (x1, y1) = point(&mut solver, 0.0, 0.0, Strength::Normal);
    let (x2, y2) = point(&mut solver, 20.0, 0.0, Strength::Normal);
    let (px, py) = point(&mut solver, 10.0, 0.0, Strength::Normal);
    let cid = solver
        .add_constraint(Constraint::line_projection(
            (Projection::local(x1, y1), Projection::local(x2, y2)),
            Projection::local(px, py),
        ))
        .unwrap();
    solver.solve().unwrap();
    assert_relative_eq!(line_ratio(&solver, cid), 0.5);

    // Stretch the line; the point rides along at the same ratio.
    solver.set_value(x2, 40.0);
    solver.solve().unwrap();
    assert_relative_eq!(solver.value(px), 20.0, epsilon = 1e-9);
    assert_relative_eq!(solver.value(py), 0.0, epsilon = 1e-9);
}

#[test]
fn test_line_projection_rebinds_ratio_when_point_moves() {
    let mut solver = Solver::new();
    let (x1, y1) = point(&mut solver, 0.0, 0.0, Strength::Normal);
    let (x2, y2) = point(&mut solver, 20.0, 0.0, Strength::Normal);
    let (px, py) = point(&mut solver, 10.0, 0.0, Strength::Normal);
    let cid = solver
        .add_constraint(Constraint::line_projection(
            (Projection::local(x1, y1), Projection::local(x2, y2)),
            Projection::local(px, py),
        ))
        .unwrap();
    solver.solve().unwrap();

    // Drag the point; the stored ratio follows and the point snaps onto
    // the segment.
    solver.set_value(px, 5.0);
    solver.set_value(py, 3.0);
    solver.solve().unwrap();
    assert_relative_eq!(line_ratio(&solver, cid), 0.25);
    assert_relative_eq!(solver.value(px), 5.0, epsilon = 1e-9);
    assert_relative_eq!(solver.value(py), 0.0, epsilon = 1e-9);
}

#[test]
fn test_line_projection_zero_length_line_does_not_divide() {
    let mut solver = Solver::new();
    let (x1, y1) = point(&mut solver, 5.0, 5.0, Strength::Normal);
    let (x2, y2) = point(&mut solver, 5.0, 5.0, Strength::Normal);
    let (px, py) = point(&mut solver, 9.0, 9.0, Strength::Normal);
    solver
        .add_constraint(Constraint::line_projection(
            (Projection::local(x1, y1), Projection::local(x2, y2)),
            Projection::local(px, py),
        ))
        .unwrap();
    solver.solve().unwrap();

    assert_eq!(solver.value(px), 5.0);
    assert_eq!(solver.value(py), 5.0);
}

#[test]
fn test_line_align_preserves_lateral_offset() {
    let mut solver = Solver::new();
    let (x1, y1) = point(&mut solver, 0.0, 0.0, Strength::Normal);
    let (x2, y2) = point(&mut solver, 20.0, 0.0, Strength::Normal);
    let (px, py) = point(&mut solver, 10.0, 5.0, Strength::Normal);
    let cid = solver
        .add_constraint(Constraint::line_align(
            (Projection::local(x1, y1), Projection::local(x2, y2)),
            Projection::local(px, py),
        ))
        .unwrap();
    solver.solve().unwrap();
    assert_relative_eq!(line_ratio(&solver, cid), 0.5);

    // Stretching the line slides the point along it; its perpendicular
    // distance stays put.
    solver.set_value(x2, 40.0);
    solver.solve().unwrap();
    assert_relative_eq!(solver.value(px), 20.0, epsilon = 1e-9);
    assert_relative_eq!(solver.value(py), 5.0, epsilon = 1e-9);
}

#[test]
fn test_line_align_follows_line_rotation() {
    let mut solver = Solver::new();
    let (x1, y1) = point(&mut solver, 0.0, 0.0, Strength::Normal);
    let (x2, y2) = point(&mut solver, 20.0, 0.0, Strength::Normal);
    let (px, py) = point(&mut solver, 10.0, 5.0, Strength::Normal);
    solver
        .add_constraint(Constraint::line_align(
            (Projection::local(x1, y1), Projection::local(x2, y2)),
            Projection::local(px, py),
        ))
        .unwrap();
    solver.solve().unwrap();

    // Swing the line to vertical: direction (0, 20), normal (-1, 0).
    solver.set_value(x2, 0.0);
    solver.set_value(y2, 20.0);
    solver.solve().unwrap();
    assert_relative_eq!(solver.value(px), -5.0, epsilon = 1e-9);
    assert_relative_eq!(solver.value(py), 10.0, epsilon = 1e-9);
}

#[test]
fn test_solve_is_idempotent() {
    let mut solver = Solver::new();
    let a = solver.add_variable(5.0, Strength::Normal);
    let b = solver.add_variable(9.0, Strength::Weak);
    let v1 = solver.add_variable(0.0, Strength::Normal);
    let v2 = solver.add_variable(100.0, Strength::Normal);
    let v = solver.add_variable(0.0, Strength::Weak);
    solver.add_constraint(Constraint::equals(a, b)).unwrap();
    solver
        .add_constraint(Constraint::balance((v1, v2), v, 0.25))
        .unwrap();

    solver.solve().unwrap();
    let snapshot: Vec<u64> = [a, b, v1, v2, v]
        .iter()
        .map(|&id| solver.value(id).to_bits())
        .collect();
    solver.drain_events();

    solver.solve().unwrap();
    let again: Vec<u64> = [a, b, v1, v2, v]
        .iter()
        .map(|&id| solver.value(id).to_bits())
        .collect();
    assert_eq!(snapshot, again, "second solve must be bit-identical");
    assert!(
        solver.drain_events().is_empty(),
        "a stable system must not produce change events"
    );
}

#[test]
fn test_untouched_shapes_are_left_alone() {
    let mut solver = Solver::new();
    // Island 1: will be edited.
    let a = solver.add_variable(1.0, Strength::Normal);
    let b = solver.add_variable(1.0, Strength::Weak);
    solver.add_constraint(Constraint::equals(a, b)).unwrap();
    // Island 2: disconnected from the edit.
    let c = solver.add_variable(10.0, Strength::Normal);
    let d = solver.add_variable(10.0, Strength::Weak);
    solver.add_constraint(Constraint::equals(c, d)).unwrap();
    solver.solve().unwrap();
    solver.drain_events();

    solver.set_value(a, 2.0);
    solver.solve().unwrap();

    let touched: Vec<VarId> = solver
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            SolverEvent::VariableSet { variable, .. } => Some(variable),
            _ => None,
        })
        .collect();
    assert!(touched.contains(&a));
    assert!(touched.contains(&b));
    assert!(!touched.contains(&c));
    assert!(!touched.contains(&d));
}

#[test]
fn test_oscillating_required_constraints_report_non_convergence() {
    let mut solver = Solver::new();
    let p = solver.add_variable(1.0, Strength::Required);
    let q = solver.add_variable(2.0, Strength::Required);
    let m = solver.add_variable(0.0, Strength::Weak);
    // Two equalities force m toward two different fixed values forever.
    solver.add_constraint(Constraint::equals(p, m)).unwrap();
    solver.add_constraint(Constraint::equals(q, m)).unwrap();

    match solver.solve() {
        Err(SolverError::NonConvergence { applications, .. }) => {
            assert!(applications > 0);
        }
        other => panic!("expected NonConvergence, got {:?}", other),
    }
    // The fixed values themselves were never weakened.
    assert_eq!(solver.value(p), 1.0);
    assert_eq!(solver.value(q), 2.0);
}

#[test]
fn test_events_carry_enough_to_reverse_an_edit() {
    let mut solver = Solver::new();
    let a = solver.add_variable(5.0, Strength::Normal);
    let b = solver.add_variable(9.0, Strength::Weak);
    solver.add_constraint(Constraint::equals(a, b)).unwrap();
    solver.solve().unwrap();
    solver.drain_events();

    solver.set_value(a, 11.0);
    solver.solve().unwrap();
    let events = solver.drain_events();

    // Replay the events in reverse through the silent path: no new events
    // are recorded, exactly as an undo layer needs.
    for event in events.into_iter().rev() {
        if let SolverEvent::VariableSet { variable, old, .. } = event {
            solver.set_value_silent(variable, old);
        }
    }
    assert_eq!(solver.value(a), 5.0);
    assert_eq!(solver.value(b), 5.0);
    assert!(solver.drain_events().is_empty());
}
