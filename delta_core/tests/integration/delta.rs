//! Cartesian moves through the delta transform.

use delta_common::printer::motion::{CartesianMove, EnqueueResult, MoveSegment, RejectReason};
use delta_core::motion::DeltaTransform;

use super::{homed_printer, printer};

/// Carriage position tolerance: one step plus rounding [mm].
const TOL: f64 = 0.011;

#[test]
fn cartesian_move_lands_carriages_on_inverse_kinematics() {
    let mut p = homed_printer();
    let transform = DeltaTransform::new(p.config()).unwrap();
    let [_, _, top] = p.cartesian_position().unwrap();
    let target = [20.0, -10.0, top - 50.0];

    let mv = CartesianMove::new(target[0], target[1], target[2], 3000.0).with_axis(3, 3.0);
    assert_eq!(p.enqueue_cartesian(&mv), EnqueueResult::Accepted);
    assert_eq!(p.cartesian_position(), Some(target));

    assert!(p.run_until(10.0, |p| p.is_idle()));
    let expected = transform.inverse(target).unwrap();
    for (axis, h) in expected.iter().enumerate() {
        let state = p.axis_state(axis).unwrap();
        assert!(
            (state.position - h).abs() < TOL,
            "axis {axis}: {} vs {h}",
            state.position
        );
        assert_eq!(
            p.hal().axis(axis).unwrap().position_steps(),
            state.position_steps
        );
    }
    assert_eq!(p.axis_state(3).unwrap().position_steps, 2784);
    assert_eq!(p.hal().axis(0).unwrap().lost_steps(), 0);
}

#[test]
fn long_move_is_split_and_blocks_other_motion() {
    let mut p = homed_printer();
    let [_, _, top] = p.cartesian_position().unwrap();
    let mv = CartesianMove::new(0.0, 0.0, top - 150.0, 6000.0);
    assert!(p.enqueue_cartesian(&mv).is_accepted());

    // 150 mm in 4 mm pieces is 38 sub-segments; the window takes 28.
    assert_eq!(p.planner().stats().accepted, 28);
    assert_eq!(p.pending_split(), Some(10));
    let seg = MoveSegment::new(600.0).with_axis(3, 1.0);
    assert_eq!(p.enqueue_segment(&seg), EnqueueResult::Full);
    let next = CartesianMove::new(1.0, 0.0, top - 150.0, 6000.0);
    assert_eq!(p.enqueue_cartesian(&next), EnqueueResult::Full);

    assert!(p.run_until(10.0, |p| p.is_idle()));
    assert_eq!(p.planner().stats().accepted, 38);
    assert!(p.enqueue_cartesian(&next).is_accepted());
}

#[test]
fn unreachable_target_is_rejected_whole() {
    let mut p = homed_printer();
    let [_, _, top] = p.cartesian_position().unwrap();
    let mv = CartesianMove::new(400.0, 0.0, top - 50.0, 3000.0);
    assert!(matches!(
        p.enqueue_cartesian(&mv),
        EnqueueResult::Rejected(RejectReason::Unreachable | RejectReason::OutOfBounds { .. })
    ));
    assert!(p.planner().is_empty());
    assert!(p.pending_split().is_none());
}

#[test]
fn cartesian_moves_need_homed_towers() {
    let mut p = printer();
    let mv = CartesianMove::new(0.0, 0.0, 100.0, 3000.0);
    assert!(matches!(
        p.enqueue_cartesian(&mv),
        EnqueueResult::Rejected(RejectReason::NotHomed { .. })
    ));
}
