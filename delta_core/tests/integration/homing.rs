//! Homing sequences driven through the event queue.

use delta_common::printer::config::PrinterConfig;
use delta_common::printer::homing::HomingPhase;
use delta_common::printer::motion::{EnqueueResult, MoveSegment};
use delta_core::error::CommandError;

use super::{homed_printer, printer, printer_with};

#[test]
fn all_towers_home_to_their_maximum() {
    let p = homed_printer();
    for axis in 0..3 {
        assert_eq!(p.homing_phase(axis), Some(HomingPhase::Done));
        let state = p.axis_state(axis).unwrap();
        assert!(state.homed);
        assert_eq!(state.position_steps, 36_000);
        assert_eq!(p.hal().axis(axis).unwrap().position_steps(), 36_000);
    }
    let [x, y, _] = p.cartesian_position().unwrap();
    assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    assert!(!p.is_homed(3));
}

#[test]
fn missing_endstop_fails_and_leaves_axis_unhomed() {
    let mut p = printer();
    p.hal_mut().axis_mut(1).unwrap().set_endstop_position(None);
    p.start_homing(1).unwrap();
    assert_eq!(p.homing_phase(1), Some(HomingPhase::FastApproach));

    let settled = p.run_until(10.0, |p| !p.homing_phase(1).is_some_and(HomingPhase::is_active));
    assert!(settled);
    assert_eq!(p.homing_phase(1), Some(HomingPhase::Failed));
    assert!(!p.is_homed(1));
    // The whole fast distance was travelled.
    assert_eq!(p.hal().axis(1).unwrap().steps_taken(), 36_300);
    assert!(p.cartesian_position().is_none());
}

#[test]
fn homing_blocks_motion_and_repeat_requests() {
    let mut p = printer();
    p.start_homing(0).unwrap();
    assert_eq!(p.start_homing(0), Err(CommandError::Busy));
    let seg = MoveSegment::new(600.0).with_axis(3, 1.0);
    assert_eq!(p.enqueue_segment(&seg), EnqueueResult::Full);

    assert!(p.run_until(10.0, |p| p.is_idle()));
    assert!(p.is_homed(0));
    assert!(p.enqueue_segment(&seg).is_accepted());
}

#[test]
fn emergency_aborts_homing() {
    let mut p = printer();
    p.start_homing_all().unwrap();
    p.run_for(0.5);
    p.emergency_stop();
    for axis in 0..3 {
        assert_eq!(p.homing_phase(axis), Some(HomingPhase::Failed));
        assert!(!p.is_homed(axis));
    }
    let steps = p.hal().axis(0).unwrap().steps_taken();
    p.run_for(0.5);
    assert_eq!(p.hal().axis(0).unwrap().steps_taken(), steps);
}

#[test]
fn inactivity_disables_motors_and_forgets_homing() {
    let mut p = homed_printer();
    p.run_for(30.0);
    assert!(p.is_homed(0));
    p.run_for(31.0);
    for axis in 0..3 {
        assert!(!p.is_homed(axis));
        assert!(!p.axis_state(axis).unwrap().enabled);
    }
    assert!(p.cartesian_position().is_none());
}

#[test]
fn lost_endstop_events_fail_homing_instead_of_hanging() {
    let mut cfg = PrinterConfig::builtin().unwrap();
    // All three towers trip their end-stops on the same tick.
    cfg.planner.event_queue_size = 1;
    let mut p = printer_with(cfg);
    p.start_homing_all().unwrap();
    assert!(p.run_until(15.0, |p| p.is_idle()), "homing never settled");
    assert!(p.event_overflows() > 0);
    for axis in 0..3 {
        assert_eq!(p.homing_phase(axis), Some(HomingPhase::Failed));
        assert!(!p.axis_state(axis).unwrap().homed);
    }
}
