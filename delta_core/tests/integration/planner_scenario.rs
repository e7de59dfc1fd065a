//! Look-ahead admission and batch commit through the printer.

use delta_common::printer::config::PrinterConfig;
use delta_common::printer::motion::{EnqueueResult, MoveSegment, RejectReason};
use delta_core::motion::Planner;
use proptest::prelude::*;

use super::{homed_printer, printer};

/// 200 units/s expressed in the table's units/min feed rates.
const FULL_SPEED_FEED: f64 = 200.0 * 60.0;

#[test]
fn fifteen_short_moves_commit_first_ten() {
    let mut p = homed_printer();
    assert_eq!(p.planner().stats().committed, 0);

    for i in 1..=15 {
        let seg = MoveSegment::new(FULL_SPEED_FEED).with_axis(0, 360.0 - f64::from(i));
        assert_eq!(p.enqueue_segment(&seg), EnqueueResult::Accepted, "segment {i}");
    }

    let stats = p.planner().stats();
    assert_eq!(stats.committed, 10);
    assert_eq!(p.planner().len(), 5);
    let commits: Vec<_> = p.planner().recent_commits().copied().collect();
    assert_eq!(commits.len(), 10);
    for c in &commits {
        assert!(
            (0.0..=200.0).contains(&c.profile.cruise),
            "cruise {} out of range",
            c.profile.cruise
        );
        assert_eq!(c.delta_steps[0], -100);
    }
    for pair in commits.windows(2) {
        assert!(pair[1].start >= pair[0].start);
    }
}

#[test]
fn idle_flush_commits_the_remainder() {
    let mut p = homed_printer();
    for i in 1..=15 {
        let seg = MoveSegment::new(FULL_SPEED_FEED).with_axis(0, 360.0 - f64::from(i));
        p.enqueue_segment(&seg);
    }
    // No further enqueues: the force timeout (0.1 s) commits the tail.
    p.run_for(0.15);
    assert!(p.planner().is_empty());
    assert_eq!(p.planner().stats().committed, 15);

    assert!(p.run_until(2.0, |p| p.is_idle()));
    let state = p.axis_state(0).unwrap();
    assert_eq!(state.position_steps, 34_500);
    assert_eq!(p.hal().axis(0).unwrap().position_steps(), 34_500);
}

#[test]
fn rejections_are_ordered_and_leave_window_untouched() {
    let mut p = homed_printer();
    let before = p.planner().len();

    let bad_feed = MoveSegment::new(0.0).with_axis(0, 10.0);
    assert_eq!(
        p.enqueue_segment(&bad_feed),
        EnqueueResult::Rejected(RejectReason::InvalidFeedrate)
    );
    let unknown = MoveSegment::new(600.0).with_axis(6, 1.0);
    assert!(matches!(
        p.enqueue_segment(&unknown),
        EnqueueResult::Rejected(RejectReason::UnknownAxis { axis: 6 })
    ));
    let outside = MoveSegment::new(600.0).with_axis(1, 400.0);
    assert!(matches!(
        p.enqueue_segment(&outside),
        EnqueueResult::Rejected(RejectReason::OutOfBounds { axis: 1, .. })
    ));
    assert_eq!(p.planner().len(), before);
}

#[test]
fn extruder_moves_without_homing() {
    let mut p = printer();
    let seg = MoveSegment::new(600.0).with_axis(3, 2.0);
    assert_eq!(p.enqueue_segment(&seg), EnqueueResult::Accepted);
    p.flush();
    assert!(p.run_until(2.0, |p| p.is_idle()));
    assert_eq!(p.axis_state(3).unwrap().position_steps, 1856);
}

#[test]
fn zero_length_move_is_a_noop() {
    let mut p = printer();
    let seg = MoveSegment::new(600.0).with_axis(3, 0.0001);
    assert_eq!(p.enqueue_segment(&seg), EnqueueResult::Accepted);
    assert!(p.planner().is_empty());
    assert_eq!(p.planner().stats().noops, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn planned_speeds_stay_feasible(
        moves in prop::collection::vec((-5.0f64..5.0, 60.0f64..6000.0), 1..40)
    ) {
        let cfg = PrinterConfig::builtin().unwrap();
        let max_speed = cfg.axes[3].max_speed;
        let homed = [true; delta_common::consts::MAX_AXES];
        let mut planner = Planner::new(&cfg);
        let mut pos = 0.0;

        for (d, feed) in moves {
            pos += d;
            let seg = MoveSegment::new(feed).with_axis(3, pos);
            let before = planner.len();
            match planner.enqueue(&seg, &homed) {
                EnqueueResult::Full => prop_assert_eq!(before, planner.capacity()),
                r => prop_assert!(r.is_accepted()),
            }
            prop_assert!(planner.len() <= planner.capacity());

            let speeds: Vec<(f64, f64)> = planner.planned_speeds().collect();
            for (entry, exit) in &speeds {
                prop_assert!(entry.is_finite() && exit.is_finite());
                prop_assert!(*entry <= max_speed + 1e-9 && *exit <= max_speed + 1e-9);
            }
            for pair in speeds.windows(2) {
                prop_assert!((pair[0].1 - pair[1].0).abs() < 1e-9);
            }
            if let Some((_, last_exit)) = speeds.last() {
                prop_assert_eq!(*last_exit, 0.0);
            }
        }
    }
}
