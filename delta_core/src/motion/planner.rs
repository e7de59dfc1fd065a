//! Look-ahead motion planner.
//!
//! Buffers [`MoveSegment`]s in a bounded window and keeps a consistent
//! velocity plan across it. All speed bookkeeping is done in v² so both
//! passes are additions:
//!
//! - backward: the last buffered segment must be able to stop; every other
//!   entry is capped by `exit² + 2·a·L` of its own segment.
//! - forward: starting from the exit speed already committed, each exit is
//!   capped by `entry² + 2·a·L`.
//!
//! Junction speeds are limited by the per-axis cornering distance.
//! Committed segments become per-axis [`StepCommand`]s, one per
//! accelerate/cruise/decelerate phase.

use delta_common::consts::{MAX_AXES, MAX_LOOKAHEAD};
use delta_common::hal::driver::Hal;
use delta_common::hal::types::Ticks;
use delta_common::printer::config::PrinterConfig;
use delta_common::printer::motion::{EnqueueResult, MoveSegment, RejectReason, SegmentFlags};
use heapless::{Deque, Vec};
use tracing::{debug, trace, warn};

use super::stepper::{AxisStepper, StepCommand};
use crate::clock::TimeBase;

/// Scheduling lead for a segment started from idle [s].
const START_LEAD: f64 = 0.001;

/// Phases shorter than this carry no steps [s].
const MIN_PHASE_TIME: f64 = 1e-9;

/// Accelerate, cruise, decelerate.
const PHASES: usize = 3;

const MAX_SEGMENT_COMMANDS: usize = PHASES * MAX_AXES;

// ─── Velocity Profile ───────────────────────────────────────────────

/// Trapezoidal speed profile of one committed segment (path units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityProfile {
    pub length: f64,
    pub entry: f64,
    pub cruise: f64,
    pub exit: f64,
    pub accel: f64,
    pub accel_dist: f64,
    pub cruise_dist: f64,
    pub decel_dist: f64,
    pub accel_time: f64,
    pub cruise_time: f64,
    pub decel_time: f64,
}

impl VelocityProfile {
    /// Fastest profile from `entry` to `exit` over `length` that stays at
    /// or below `max_speed` under acceleration `accel`.
    pub fn plan(length: f64, entry: f64, exit: f64, max_speed: f64, accel: f64) -> Self {
        let peak = ((2.0 * accel * length + entry * entry + exit * exit) / 2.0).sqrt();
        let cruise = max_speed.min(peak).max(entry).max(exit);
        let accel_dist = ((cruise * cruise - entry * entry) / (2.0 * accel)).max(0.0);
        let decel_dist = ((cruise * cruise - exit * exit) / (2.0 * accel)).max(0.0);
        let cruise_dist = (length - accel_dist - decel_dist).max(0.0);
        Self {
            length,
            entry,
            cruise,
            exit,
            accel,
            accel_dist,
            cruise_dist,
            decel_dist,
            accel_time: (cruise - entry) / accel,
            cruise_time: if cruise > 0.0 { cruise_dist / cruise } else { 0.0 },
            decel_time: (cruise - exit) / accel,
        }
    }

    /// Total execution time [s].
    pub fn duration(&self) -> f64 {
        self.accel_time + self.cruise_time + self.decel_time
    }

    fn phases(&self) -> [(f64, f64, f64); PHASES] {
        [
            (self.accel_dist, self.accel_time, self.entry),
            (self.cruise_dist, self.cruise_time, self.cruise),
            (self.decel_dist, self.decel_time, self.cruise),
        ]
    }
}

// ─── Window Entries ─────────────────────────────────────────────────

/// Per-axis limits the planner needs, copied out of the config table.
#[derive(Debug, Clone, Copy)]
struct AxisLimits {
    steps_per_unit: f64,
    min: f64,
    max: f64,
    max_speed: f64,
    max_accel: f64,
    distance_factor: f64,
    cornering_distance: f64,
    requires_homing: bool,
}

#[derive(Debug, Clone, Copy)]
struct Planned {
    delta: [i64; MAX_AXES],
    length: f64,
    /// Axis units per path unit.
    unit: [f64; MAX_AXES],
    accel: f64,
    max_v2: f64,
    /// Cap from speed limits and the junction with the previous segment.
    junction_v2: f64,
    entry_max_v2: f64,
    exit_max_v2: f64,
    entry_v2: f64,
    exit_v2: f64,
    flags: SegmentFlags,
}

/// Direction and exit speed of the last committed segment.
#[derive(Debug, Clone, Copy)]
struct Tail {
    unit: [f64; MAX_AXES],
    max_v2: f64,
    exit_v2: f64,
}

impl Tail {
    const REST: Self = Self {
        unit: [0.0; MAX_AXES],
        max_v2: 0.0,
        exit_v2: 0.0,
    };
}

/// A segment handed to the steppers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommittedSegment {
    pub profile: VelocityProfile,
    /// Absolute start [ticks].
    pub start: Ticks,
    pub delta_steps: [i64; MAX_AXES],
    pub flags: SegmentFlags,
}

/// Admission and commit counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlannerStats {
    pub accepted: u64,
    pub rejected: u64,
    pub full: u64,
    /// Accepted segments that moved no axis by a whole step.
    pub noops: u64,
    pub committed: u64,
    /// Commit attempts deferred for lack of stepper buffer space.
    pub stalls: u64,
}

// ─── Planner ────────────────────────────────────────────────────────

/// Bounded look-ahead window plus the commit path into the steppers.
#[derive(Debug)]
pub struct Planner {
    axes: Vec<AxisLimits, MAX_AXES>,
    time: TimeBase,
    capacity: usize,
    commit_count: usize,
    force_timeout: Ticks,
    speed_limit_multiply: f64,
    max_step_rate: f64,
    window: Vec<Planned, MAX_LOOKAHEAD>,
    /// Target of the last buffered segment, axis units.
    units: [f64; MAX_AXES],
    /// Same, in steps.
    steps: [i64; MAX_AXES],
    tail: Tail,
    /// End of the last committed segment [fractional ticks].
    schedule_end: f64,
    batch_remaining: usize,
    recent: Deque<CommittedSegment, MAX_LOOKAHEAD>,
    stats: PlannerStats,
}

impl Planner {
    pub fn new(config: &PrinterConfig) -> Self {
        let time = TimeBase::new(config.clock.tick_hz);
        let mut axes = Vec::new();
        for a in config.axes.iter().take(MAX_AXES) {
            let _ = axes.push(AxisLimits {
                steps_per_unit: a.steps_per_unit,
                min: a.min,
                max: a.max,
                max_speed: a.max_speed,
                max_accel: a.max_accel,
                distance_factor: a.distance_factor,
                cornering_distance: a.cornering_distance,
                requires_homing: a.homing.is_some(),
            });
        }
        let p = &config.planner;
        Self {
            axes,
            time,
            capacity: p.lookahead_capacity.clamp(1, MAX_LOOKAHEAD),
            commit_count: p.commit_count.max(1),
            force_timeout: time.ticks(p.force_timeout),
            speed_limit_multiply: p.speed_limit_multiply,
            max_step_rate: p.max_step_rate,
            window: Vec::new(),
            units: [0.0; MAX_AXES],
            steps: [0; MAX_AXES],
            tail: Tail::REST,
            schedule_end: 0.0,
            batch_remaining: 0,
            recent: Deque::new(),
            stats: PlannerStats::default(),
        }
    }

    // ─── Admission ──────────────────────────────────────────────────

    /// Check a segment against axis limits and buffer it.
    ///
    /// `homed[i]` gates axes that have a homing block.
    pub fn enqueue(&mut self, segment: &MoveSegment, homed: &[bool]) -> EnqueueResult {
        let result = self.admit(segment, homed);
        match result {
            EnqueueResult::Accepted => self.stats.accepted += 1,
            EnqueueResult::Rejected(reason) => {
                self.stats.rejected += 1;
                warn!(%reason, "segment rejected");
            }
            EnqueueResult::Full => self.stats.full += 1,
        }
        result
    }

    fn admit(&mut self, segment: &MoveSegment, homed: &[bool]) -> EnqueueResult {
        if let Err(reason) = self.check(segment, homed) {
            return EnqueueResult::Rejected(reason);
        }
        if self.window.len() >= self.capacity {
            return EnqueueResult::Full;
        }
        self.buffer(segment);
        EnqueueResult::Accepted
    }

    /// Admission checks that do not depend on buffer space: feed rate,
    /// known axes, homed state and axis bounds, in that order.
    pub fn check(&self, segment: &MoveSegment, homed: &[bool]) -> Result<(), RejectReason> {
        if !segment.feedrate.is_finite() || segment.feedrate <= 0.0 {
            return Err(RejectReason::InvalidFeedrate);
        }
        if let Some((axis, _)) = segment.axes().find(|(i, _)| *i >= self.axes.len()) {
            return Err(RejectReason::UnknownAxis { axis });
        }
        for (axis, target) in segment.axes() {
            let limits = &self.axes[axis];
            if limits.requires_homing && !homed.get(axis).copied().unwrap_or(false) {
                return Err(RejectReason::NotHomed { axis });
            }
            if !target.is_finite() || target < limits.min || target > limits.max {
                return Err(RejectReason::OutOfBounds {
                    axis,
                    target,
                    min: limits.min,
                    max: limits.max,
                });
            }
        }
        Ok(())
    }

    /// Admission passed; turn the segment into a window entry.
    fn buffer(&mut self, segment: &MoveSegment) {
        let n = self.axes.len();
        let mut delta = [0i64; MAX_AXES];
        let mut units_delta = [0.0f64; MAX_AXES];
        let mut target_units = self.units;
        for (axis, target) in segment.axes() {
            let spu = self.axes[axis].steps_per_unit;
            let target_steps = (target * spu).round() as i64;
            delta[axis] = target_steps - self.steps[axis];
            units_delta[axis] = delta[axis] as f64 / spu;
            target_units[axis] = target;
        }
        self.units = target_units;

        if delta[..n].iter().all(|d| *d == 0) {
            self.stats.noops += 1;
            trace!("segment below one step, nothing buffered");
            return;
        }

        let length = units_delta[..n]
            .iter()
            .zip(self.axes.iter())
            .map(|(d, a)| (d * a.distance_factor).powi(2))
            .sum::<f64>()
            .sqrt();

        let mut max_speed = segment.feedrate * self.speed_limit_multiply;
        let mut accel = f64::INFINITY;
        let mut unit = [0.0f64; MAX_AXES];
        for (i, limits) in self.axes.iter().enumerate() {
            let d = units_delta[i].abs();
            if d == 0.0 {
                continue;
            }
            let ratio = length / d;
            max_speed = max_speed
                .min(limits.max_speed * ratio)
                .min(self.max_step_rate * ratio / limits.steps_per_unit);
            accel = accel.min(limits.max_accel * ratio);
            unit[i] = units_delta[i] / length;
        }
        let max_v2 = max_speed * max_speed;

        let (prev_unit, prev_max_v2) = match self.window.last() {
            Some(prev) => (prev.unit, prev.max_v2),
            None => (self.tail.unit, self.tail.max_v2),
        };
        let junction_v2 = max_v2
            .min(prev_max_v2)
            .min(self.cornering_limit(&prev_unit, &unit));

        for (i, d) in delta.iter().enumerate().take(n) {
            self.steps[i] += d;
        }

        let planned = Planned {
            delta,
            length,
            unit,
            accel,
            max_v2,
            junction_v2,
            entry_max_v2: 0.0,
            exit_max_v2: 0.0,
            entry_v2: 0.0,
            exit_v2: 0.0,
            flags: segment.flags,
        };
        // Capacity was checked in `admit`.
        let _ = self.window.push(planned);
        self.replan();
        trace!(
            length,
            max_speed,
            accel,
            buffered = self.window.len(),
            "segment buffered"
        );
    }

    /// Junction v² cap from the per-axis cornering distance.
    fn cornering_limit(&self, prev: &[f64; MAX_AXES], next: &[f64; MAX_AXES]) -> f64 {
        self.axes
            .iter()
            .enumerate()
            .filter_map(|(i, a)| {
                let du = (next[i] - prev[i]).abs();
                (du > 1e-12).then(|| a.max_accel * a.cornering_distance / du)
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Backward then forward pass over the whole window.
    fn replan(&mut self) {
        let mut next_entry_v2 = 0.0;
        for seg in self.window.iter_mut().rev() {
            seg.exit_max_v2 = next_entry_v2;
            let reachable = next_entry_v2 + 2.0 * seg.accel * seg.length;
            seg.entry_max_v2 = seg.junction_v2.min(reachable);
            next_entry_v2 = seg.entry_max_v2;
        }

        let mut v2 = self.tail.exit_v2;
        for seg in self.window.iter_mut() {
            // Previous exit is already within this segment's entry cap.
            seg.entry_v2 = v2;
            seg.exit_v2 = seg
                .exit_max_v2
                .min(seg.entry_v2 + 2.0 * seg.accel * seg.length);
            v2 = seg.exit_v2;
        }
    }

    /// Update the planned position of an axis after homing.
    pub fn set_position(&mut self, axis: usize, units: f64) {
        if let Some(limits) = self.axes.get(axis) {
            self.units[axis] = units;
            self.steps[axis] = (units * limits.steps_per_unit).round() as i64;
        }
    }

    // ─── Commit ─────────────────────────────────────────────────────

    /// Commit a batch once `commit_count` segments are waiting, or
    /// everything when `flush` is set. Returns the number committed.
    pub fn commit<H: Hal>(&mut self, hal: &mut H, steppers: &mut [AxisStepper], flush: bool) -> usize {
        if flush {
            self.batch_remaining = self.window.len();
        } else if self.batch_remaining == 0 && self.window.len() >= self.commit_count {
            self.batch_remaining = self.commit_count;
        }

        let mut committed = 0;
        while self.batch_remaining > 0 && !self.window.is_empty() {
            if !self.commit_front(hal, steppers) {
                self.stats.stalls += 1;
                break;
            }
            self.batch_remaining -= 1;
            committed += 1;
        }
        if self.window.is_empty() {
            self.batch_remaining = 0;
        }
        if committed > 0 {
            debug!(
                committed,
                buffered = self.window.len(),
                flush,
                "planner commit"
            );
        }
        committed
    }

    /// Hand the oldest segment to the steppers if every axis has room.
    fn commit_front<H: Hal>(&mut self, hal: &mut H, steppers: &mut [AxisStepper]) -> bool {
        let Some(seg) = self.window.first().copied() else {
            return false;
        };
        let profile = VelocityProfile::plan(
            seg.length,
            seg.entry_v2.sqrt(),
            seg.exit_v2.sqrt(),
            seg.max_v2.sqrt(),
            seg.accel,
        );
        let now = hal.now() as f64;
        let start = self
            .schedule_end
            .max(now + self.time.ticks_f(START_LEAD));

        let mut commands: Vec<(usize, StepCommand), MAX_SEGMENT_COMMANDS> = Vec::new();
        let mut needed = [0usize; MAX_AXES];
        for (axis, &d) in seg.delta.iter().enumerate().take(self.axes.len()) {
            if d == 0 {
                continue;
            }
            for cmd in self.phase_commands(d, &profile, start) {
                needed[axis] += 1;
                let _ = commands.push((axis, cmd));
            }
        }
        let fits = needed
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .all(|(axis, n)| steppers.get(axis).is_some_and(|s| s.free_slots() >= *n));
        if !fits {
            return false;
        }

        for (axis, cmd) in commands {
            if steppers[axis].push(hal, cmd).is_err() {
                warn!(axis, "stepper buffer refused a checked command");
            }
        }

        self.window.remove(0);
        self.schedule_end = start + self.time.ticks_f(profile.duration());
        self.tail = Tail {
            unit: seg.unit,
            max_v2: seg.max_v2,
            exit_v2: seg.exit_v2,
        };
        if self.recent.is_full() {
            self.recent.pop_front();
        }
        let _ = self.recent.push_back(CommittedSegment {
            profile,
            start: start.round() as Ticks,
            delta_steps: seg.delta,
            flags: seg.flags,
        });
        self.stats.committed += 1;
        true
    }

    /// Split one axis' share of a segment into per-phase step commands.
    fn phase_commands(&self, delta: i64, profile: &VelocityProfile, start: f64) -> Vec<StepCommand, PHASES> {
        let mut out = Vec::new();
        let total = delta.unsigned_abs();
        let positive = delta > 0;
        let steps_per_path = total as f64 / profile.length;
        let phases = profile.phases();
        let last = phases
            .iter()
            .rposition(|(_, t, _)| *t > MIN_PHASE_TIME)
            .unwrap_or(PHASES - 1);

        let mut dist = 0.0;
        let mut done = 0u64;
        let mut t = start;
        for (k, &(d, secs, v_in)) in phases.iter().enumerate() {
            if secs <= MIN_PHASE_TIME {
                continue;
            }
            dist += d;
            let target = if k == last {
                total
            } else {
                ((dist / profile.length) * total as f64).round() as u64
            }
            .clamp(done, total);
            let n = target - done;
            let duration = self.time.ticks_f(secs);
            if n > 0 {
                let v0 = v_in * steps_per_path / self.time.tick_hz();
                let steps = u32::try_from(n).unwrap_or(u32::MAX);
                let _ = out.push(StepCommand::ramp(positive, steps, t, duration, v0));
            }
            done = target;
            t += duration;
        }
        out
    }

    /// Drop everything buffered. Used by emergency shutdown.
    pub fn clear(&mut self) {
        self.window.clear();
        self.batch_remaining = 0;
        self.tail = Tail::REST;
    }

    // ─── Queries ────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_slots(&self) -> usize {
        self.capacity - self.window.len()
    }

    pub fn force_timeout(&self) -> Ticks {
        self.force_timeout
    }

    /// Planned position of an axis at the end of the buffered window.
    pub fn position(&self, axis: usize) -> Option<f64> {
        (axis < self.axes.len()).then(|| self.units[axis])
    }

    /// Entry/exit speeds currently planned for the window [units/s].
    pub fn planned_speeds(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.window
            .iter()
            .map(|s| (s.entry_v2.sqrt(), s.exit_v2.sqrt()))
    }

    /// Most recently committed segments, oldest first.
    pub fn recent_commits(&self) -> impl Iterator<Item = &CommittedSegment> {
        self.recent.iter()
    }

    pub fn stats(&self) -> PlannerStats {
        self.stats
    }
}
