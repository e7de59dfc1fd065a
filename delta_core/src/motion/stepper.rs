//! Per-axis step pulse generation.
//!
//! The planner hands each axis a queue of [`StepCommand`]s: runs of steps at
//! constant acceleration with absolute start times. The axis timer handler
//! emits one pulse per firing and derives the next deadline from the
//! previous step rate with the difference equation
//!
//! ```text
//! v_k² = v_{k-1}² + 2a        dt_k = 2 / (v_{k-1} + v_k)
//! ```
//!
//! which is exact for constant acceleration and costs one square root per
//! step. Deadlines are carried as fractional ticks so rounding to the timer
//! resolution never accumulates.

use delta_common::consts::MAX_STEPPER_BUFFER;
use delta_common::hal::driver::Hal;
use delta_common::hal::types::{PinId, Ticks, TimerChannel};
use delta_common::printer::config::AxisConfig;
use heapless::Deque;

use crate::event::{Event, EventQueue};

/// Floor for the step rate so a decelerating run never stalls [steps/tick].
const MIN_RATE: f64 = 1e-9;

// ─── Step Command ───────────────────────────────────────────────────

/// A run of steps on one axis at constant acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCommand {
    /// Direction of travel.
    pub positive: bool,
    pub steps: u32,
    /// Absolute start time [ticks].
    pub start: f64,
    /// Time at which the last step lands, relative to `start` [ticks].
    pub duration: f64,
    /// Step rate at `start` [steps/tick].
    pub v0: f64,
    /// [steps/tick²]
    pub accel: f64,
    /// Stop before any step taken with the end-stop closed.
    pub endstop_check: bool,
}

impl StepCommand {
    /// Run entering at `v0` whose last step lands exactly at
    /// `start + duration`.
    pub fn ramp(positive: bool, steps: u32, start: f64, duration: f64, v0: f64) -> Self {
        let n = f64::from(steps);
        let accel = if duration > 0.0 {
            2.0 * (n - v0 * duration) / (duration * duration)
        } else {
            0.0
        };
        Self {
            positive,
            steps,
            start,
            duration,
            v0,
            accel,
            endstop_check: false,
        }
    }

    /// Constant step rate [steps/tick].
    pub fn constant(positive: bool, steps: u32, start: f64, rate: f64) -> Self {
        let rate = rate.max(MIN_RATE);
        Self {
            positive,
            steps,
            start,
            duration: f64::from(steps) / rate,
            v0: rate,
            accel: 0.0,
            endstop_check: false,
        }
    }

    #[must_use]
    pub fn with_endstop_check(mut self) -> Self {
        self.endstop_check = true;
        self
    }

    /// Absolute time of the last step [ticks].
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Progress through the active command. Written only by the axis handler.
#[derive(Debug, Clone, Copy)]
struct ActiveRun {
    cmd: StepCommand,
    done: u32,
    /// Step rate at the last step [steps/tick].
    v: f64,
    /// Time of the last step relative to `cmd.start` [ticks].
    t: f64,
}

impl ActiveRun {
    fn new(cmd: StepCommand) -> Self {
        Self {
            cmd,
            done: 0,
            v: cmd.v0,
            t: 0.0,
        }
    }

    /// Advance to the next step and return its absolute deadline.
    #[inline]
    fn next_deadline(&mut self) -> f64 {
        if self.done + 1 >= self.cmd.steps {
            self.t = self.cmd.duration;
        } else {
            let v2 = self.v * self.v + 2.0 * self.cmd.accel;
            let v_next = if v2 > MIN_RATE * MIN_RATE {
                v2.sqrt()
            } else {
                MIN_RATE
            };
            let dt = 2.0 / (self.v + v_next);
            self.v = v_next;
            self.t = (self.t + dt).min(self.cmd.duration);
        }
        self.cmd.start + self.t
    }
}

#[inline]
fn to_ticks(t: f64) -> Ticks {
    t.round().max(0.0) as Ticks
}

// ─── Axis Stepper ───────────────────────────────────────────────────

/// Snapshot of one axis for the command interpreter and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    /// Position in axis units.
    pub position: f64,
    pub position_steps: i64,
    /// Last direction written to the dir pin.
    pub positive: bool,
    pub enabled: bool,
    /// Steps still to be emitted, active run plus queue.
    pub pending_steps: u64,
    pub homed: bool,
}

/// Step generator for one axis.
#[derive(Debug)]
pub struct AxisStepper {
    index: u8,
    step_pin: PinId,
    dir_pin: PinId,
    enable_pin: PinId,
    invert_dir: bool,
    invert_enable: bool,
    endstop: Option<(PinId, bool)>,
    steps_per_unit: f64,
    capacity: usize,
    queue: Deque<StepCommand, MAX_STEPPER_BUFFER>,
    active: Option<ActiveRun>,
    position: i64,
    positive: Option<bool>,
    enabled: bool,
    completed: u64,
    steps_emitted: u64,
}

impl AxisStepper {
    pub fn new(index: u8, config: &AxisConfig, capacity: usize) -> Self {
        Self {
            index,
            step_pin: config.step_pin,
            dir_pin: config.dir_pin,
            enable_pin: config.enable_pin,
            invert_dir: config.invert_dir,
            invert_enable: config.invert_enable,
            endstop: config
                .homing
                .as_ref()
                .map(|h| (h.endstop_pin, h.endstop_invert)),
            steps_per_unit: config.steps_per_unit,
            capacity: capacity.clamp(1, MAX_STEPPER_BUFFER),
            queue: Deque::new(),
            active: None,
            position: 0,
            positive: None,
            enabled: false,
            completed: 0,
            steps_emitted: 0,
        }
    }

    #[inline]
    pub fn channel(&self) -> TimerChannel {
        TimerChannel::Axis(self.index)
    }

    /// Drive step low, enable inactive. Called once at startup.
    pub fn init_outputs<H: Hal>(&mut self, hal: &mut H) {
        hal.write_pin(self.step_pin, false);
        hal.write_pin(self.enable_pin, self.invert_enable);
        self.enabled = false;
    }

    // ─── Loop side ──────────────────────────────────────────────────

    /// Queue slots still free.
    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.queue.len())
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Append a command; starts it immediately if the axis is idle.
    ///
    /// Returns the command back when the queue is full.
    pub fn push<H: Hal>(&mut self, hal: &mut H, cmd: StepCommand) -> Result<(), StepCommand> {
        if self.queue.len() >= self.capacity {
            return Err(cmd);
        }
        self.queue.push_back(cmd)?;
        if self.active.is_none() {
            self.start_next(hal);
        }
        Ok(())
    }

    /// Stop immediately and drop everything queued.
    pub fn halt<H: Hal>(&mut self, hal: &mut H) {
        hal.cancel_timer(self.channel());
        self.queue.clear();
        self.active = None;
    }

    pub fn disable<H: Hal>(&mut self, hal: &mut H) {
        hal.write_pin(self.enable_pin, self.invert_enable);
        self.enabled = false;
    }

    pub fn set_position_units(&mut self, units: f64) {
        self.position = (units * self.steps_per_unit).round() as i64;
    }

    pub fn position_steps(&self) -> i64 {
        self.position
    }

    pub fn position_units(&self) -> f64 {
        self.position as f64 / self.steps_per_unit
    }

    pub fn steps_per_unit(&self) -> f64 {
        self.steps_per_unit
    }

    pub fn completed_commands(&self) -> u64 {
        self.completed
    }

    pub fn steps_emitted(&self) -> u64 {
        self.steps_emitted
    }

    pub fn state(&self, homed: bool) -> AxisState {
        let active = self
            .active
            .map_or(0, |r| u64::from(r.cmd.steps.saturating_sub(r.done)));
        let queued: u64 = self.queue.iter().map(|c| u64::from(c.steps)).sum();
        AxisState {
            position: self.position_units(),
            position_steps: self.position,
            positive: self.positive.unwrap_or(true),
            enabled: self.enabled,
            pending_steps: active + queued,
            homed,
        }
    }

    // ─── Interrupt side ─────────────────────────────────────────────

    fn endstop_closed<H: Hal>(&self, hal: &H) -> bool {
        self.endstop
            .is_some_and(|(pin, invert)| hal.read_pin(pin) != invert)
    }

    /// Load the next non-empty command, set dir/enable and arm the first
    /// step. Returns `false` when the queue is exhausted.
    fn start_next<H: Hal>(&mut self, hal: &mut H) -> bool {
        while let Some(cmd) = self.queue.pop_front() {
            if cmd.steps == 0 {
                self.completed += 1;
                continue;
            }
            if self.positive != Some(cmd.positive) {
                hal.write_pin(self.dir_pin, cmd.positive != self.invert_dir);
                self.positive = Some(cmd.positive);
            }
            if !self.enabled {
                hal.write_pin(self.enable_pin, !self.invert_enable);
                self.enabled = true;
            }
            let mut run = ActiveRun::new(cmd);
            let deadline = run.next_deadline();
            self.active = Some(run);
            hal.arm_timer(self.channel(), to_ticks(deadline));
            return true;
        }
        false
    }

    /// Axis timer handler: emit one step, arm the next or move on.
    pub fn on_timer<H: Hal>(&mut self, hal: &mut H, events: &mut EventQueue) {
        let Some(run) = self.active.as_mut() else {
            return;
        };
        if run.cmd.endstop_check && self.endstop.is_some_and(|(pin, inv)| hal.read_pin(pin) != inv)
        {
            self.queue.clear();
            self.active = None;
            events.post(Event::EndstopHit(self.index));
            return;
        }

        hal.write_pin(self.step_pin, true);
        hal.write_pin(self.step_pin, false);
        self.position += if run.cmd.positive { 1 } else { -1 };
        self.steps_emitted += 1;
        run.done += 1;

        if run.done < run.cmd.steps {
            let deadline = run.next_deadline();
            hal.arm_timer(TimerChannel::Axis(self.index), to_ticks(deadline));
            return;
        }

        self.completed += 1;
        self.active = None;
        if !self.start_next(hal) {
            events.post(Event::AxisIdle(self.index));
        }
    }

    /// `true` when the end-stop currently reads closed.
    pub fn endstop_triggered<H: Hal>(&self, hal: &H) -> bool {
        self.endstop_closed(hal)
    }
}
