//! The printer context.
//!
//! [`Printer`] owns the HAL and every component, and is the only place that
//! wires them together. It plays two roles:
//!
//! - interrupt dispatch: [`service_interrupts`](Printer::service_interrupts)
//!   fires due timer channels and runs the matching handler. Handlers touch
//!   only their own component and post [`Event`]s;
//! - the cooperative loop: [`run_once`](Printer::run_once) drains events,
//!   commits planned motion, runs control laws and housekeeping, and kicks
//!   the watchdog.
//!
//! The command interpreter calls the `enqueue_*`/`set_*`/`query_*`
//! methods between loop iterations.

use delta_common::config::Validate;
use delta_common::consts::{MAX_AXES, MAX_FANS, MAX_HEATERS};
use delta_common::hal::driver::Hal;
use delta_common::hal::types::{PinId, PinMode, Ticks, TimerChannel};
use delta_common::printer::config::PrinterConfig;
use delta_common::printer::homing::{HomingFailure, HomingPhase};
use delta_common::printer::motion::{CartesianMove, EnqueueResult, MoveSegment, RejectReason};
use delta_common::printer::safety::{EmergencyReason, SafetyStatus};
use heapless::Vec;
use tracing::{debug, error, info, warn};

use crate::clock::{Interval, TimeBase};
use crate::config::validate_runtime;
use crate::error::{CommandError, CoreError};
use crate::event::{Event, EventQueue};
use crate::event_loop::LoopStats;
use crate::homing::{HomingAction, HomingSupervisor};
use crate::motion::delta::{self, DeltaSplit, DeltaTransform};
use crate::motion::planner::Planner;
use crate::motion::stepper::{AxisState, AxisStepper, StepCommand};
use crate::safety::{EmergencyFlag, WatchdogSupervisor};
use crate::thermal::{Fan, Heater, HeaterState};

/// Delay between a homing command and its first step [s].
const HOMING_LEAD: f64 = 0.001;

/// Status LED state.
#[derive(Debug)]
struct Led {
    pin: PinId,
    interval: Interval,
    on: bool,
}

/// Firmware core bound to one HAL.
pub struct Printer<H: Hal> {
    hal: H,
    config: PrinterConfig,
    time: TimeBase,
    emergency: EmergencyFlag,
    shutdown_applied: bool,
    shutdown_reported: bool,
    events: EventQueue,
    seen_overflows: u64,

    // ── Motion ──
    steppers: Vec<AxisStepper, MAX_AXES>,
    homing: Vec<Option<HomingSupervisor>, MAX_AXES>,
    homed: [bool; MAX_AXES],
    planner: Planner,
    delta: Option<DeltaTransform>,
    split: Option<DeltaSplit>,
    cartesian: Option<[f64; 3]>,

    // ── Thermal ──
    heaters: Vec<Heater, MAX_HEATERS>,
    fans: Vec<Fan, MAX_FANS>,

    // ── Housekeeping ──
    watchdog: WatchdogSupervisor,
    inactive_time: Ticks,
    last_motion: Ticks,
    motors_off: bool,
    led: Option<Led>,
    stats: LoopStats,
}

impl<H: Hal> Printer<H> {
    /// Validate the table, claim pins, start the watchdog and the periodic
    /// heater and fan channels.
    pub fn new(mut hal: H, config: PrinterConfig) -> Result<Self, CoreError> {
        config.validate()?;
        validate_runtime(&config)?;
        let time = TimeBase::new(hal.tick_hz());
        let now = hal.now();

        let mut steppers = Vec::new();
        let mut homing = Vec::new();
        for (i, axis) in config.axes.iter().enumerate().take(MAX_AXES) {
            for pin in [axis.step_pin, axis.dir_pin, axis.enable_pin] {
                hal.configure_pin(pin, PinMode::Output)?;
            }
            if let Some(h) = &axis.homing {
                hal.configure_pin(h.endstop_pin, PinMode::Input)?;
            }
            let mut stepper =
                AxisStepper::new(i as u8, axis, config.planner.stepper_buffer_size);
            stepper.init_outputs(&mut hal);
            let _ = steppers.push(stepper);
            let _ = homing.push(HomingSupervisor::new(axis));
        }

        let mut heaters = Vec::new();
        for (i, hc) in config.heaters.iter().enumerate().take(MAX_HEATERS) {
            hal.configure_pin(hc.output_pin, PinMode::Output)?;
            let mut heater = Heater::new(i as u8, hc, &time, now);
            heater.start(&mut hal, now);
            let _ = heaters.push(heater);
        }

        let mut fans = Vec::new();
        for (i, fc) in config.fans.iter().enumerate().take(MAX_FANS) {
            hal.configure_pin(fc.output_pin, PinMode::Output)?;
            let mut fan = Fan::new(i as u8, fc, &time);
            fan.start(&mut hal, now);
            let _ = fans.push(fan);
        }

        let led = match config.machine.led_pin {
            Some(pin) => {
                hal.configure_pin(pin, PinMode::Output)?;
                Some(Led {
                    pin,
                    interval: Interval::new(time.ticks(config.machine.led_blink_interval), now),
                    on: false,
                })
            }
            None => None,
        };

        let watchdog = WatchdogSupervisor::start(&mut hal, time.ticks(config.machine.watchdog_timeout))?;
        let planner = Planner::new(&config);
        let delta = DeltaTransform::new(&config);

        info!(
            machine = %config.shared.machine_name,
            hal = hal.name(),
            axes = steppers.len(),
            heaters = heaters.len(),
            fans = fans.len(),
            delta = delta.is_some(),
            "printer core initialized"
        );

        Ok(Self {
            inactive_time: time.ticks(config.machine.inactive_time),
            events: EventQueue::new(config.planner.event_queue_size),
            seen_overflows: 0,
            hal,
            config,
            time,
            emergency: EmergencyFlag::new(),
            shutdown_applied: false,
            shutdown_reported: false,
            steppers,
            homing,
            homed: [false; MAX_AXES],
            planner,
            delta,
            split: None,
            cartesian: None,
            heaters,
            fans,
            watchdog,
            last_motion: now,
            motors_off: true,
            led,
            stats: LoopStats::default(),
        })
    }

    // ─── Motion commands ────────────────────────────────────────────

    /// Buffer a move in physical axis space.
    pub fn enqueue_segment(&mut self, segment: &MoveSegment) -> EnqueueResult {
        if self.emergency.is_tripped() {
            return EnqueueResult::Rejected(RejectReason::Emergency);
        }
        if let Err(reason) = self.planner.check(segment, &self.homed) {
            warn!(%reason, "segment rejected");
            return EnqueueResult::Rejected(reason);
        }
        if self.homing_active() || self.split.is_some() {
            return EnqueueResult::Full;
        }
        self.submit(segment)
    }

    /// Buffer a Cartesian move through the delta transform.
    ///
    /// The whole move is validated before anything is buffered; the split
    /// is then fed to the planner as space allows.
    pub fn enqueue_cartesian(&mut self, mv: &CartesianMove) -> EnqueueResult {
        if self.emergency.is_tripped() {
            return EnqueueResult::Rejected(RejectReason::Emergency);
        }
        let Some(transform) = self.delta.as_ref() else {
            return EnqueueResult::Rejected(RejectReason::NoTransform);
        };
        if !mv.feedrate.is_finite() || mv.feedrate <= 0.0 {
            return EnqueueResult::Rejected(RejectReason::InvalidFeedrate);
        }
        if let Some(axis) = transform.tower_axes().into_iter().find(|a| !self.homed[*a]) {
            return EnqueueResult::Rejected(RejectReason::NotHomed { axis });
        }
        let Some(from) = self.cartesian else {
            return EnqueueResult::Rejected(RejectReason::NotHomed {
                axis: transform.tower_axes()[0],
            });
        };

        let mut passthrough = MoveSegment::new(mv.feedrate);
        passthrough.target = mv.passthrough;
        for axis in transform.tower_axes() {
            passthrough.target[axis] = None;
        }
        if let Err(reason) = self.planner.check(&passthrough, &self.homed) {
            warn!(%reason, "cartesian move rejected");
            return EnqueueResult::Rejected(reason);
        }
        if self.homing_active() || self.split.is_some() {
            return EnqueueResult::Full;
        }
        if delta::is_passthrough_only(from, mv) {
            return self.submit(&passthrough);
        }

        let mut positions = [0.0; MAX_AXES];
        for (i, p) in positions.iter_mut().enumerate() {
            *p = self.planner.position(i).unwrap_or(0.0);
        }
        match transform.plan(from, positions, mv) {
            Ok(split) => {
                debug!(count = split.count(), target = ?mv.target, "cartesian move split");
                self.cartesian = Some(split.target());
                self.split = Some(split);
                self.pump_split();
                EnqueueResult::Accepted
            }
            Err(reason) => {
                warn!(%reason, "cartesian move rejected");
                EnqueueResult::Rejected(reason)
            }
        }
    }

    /// Commit everything buffered regardless of the threshold.
    pub fn flush(&mut self) -> usize {
        if self.emergency.is_tripped() {
            return 0;
        }
        self.planner
            .commit(&mut self.hal, &mut self.steppers, true)
    }

    fn submit(&mut self, segment: &MoveSegment) -> EnqueueResult {
        let result = self.planner.enqueue(segment, &self.homed);
        if result.is_accepted() {
            self.note_enqueue();
        }
        result
    }

    /// Re-arm the idle flush and try a threshold commit.
    fn note_enqueue(&mut self) {
        self.hal
            .arm_timer_after(TimerChannel::Event, self.planner.force_timeout());
        self.last_motion = self.hal.now();
        self.motors_off = false;
        self.planner
            .commit(&mut self.hal, &mut self.steppers, false);
    }

    /// Move pending sub-segments of a Cartesian split into the planner.
    fn pump_split(&mut self) {
        let Some(transform) = self.delta.as_ref() else {
            self.split = None;
            return;
        };
        let Some(split) = self.split.as_mut() else {
            return;
        };
        let mut accepted = 0usize;
        while let Some(seg) = split.peek(transform) {
            match self.planner.enqueue(&seg, &self.homed) {
                EnqueueResult::Accepted => {
                    split.advance(transform);
                    accepted += 1;
                }
                EnqueueResult::Full => break,
                EnqueueResult::Rejected(reason) => {
                    error!(%reason, "sub-segment of a validated split refused, dropping split");
                    self.split = None;
                    break;
                }
            }
        }
        if self.split.as_ref().is_some_and(DeltaSplit::is_done) {
            self.split = None;
        }
        if accepted > 0 {
            self.note_enqueue();
        }
    }

    // ─── Homing ─────────────────────────────────────────────────────

    /// Start the homing sequence of one axis.
    pub fn start_homing(&mut self, axis: usize) -> Result<(), CommandError> {
        if self.emergency.is_tripped() {
            return Err(CommandError::Emergency);
        }
        let Some(slot) = self.homing.get(axis) else {
            return Err(CommandError::UnknownAxis(axis));
        };
        let Some(supervisor) = slot.as_ref() else {
            return Err(CommandError::HomingNotConfigured(axis));
        };
        if supervisor.is_active()
            || !self.planner.is_empty()
            || self.split.is_some()
            || !self.steppers[axis].is_idle()
        {
            return Err(CommandError::Busy);
        }

        self.homed[axis] = false;
        if self.delta.as_ref().is_some_and(|d| d.tower_axes().contains(&axis)) {
            self.cartesian = None;
        }
        let action = match self.homing[axis].as_mut() {
            Some(sup) => sup.start(),
            None => HomingAction::None,
        };
        info!(axis = %self.config.axes[axis].name, "homing started");
        self.apply_homing_action(axis, action);
        Ok(())
    }

    /// Home every axis that has an end-stop, concurrently.
    pub fn start_homing_all(&mut self) -> Result<(), CommandError> {
        let axes: Vec<usize, MAX_AXES> = (0..self.homing.len())
            .filter(|i| self.homing[*i].is_some())
            .collect();
        for axis in axes {
            self.start_homing(axis)?;
        }
        Ok(())
    }

    pub fn homing_phase(&self, axis: usize) -> Option<HomingPhase> {
        self.homing.get(axis)?.as_ref().map(HomingSupervisor::phase)
    }

    fn homing_active(&self) -> bool {
        self.homing.iter().flatten().any(HomingSupervisor::is_active)
    }

    fn apply_homing_action(&mut self, axis: usize, action: HomingAction) {
        let phase = self.homing_phase(axis);
        match action {
            HomingAction::Move(m) => {
                let start = self.hal.now() as f64 + self.time.ticks_f(HOMING_LEAD);
                let rate = m.rate / self.time.tick_hz();
                let mut cmd = StepCommand::constant(m.positive, m.steps, start, rate);
                if m.endstop_check {
                    cmd = cmd.with_endstop_check();
                }
                debug!(axis, ?phase, steps = m.steps, "homing move");
                if self.steppers[axis].push(&mut self.hal, cmd).is_err() {
                    warn!(axis, "homing move refused by stepper buffer");
                }
            }
            HomingAction::Done { position } => {
                self.homed[axis] = true;
                self.steppers[axis].set_position_units(position);
                self.planner.set_position(axis, position);
                info!(axis = %self.config.axes[axis].name, position, "axis homed");
                self.update_cartesian_from_towers();
            }
            HomingAction::Failed(reason) => {
                self.homed[axis] = false;
                warn!(axis = %self.config.axes[axis].name, %reason, "homing failed");
            }
            HomingAction::None => {}
        }
    }

    /// A dropped end-stop or idle event would leave homing waiting forever,
    /// so any loss while homing fails the active sequences.
    fn check_overflows(&mut self) {
        let overflows = self.events.overflows();
        if overflows == self.seen_overflows {
            return;
        }
        warn!(
            dropped = overflows - self.seen_overflows,
            total = overflows,
            "event queue overflowed"
        );
        self.seen_overflows = overflows;
        for axis in 0..self.homing.len() {
            let action = match self.homing[axis].as_mut() {
                Some(sup) if sup.is_active() => sup.abort(HomingFailure::EventsLost),
                _ => continue,
            };
            self.steppers[axis].halt(&mut self.hal);
            self.apply_homing_action(axis, action);
        }
    }

    fn update_cartesian_from_towers(&mut self) {
        let Some(transform) = self.delta.as_ref() else {
            return;
        };
        let towers = transform.tower_axes();
        if !towers.iter().all(|a| self.homed[*a]) {
            return;
        }
        let heights = towers.map(|a| self.steppers[a].position_units());
        self.cartesian = transform.forward(heights);
        if let Some(p) = self.cartesian {
            info!(x = p[0], y = p[1], z = p[2], "effector position established");
        }
    }

    // ─── Thermal commands ───────────────────────────────────────────

    pub fn set_heater_target(&mut self, heater: usize, target: f64) -> Result<(), CommandError> {
        if self.emergency.is_tripped() {
            return Err(CommandError::Emergency);
        }
        let now = self.hal.now();
        let h = self
            .heaters
            .get_mut(heater)
            .ok_or(CommandError::UnknownHeater(heater))?;
        h.set_target(target, now)?;
        info!(heater = h.name(), target, "heater target set");
        Ok(())
    }

    /// `true` once the heater has held its target for the observer's
    /// minimum time.
    pub fn query_heater_stable(&self, heater: usize) -> Result<bool, CommandError> {
        self.heaters
            .get(heater)
            .map(Heater::is_stable)
            .ok_or(CommandError::UnknownHeater(heater))
    }

    /// Set a fan speed; returns the resulting duty.
    pub fn set_fan_speed(&mut self, fan: usize, value: f64) -> Result<f64, CommandError> {
        if self.emergency.is_tripped() {
            return Err(CommandError::Emergency);
        }
        let f = self
            .fans
            .get_mut(fan)
            .ok_or(CommandError::UnknownFan(fan))?;
        Ok(f.set_speed(value))
    }

    // ─── Safety ─────────────────────────────────────────────────────

    pub fn query_safety_status(&self) -> SafetyStatus {
        self.emergency.status()
    }

    /// Trip the emergency flag from the command side.
    pub fn emergency_stop(&mut self) {
        self.emergency.trip(EmergencyReason::External);
        self.apply_shutdown();
        self.report_shutdown();
    }

    /// Force every output safe and drop all pending work. Idempotent.
    fn apply_shutdown(&mut self) {
        if self.shutdown_applied {
            return;
        }
        self.shutdown_applied = true;
        for heater in self.heaters.iter_mut() {
            heater.shutdown(&mut self.hal);
        }
        for fan in self.fans.iter_mut() {
            fan.shutdown(&mut self.hal);
        }
        for stepper in self.steppers.iter_mut() {
            stepper.halt(&mut self.hal);
            stepper.disable(&mut self.hal);
        }
        for sup in self.homing.iter_mut().flatten() {
            sup.abort(HomingFailure::Aborted);
        }
        self.hal.cancel_timer(TimerChannel::Event);
        self.planner.clear();
        self.split = None;
        self.events.clear();
    }

    fn report_shutdown(&mut self) {
        if self.shutdown_reported {
            return;
        }
        self.shutdown_reported = true;
        if let SafetyStatus::Emergency(reason) = self.emergency.status() {
            error!(%reason, "emergency shutdown: all outputs off");
        }
    }

    // ─── Interrupt dispatch ─────────────────────────────────────────

    /// Fire every due timer channel in deadline order.
    pub fn service_interrupts(&mut self) -> usize {
        let mut fired = 0;
        while let Some((channel, at)) = self.hal.poll_timer() {
            fired += 1;
            self.dispatch(channel, at);
        }
        fired
    }

    fn dispatch(&mut self, channel: TimerChannel, at: Ticks) {
        if self.emergency.is_tripped() {
            self.apply_shutdown();
            return;
        }
        match channel {
            TimerChannel::Axis(i) => {
                if let Some(s) = self.steppers.get_mut(usize::from(i)) {
                    s.on_timer(&mut self.hal, &mut self.events);
                }
            }
            TimerChannel::Heater(i) => {
                if let Some(h) = self.heaters.get_mut(usize::from(i)) {
                    h.on_timer(&mut self.hal, at, &self.emergency, &mut self.events);
                }
                if self.emergency.is_tripped() {
                    self.apply_shutdown();
                }
            }
            TimerChannel::Fan(i) => {
                if let Some(f) = self.fans.get_mut(usize::from(i)) {
                    f.on_timer(&mut self.hal, at);
                }
            }
            TimerChannel::Event => {
                self.events.post(Event::FlushTimeout);
            }
        }
    }

    // ─── Loop ───────────────────────────────────────────────────────

    /// One cooperative loop iteration. Never blocks.
    pub fn run_once(&mut self) {
        let fired = self.service_interrupts();
        let now = self.hal.now();

        if self.emergency.is_tripped() {
            self.apply_shutdown();
            self.report_shutdown();
            self.watchdog.kick(&mut self.hal);
            self.stats.record(fired, 0);
            return;
        }

        let mut handled = 0;
        while let Some(event) = self.events.next() {
            handled += 1;
            self.handle(event);
        }
        self.check_overflows();

        if self.split.is_some() {
            self.pump_split();
        }
        if !self.planner.is_empty() {
            self.planner
                .commit(&mut self.hal, &mut self.steppers, false);
        }
        for heater in self.heaters.iter_mut() {
            heater.poll_observer(now);
        }
        self.check_inactivity(now);
        self.blink(now);

        self.watchdog.kick(&mut self.hal);
        self.stats.record(fired, handled);
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::AxisIdle(i) => {
                let axis = usize::from(i);
                if self.homing_phase(axis).is_some_and(HomingPhase::is_active) {
                    let action = match self.homing[axis].as_mut() {
                        Some(sup) => sup.on_idle(),
                        None => HomingAction::None,
                    };
                    self.apply_homing_action(axis, action);
                }
            }
            Event::EndstopHit(i) => {
                let axis = usize::from(i);
                let action = match self.homing.get_mut(axis).and_then(Option::as_mut) {
                    Some(sup) => sup.on_endstop(),
                    None => HomingAction::None,
                };
                self.apply_homing_action(axis, action);
            }
            Event::HeaterSample(i) => {
                if let Some(h) = self.heaters.get_mut(usize::from(i)) {
                    h.on_sample();
                }
            }
            Event::FlushTimeout => {
                let n = self
                    .planner
                    .commit(&mut self.hal, &mut self.steppers, true);
                if n > 0 {
                    debug!(committed = n, "idle flush");
                }
            }
        }
    }

    /// Drop enables and forget homing after a quiet period.
    fn check_inactivity(&mut self, now: Ticks) {
        let busy = !self.is_idle();
        if busy {
            self.last_motion = now;
            self.motors_off = false;
            return;
        }
        if self.motors_off || now.saturating_sub(self.last_motion) < self.inactive_time {
            return;
        }
        for stepper in self.steppers.iter_mut() {
            stepper.disable(&mut self.hal);
        }
        for (axis, sup) in self.homing.iter().enumerate() {
            if sup.is_some() {
                self.homed[axis] = false;
            }
        }
        self.cartesian = None;
        self.motors_off = true;
        info!("inactive: steppers disabled, axes need homing");
    }

    fn blink(&mut self, now: Ticks) {
        if let Some(led) = self.led.as_mut() {
            if led.interval.due(now) {
                led.on = !led.on;
                self.hal.write_pin(led.pin, led.on);
            }
        }
    }

    // ─── Inspection ─────────────────────────────────────────────────

    /// No buffered, pending or executing motion.
    pub fn is_idle(&self) -> bool {
        self.planner.is_empty()
            && self.split.is_none()
            && !self.homing_active()
            && self.steppers.iter().all(AxisStepper::is_idle)
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn time(&self) -> TimeBase {
        self.time
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn axis_state(&self, axis: usize) -> Option<AxisState> {
        self.steppers.get(axis).map(|s| s.state(self.homed[axis]))
    }

    pub fn is_homed(&self, axis: usize) -> bool {
        self.homed.get(axis).copied().unwrap_or(false)
    }

    pub fn cartesian_position(&self) -> Option<[f64; 3]> {
        self.cartesian
    }

    pub fn pending_split(&self) -> Option<u32> {
        self.split.as_ref().map(DeltaSplit::remaining)
    }

    pub fn heater_state(&self, heater: usize) -> Option<HeaterState> {
        let safety = self.emergency.status();
        self.heaters.get(heater).map(|h| h.state(safety))
    }

    pub fn fan_duty(&self, fan: usize) -> Option<f64> {
        self.fans.get(fan).map(Fan::duty)
    }

    pub fn watchdog(&self) -> &WatchdogSupervisor {
        &self.watchdog
    }

    pub fn event_overflows(&self) -> u64 {
        self.events.overflows()
    }

    pub fn loop_stats(&self) -> &LoopStats {
        &self.stats
    }
}
