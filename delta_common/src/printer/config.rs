//! Printer parameter table.
//!
//! One TOML document describes the whole machine: planner sizing, axes,
//! the optional delta geometry, heaters and fans. Numeric defaults follow the
//! reference Teensy 3 delta build. The table is validated once at startup
//! and is immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::homing::HomeDirection;
use crate::config::{ConfigError, ConfigLoader, SharedConfig, Validate};
use crate::consts::{
    DEFAULT_TICK_HZ, DELTA_TOWERS, EVENT_QUEUE_SLOTS, MAX_AXES, MAX_FANS, MAX_HEATERS,
    MAX_LOOKAHEAD, MAX_STEPPER_BUFFER,
};
use crate::hal::types::PinId;

/// Reference table for the Teensy 3 delta (towers A/B/C, extruder E,
/// extruder heater, one fan).
const REFERENCE_TABLE: &str = include_str!("../../config/printer.toml");

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete machine description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub machine: MachineConfig,
    pub axes: Vec<AxisConfig>,
    #[serde(default)]
    pub delta: Option<DeltaConfig>,
    #[serde(default)]
    pub heaters: Vec<HeaterConfig>,
    #[serde(default)]
    pub fans: Vec<FanConfig>,
}

impl PrinterConfig {
    /// Parse and validate the built-in reference table.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::load_str(REFERENCE_TABLE)
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.name == name)
    }

    pub fn heater_index(&self, name: &str) -> Option<usize> {
        self.heaters.iter().position(|h| h.name == name)
    }

    pub fn fan_index(&self, name: &str) -> Option<usize> {
        self.fans.iter().position(|f| f.name == name)
    }

    /// Axis indices of the delta towers, in tower order.
    pub fn tower_axes(&self) -> Option<[usize; DELTA_TOWERS]> {
        let delta = self.delta.as_ref()?;
        let mut out = [0usize; DELTA_TOWERS];
        for (slot, name) in out.iter_mut().zip(delta.towers.iter()) {
            *slot = self.axis_index(name)?;
        }
        Some(out)
    }

    fn check_pins(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let mut claim = |pin: PinId, what: String| {
            if seen.insert(pin) {
                Ok(())
            } else {
                Err(format!("{pin} assigned twice (again by {what})"))
            }
        };
        if let Some(led) = self.machine.led_pin {
            claim(led, "status led".into())?;
        }
        for a in &self.axes {
            claim(a.step_pin, format!("axis {} step", a.name))?;
            claim(a.dir_pin, format!("axis {} dir", a.name))?;
            claim(a.enable_pin, format!("axis {} enable", a.name))?;
            if let Some(h) = &a.homing {
                claim(h.endstop_pin, format!("axis {} end-stop", a.name))?;
            }
        }
        for h in &self.heaters {
            claim(h.adc_pin, format!("heater {} adc", h.name))?;
            claim(h.output_pin, format!("heater {} output", h.name))?;
        }
        for f in &self.fans {
            claim(f.output_pin, format!("fan {} output", f.name))?;
        }
        Ok(())
    }
}

fn unique_names<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<(), String> {
    let mut seen = HashSet::new();
    for n in names {
        if n.is_empty() {
            return Err(format!("{kind} name cannot be empty"));
        }
        if !seen.insert(n) {
            return Err(format!("duplicate {kind} name '{n}'"));
        }
    }
    Ok(())
}

impl Validate for PrinterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        let check = || -> Result<(), String> {
            self.clock.validate()?;
            self.planner.validate()?;
            self.machine.validate()?;
            if self.axes.is_empty() || self.axes.len() > MAX_AXES {
                return Err(format!(
                    "axis count {} out of range [1, {MAX_AXES}]",
                    self.axes.len()
                ));
            }
            if self.heaters.len() > MAX_HEATERS {
                return Err(format!("more than {MAX_HEATERS} heaters"));
            }
            if self.fans.len() > MAX_FANS {
                return Err(format!("more than {MAX_FANS} fans"));
            }
            unique_names("axis", self.axes.iter().map(|a| a.name.as_str()))?;
            unique_names("heater", self.heaters.iter().map(|h| h.name.as_str()))?;
            unique_names("fan", self.fans.iter().map(|f| f.name.as_str()))?;
            for a in &self.axes {
                a.validate().map_err(|e| format!("axis {}: {e}", a.name))?;
            }
            for h in &self.heaters {
                h.validate().map_err(|e| format!("heater {}: {e}", h.name))?;
            }
            for f in &self.fans {
                f.validate().map_err(|e| format!("fan {}: {e}", f.name))?;
            }
            if let Some(delta) = &self.delta {
                delta.validate()?;
                if self.tower_axes().is_none() {
                    return Err(format!(
                        "delta tower names {:?} do not all resolve to axes",
                        delta.towers
                    ));
                }
            }
            self.check_pins()
        };
        check().map_err(ConfigError::ValidationError)
    }
}

// ─── Clock / Planner / Machine ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// HAL clock rate [Hz] (default: 1 MHz).
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

fn default_tick_hz() -> u32 {
    DEFAULT_TICK_HZ
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_hz < 1000 {
            return Err(format!("tick_hz {} below 1000", self.tick_hz));
        }
        Ok(())
    }
}

/// Lookahead window and stepper buffer sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Window capacity N (default: 28).
    #[serde(default = "default_lookahead")]
    pub lookahead_capacity: usize,
    /// Buffered count that triggers a commit (default: 10).
    #[serde(default = "default_commit_count")]
    pub commit_count: usize,
    /// Idle time after which the window is flushed [s] (default: 0.1).
    #[serde(default = "default_force_timeout")]
    pub force_timeout: f64,
    /// Factor applied to requested feed rates (default: 1/60, per-minute input).
    #[serde(default = "default_speed_limit_multiply")]
    pub speed_limit_multiply: f64,
    /// Per-axis step rate ceiling [steps/s] (default: 163200).
    #[serde(default = "default_max_step_rate")]
    pub max_step_rate: f64,
    /// Committed step commands buffered per axis (default: 32).
    #[serde(default = "default_stepper_buffer")]
    pub stepper_buffer_size: usize,
    /// Interrupt → loop event slots (default: 32).
    #[serde(default = "default_event_queue")]
    pub event_queue_size: usize,
}

fn default_lookahead() -> usize {
    28
}
fn default_commit_count() -> usize {
    10
}
fn default_force_timeout() -> f64 {
    0.1
}
fn default_speed_limit_multiply() -> f64 {
    1.0 / 60.0
}
fn default_max_step_rate() -> f64 {
    163_200.0
}
fn default_stepper_buffer() -> usize {
    32
}
fn default_event_queue() -> usize {
    32
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lookahead_capacity: default_lookahead(),
            commit_count: default_commit_count(),
            force_timeout: default_force_timeout(),
            speed_limit_multiply: default_speed_limit_multiply(),
            max_step_rate: default_max_step_rate(),
            stepper_buffer_size: default_stepper_buffer(),
            event_queue_size: default_event_queue(),
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.lookahead_capacity < 2 || self.lookahead_capacity > MAX_LOOKAHEAD {
            return Err(format!(
                "lookahead_capacity {} out of range [2, {MAX_LOOKAHEAD}]",
                self.lookahead_capacity
            ));
        }
        if self.commit_count == 0 || self.commit_count > self.lookahead_capacity {
            return Err(format!(
                "commit_count {} out of range [1, {}]",
                self.commit_count, self.lookahead_capacity
            ));
        }
        if self.stepper_buffer_size < 2 || self.stepper_buffer_size > MAX_STEPPER_BUFFER {
            return Err(format!(
                "stepper_buffer_size {} out of range [2, {MAX_STEPPER_BUFFER}]",
                self.stepper_buffer_size
            ));
        }
        if self.event_queue_size == 0 || self.event_queue_size >= EVENT_QUEUE_SLOTS {
            return Err(format!(
                "event_queue_size {} out of range [1, {}]",
                self.event_queue_size,
                EVENT_QUEUE_SLOTS - 1
            ));
        }
        positive("force_timeout", self.force_timeout)?;
        positive("speed_limit_multiply", self.speed_limit_multiply)?;
        positive("max_step_rate", self.max_step_rate)
    }
}

/// Machine-wide housekeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Idle time before steppers are disabled and unhomed [s] (default: 60).
    #[serde(default = "default_inactive_time")]
    pub inactive_time: f64,
    /// Status LED toggled by the event loop.
    #[serde(default)]
    pub led_pin: Option<PinId>,
    /// LED toggle interval [s] (default: 0.5).
    #[serde(default = "default_led_blink")]
    pub led_blink_interval: f64,
    /// Hardware watchdog timeout [s] (default: 2.0).
    #[serde(default = "default_watchdog_timeout")]
    pub watchdog_timeout: f64,
}

fn default_inactive_time() -> f64 {
    60.0
}
fn default_led_blink() -> f64 {
    0.5
}
fn default_watchdog_timeout() -> f64 {
    2.0
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            inactive_time: default_inactive_time(),
            led_pin: None,
            led_blink_interval: default_led_blink(),
            watchdog_timeout: default_watchdog_timeout(),
        }
    }
}

impl MachineConfig {
    pub fn validate(&self) -> Result<(), String> {
        positive("inactive_time", self.inactive_time)?;
        positive("led_blink_interval", self.led_blink_interval)?;
        positive("watchdog_timeout", self.watchdog_timeout)
    }
}

// ─── Axes ───────────────────────────────────────────────────────────

/// One stepper axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisConfig {
    pub name: String,
    pub step_pin: PinId,
    pub dir_pin: PinId,
    pub enable_pin: PinId,
    /// Drive the dir pin low for positive motion.
    #[serde(default)]
    pub invert_dir: bool,
    /// Enable input is active-low (default: true).
    #[serde(default = "default_true")]
    pub invert_enable: bool,
    pub steps_per_unit: f64,
    pub min: f64,
    pub max: f64,
    /// [units/s]
    pub max_speed: f64,
    /// [units/s²]
    pub max_accel: f64,
    /// Weight in the path-length metric (default: 1.0).
    #[serde(default = "default_one")]
    pub distance_factor: f64,
    /// Cornering distance [units] (default: 40).
    #[serde(default = "default_cornering")]
    pub cornering_distance: f64,
    /// Absent for axes that need no homing (extruders).
    #[serde(default)]
    pub homing: Option<AxisHomingConfig>,
}

fn default_true() -> bool {
    true
}
fn default_one() -> f64 {
    1.0
}
fn default_cornering() -> f64 {
    40.0
}

impl AxisConfig {
    pub fn validate(&self) -> Result<(), String> {
        positive("steps_per_unit", self.steps_per_unit)?;
        positive("max_speed", self.max_speed)?;
        positive("max_accel", self.max_accel)?;
        positive("distance_factor", self.distance_factor)?;
        positive("cornering_distance", self.cornering_distance)?;
        if !(self.min.is_finite() && self.max.is_finite()) || self.min >= self.max {
            return Err(format!("min {} must be below max {}", self.min, self.max));
        }
        if let Some(h) = &self.homing {
            h.validate()?;
        }
        Ok(())
    }

    /// Position assigned after a successful home.
    pub fn home_position(&self) -> Option<f64> {
        self.homing.as_ref().map(|h| match h.direction {
            HomeDirection::Positive => self.max,
            HomeDirection::Negative => self.min,
        })
    }
}

/// End-stop homing parameters for one axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisHomingConfig {
    pub endstop_pin: PinId,
    /// End-stop reads low when triggered.
    #[serde(default)]
    pub endstop_invert: bool,
    pub direction: HomeDirection,
    pub fast_max_dist: f64,
    pub retract_dist: f64,
    pub slow_max_dist: f64,
    pub fast_speed: f64,
    pub retract_speed: f64,
    pub slow_speed: f64,
}

impl AxisHomingConfig {
    pub fn validate(&self) -> Result<(), String> {
        positive("homing.fast_max_dist", self.fast_max_dist)?;
        positive("homing.retract_dist", self.retract_dist)?;
        positive("homing.slow_max_dist", self.slow_max_dist)?;
        positive("homing.fast_speed", self.fast_speed)?;
        positive("homing.retract_speed", self.retract_speed)?;
        positive("homing.slow_speed", self.slow_speed)?;
        if self.slow_max_dist <= self.retract_dist {
            return Err("homing.slow_max_dist must exceed retract_dist".into());
        }
        Ok(())
    }
}

// ─── Delta ──────────────────────────────────────────────────────────

/// Linear-delta geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaConfig {
    pub diagonal_rod: f64,
    pub smooth_rod_offset: f64,
    pub effector_offset: f64,
    pub carriage_offset: f64,
    /// Sub-segment rate bound (default: 100 /s).
    #[serde(default = "default_segments_per_second")]
    pub segments_per_second: f64,
    /// (default: 0.1)
    #[serde(default = "default_min_split")]
    pub min_split_length: f64,
    /// (default: 4.0)
    #[serde(default = "default_max_split")]
    pub max_split_length: f64,
    /// Axis names of towers 1, 2, 3 (default: A, B, C).
    #[serde(default = "default_towers")]
    pub towers: [String; DELTA_TOWERS],
}

fn default_segments_per_second() -> f64 {
    100.0
}
fn default_min_split() -> f64 {
    0.1
}
fn default_max_split() -> f64 {
    4.0
}
fn default_towers() -> [String; DELTA_TOWERS] {
    ["A".into(), "B".into(), "C".into()]
}

impl DeltaConfig {
    /// Horizontal distance from the bed center to each carriage pivot,
    /// effector offset included.
    pub fn tower_radius(&self) -> f64 {
        self.smooth_rod_offset - self.effector_offset - self.carriage_offset
    }

    pub fn validate(&self) -> Result<(), String> {
        positive("delta.diagonal_rod", self.diagonal_rod)?;
        positive("delta.tower_radius", self.tower_radius())?;
        positive("delta.segments_per_second", self.segments_per_second)?;
        positive("delta.min_split_length", self.min_split_length)?;
        if self.max_split_length < self.min_split_length {
            return Err("delta.max_split_length below min_split_length".into());
        }
        if self.diagonal_rod <= self.tower_radius() {
            return Err("delta.diagonal_rod must exceed tower radius".into());
        }
        Ok(())
    }
}

// ─── Heaters ────────────────────────────────────────────────────────

/// Control law selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Pid,
    BangBang,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermistorConfig {
    /// Divider resistor [Ω].
    pub resistor_r: f64,
    /// Thermistor resistance at 25 °C [Ω].
    pub r0: f64,
    pub beta: f64,
    pub min_temp: f64,
    pub max_temp: f64,
}

impl ThermistorConfig {
    pub fn validate(&self) -> Result<(), String> {
        positive("thermistor.resistor_r", self.resistor_r)?;
        positive("thermistor.r0", self.r0)?;
        positive("thermistor.beta", self.beta)?;
        if self.min_temp >= self.max_temp {
            return Err("thermistor.min_temp must be below max_temp".into());
        }
        Ok(())
    }
}

/// PID constants. Output is a duty in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PidParams {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub i_state_min: f64,
    pub i_state_max: f64,
    /// Smoothing of the derivative estimate, in [0, 1).
    pub d_history: f64,
}

impl PidParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.p < 0.0 || self.i < 0.0 || self.d < 0.0 {
            return Err("pid gains must be non-negative".into());
        }
        if self.i_state_min > self.i_state_max {
            return Err(format!(
                "pid i_state_min {} above i_state_max {}",
                self.i_state_min, self.i_state_max
            ));
        }
        if !(0.0..1.0).contains(&self.d_history) {
            return Err(format!("pid d_history {} outside [0, 1)", self.d_history));
        }
        Ok(())
    }
}

/// Stability observer behind `query_heater_stable`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Sampling interval [s] (default: 0.5).
    #[serde(default = "default_observer_interval")]
    pub interval: f64,
    /// Band around the target [°C] (default: 3).
    #[serde(default = "default_observer_tolerance")]
    pub tolerance: f64,
    /// Time the reading must stay in band [s] (default: 3).
    #[serde(default = "default_observer_min_time")]
    pub min_time: f64,
}

fn default_observer_interval() -> f64 {
    0.5
}
fn default_observer_tolerance() -> f64 {
    3.0
}
fn default_observer_min_time() -> f64 {
    3.0
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            interval: default_observer_interval(),
            tolerance: default_observer_tolerance(),
            min_time: default_observer_min_time(),
        }
    }
}

/// One heater with thermistor feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaterConfig {
    pub name: String,
    pub adc_pin: PinId,
    pub output_pin: PinId,
    #[serde(default)]
    pub output_invert: bool,
    pub thermistor: ThermistorConfig,
    pub min_safe_temp: f64,
    pub max_safe_temp: f64,
    /// Soft-PWM period [s].
    pub pulse_interval: f64,
    /// Control law sampling period [s].
    pub control_interval: f64,
    #[serde(default)]
    pub control: ControlMode,
    pub pid: PidParams,
    /// Bang-bang switching band [°C] (default: 2).
    #[serde(default = "default_hysteresis")]
    pub hysteresis: f64,
    #[serde(default)]
    pub observer: ObserverConfig,
}

fn default_hysteresis() -> f64 {
    2.0
}

impl HeaterConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.thermistor.validate()?;
        self.pid.validate()?;
        if self.min_safe_temp >= self.max_safe_temp {
            return Err(format!(
                "min_safe_temp {} must be below max_safe_temp {}",
                self.min_safe_temp, self.max_safe_temp
            ));
        }
        positive("pulse_interval", self.pulse_interval)?;
        positive("control_interval", self.control_interval)?;
        positive("hysteresis", self.hysteresis)?;
        positive("observer.interval", self.observer.interval)?;
        positive("observer.tolerance", self.observer.tolerance)?;
        if self.observer.min_time < 0.0 {
            return Err("observer.min_time must be non-negative".into());
        }
        Ok(())
    }
}

// ─── Fans ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanConfig {
    pub name: String,
    pub output_pin: PinId,
    #[serde(default)]
    pub output_invert: bool,
    /// Soft-PWM period [s] (default: 0.04).
    #[serde(default = "default_fan_pulse")]
    pub pulse_interval: f64,
    /// Scale from command value to duty (default: 1/255).
    #[serde(default = "default_fan_multiply")]
    pub speed_multiply: f64,
}

fn default_fan_pulse() -> f64 {
    0.04
}
fn default_fan_multiply() -> f64 {
    1.0 / 255.0
}

impl FanConfig {
    pub fn validate(&self) -> Result<(), String> {
        positive("pulse_interval", self.pulse_interval)?;
        positive("speed_multiply", self.speed_multiply)
    }
}

fn positive(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{field} must be positive, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_reference_delta() {
        let cfg = PrinterConfig::builtin().unwrap();
        assert_eq!(cfg.planner.lookahead_capacity, 28);
        assert_eq!(cfg.planner.commit_count, 10);
        assert_eq!(cfg.axes.len(), 4);
        assert_eq!(cfg.tower_axes(), Some([0, 1, 2]));
        let e = &cfg.axes[cfg.axis_index("E").unwrap()];
        assert!(e.homing.is_none());
        assert_eq!(e.steps_per_unit, 928.0);
        let a = &cfg.axes[0];
        assert_eq!(a.home_position(), Some(360.0));
        let delta = cfg.delta.as_ref().unwrap();
        assert!((delta.tower_radius() - 105.6).abs() < 1e-9);
        assert_eq!(cfg.heaters[0].max_safe_temp, 280.0);
        assert_eq!(cfg.heaters[0].control, ControlMode::Pid);
    }

    #[test]
    fn rejects_commit_count_above_capacity() {
        let mut cfg = PrinterConfig::builtin().unwrap();
        cfg.planner.commit_count = 40;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("commit_count")
        ));
    }

    #[test]
    fn rejects_duplicate_pins() {
        let mut cfg = PrinterConfig::builtin().unwrap();
        cfg.fans[0].output_pin = cfg.axes[0].step_pin;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unknown_tower() {
        let mut cfg = PrinterConfig::builtin().unwrap();
        if let Some(delta) = cfg.delta.as_mut() {
            delta.towers[2] = "Z".into();
        }
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pid_clamp_and_bad_history() {
        let mut cfg = PrinterConfig::builtin().unwrap();
        cfg.heaters[0].pid.i_state_min = 1.0;
        cfg.heaters[0].pid.i_state_max = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = PrinterConfig::builtin().unwrap();
        cfg.heaters[0].pid.d_history = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_axis_range() {
        let mut cfg = PrinterConfig::builtin().unwrap();
        cfg.axes[1].min = 10.0;
        cfg.axes[1].max = 10.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn minimal_table_uses_defaults() {
        let toml = r#"
[shared]
machine_name = "bench"

[[axes]]
name = "X"
step_pin = 1
dir_pin = 2
enable_pin = 3
steps_per_unit = 80.0
min = 0.0
max = 200.0
max_speed = 100.0
max_accel = 1000.0
"#;
        let cfg = PrinterConfig::load_str(toml).unwrap();
        assert_eq!(cfg.clock.tick_hz, DEFAULT_TICK_HZ);
        assert_eq!(cfg.planner.stepper_buffer_size, 32);
        assert_eq!(cfg.machine.watchdog_timeout, 2.0);
        assert_eq!(cfg.axes[0].cornering_distance, 40.0);
        assert!(cfg.delta.is_none());
        assert!(cfg.tower_axes().is_none());
    }
}
