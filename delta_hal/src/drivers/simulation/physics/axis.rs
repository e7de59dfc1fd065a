//! Stepper and end-stop physics.
//!
//! A carriage moves one microstep per rising edge of its step pin, in the
//! direction given by the dir pin, while the driver is enabled. The end-stop
//! switch closes once the carriage reaches the end of travel on the homing
//! side.

use delta_common::printer::config::AxisConfig;
use delta_common::printer::homing::HomeDirection;
use tracing::trace;

/// Simulated stepper-driven carriage.
#[derive(Debug, Clone)]
pub struct SimAxis {
    name: String,
    steps_per_unit: f64,
    invert_dir: bool,
    invert_enable: bool,
    /// Absolute carriage position [steps].
    position: i64,
    /// Switch position and side, if the axis has an end-stop.
    endstop: Option<(i64, HomeDirection)>,
    endstop_invert: bool,
    dir_level: bool,
    enable_level: bool,
    steps: u64,
    lost_steps: u64,
}

impl SimAxis {
    pub fn new(config: &AxisConfig) -> Self {
        let spu = config.steps_per_unit;
        let endstop = config.homing.as_ref().map(|h| {
            let at = match h.direction {
                HomeDirection::Positive => config.max,
                HomeDirection::Negative => config.min,
            };
            ((at * spu).round() as i64, h.direction)
        });
        let start = 0.5 * (config.min.max(-1000.0) + config.max.min(1000.0));
        Self {
            name: config.name.clone(),
            steps_per_unit: spu,
            invert_dir: config.invert_dir,
            invert_enable: config.invert_enable,
            position: (start * spu).round() as i64,
            endstop,
            endstop_invert: config.homing.as_ref().is_some_and(|h| h.endstop_invert),
            dir_level: false,
            enable_level: config.invert_enable,
            steps: 0,
            lost_steps: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_dir_level(&mut self, high: bool) {
        self.dir_level = high;
    }

    pub fn set_enable_level(&mut self, high: bool) {
        self.enable_level = high;
    }

    pub fn is_enabled(&self) -> bool {
        self.enable_level != self.invert_enable
    }

    /// Apply one step pulse.
    pub fn on_step(&mut self) {
        if !self.is_enabled() {
            self.lost_steps += 1;
            return;
        }
        let positive = self.dir_level != self.invert_dir;
        self.position += if positive { 1 } else { -1 };
        self.steps += 1;
        trace!(axis = %self.name, position = self.position, "step");
    }

    /// Electrical level of the end-stop input.
    pub fn endstop_level(&self) -> bool {
        let closed = match self.endstop {
            Some((at, HomeDirection::Positive)) => self.position >= at,
            Some((at, HomeDirection::Negative)) => self.position <= at,
            None => false,
        };
        closed != self.endstop_invert
    }

    pub fn position_steps(&self) -> i64 {
        self.position
    }

    pub fn position(&self) -> f64 {
        self.position as f64 / self.steps_per_unit
    }

    pub fn set_position(&mut self, units: f64) {
        self.position = (units * self.steps_per_unit).round() as i64;
    }

    /// Move the end-stop switch, e.g. to simulate a missing switch.
    pub fn set_endstop_position(&mut self, units: Option<f64>) {
        let spu = self.steps_per_unit;
        self.endstop = match (self.endstop, units) {
            (Some((_, dir)), Some(u)) => Some(((u * spu).round() as i64, dir)),
            (_, None) => None,
            (None, Some(_)) => None,
        };
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    pub fn lost_steps(&self) -> u64 {
        self.lost_steps
    }
}
