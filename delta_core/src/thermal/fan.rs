//! Fan outputs: fixed-period PWM with a scaled speed command.

use delta_common::hal::driver::Hal;
use delta_common::hal::types::{Ticks, TimerChannel};
use delta_common::printer::config::FanConfig;

use super::pwm::SoftPwm;
use crate::clock::TimeBase;

#[derive(Debug)]
pub struct Fan {
    name: String,
    pwm: SoftPwm,
    speed_multiply: f64,
}

impl Fan {
    pub fn new(index: u8, config: &FanConfig, time: &TimeBase) -> Self {
        Self {
            name: config.name.clone(),
            pwm: SoftPwm::new(
                TimerChannel::Fan(index),
                config.output_pin,
                config.output_invert,
                time.ticks(config.pulse_interval),
            ),
            speed_multiply: config.speed_multiply,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start<H: Hal>(&mut self, hal: &mut H, now: Ticks) {
        self.pwm.start(hal, now);
    }

    /// Scale `value` by the configured multiplier; returns the duty applied.
    pub fn set_speed(&mut self, value: f64) -> f64 {
        self.pwm.set_duty(value * self.speed_multiply);
        self.pwm.duty()
    }

    pub fn duty(&self) -> f64 {
        self.pwm.duty()
    }

    pub fn on_timer<H: Hal>(&mut self, hal: &mut H, at: Ticks) {
        self.pwm.on_timer(hal, at);
    }

    pub fn shutdown<H: Hal>(&mut self, hal: &mut H) {
        self.pwm.force_off(hal);
    }
}
