//! Fixed-period software PWM on a timer channel.
//!
//! Each period begins with the output active (unless the duty is zero) and
//! an off edge armed `duty · period` later. Duty changes take effect at the
//! next period start.

use delta_common::hal::driver::Hal;
use delta_common::hal::types::{PinId, Ticks, TimerChannel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    PeriodStart,
    Off,
}

#[derive(Debug, Clone)]
pub struct SoftPwm {
    channel: TimerChannel,
    pin: PinId,
    invert: bool,
    period: Ticks,
    duty: f64,
    period_start: Ticks,
    edge: Edge,
    active: bool,
}

impl SoftPwm {
    pub fn new(channel: TimerChannel, pin: PinId, invert: bool, period: Ticks) -> Self {
        Self {
            channel,
            pin,
            invert,
            period: period.max(1),
            duty: 0.0,
            period_start: 0,
            edge: Edge::PeriodStart,
            active: false,
        }
    }

    /// Drive the output inactive and arm the first period at `at`.
    pub fn start<H: Hal>(&mut self, hal: &mut H, at: Ticks) {
        self.drive(hal, false);
        self.edge = Edge::PeriodStart;
        hal.arm_timer(self.channel, at);
    }

    /// New duty, clamped to `[0, 1]`; NaN is treated as zero.
    pub fn set_duty(&mut self, duty: f64) {
        self.duty = if duty.is_nan() { 0.0 } else { duty.clamp(0.0, 1.0) };
    }

    pub fn duty(&self) -> f64 {
        self.duty
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `true` if the next firing starts a new period.
    pub fn at_period_start(&self) -> bool {
        self.edge == Edge::PeriodStart
    }

    /// Timer handler. `at` is the deadline that fired.
    pub fn on_timer<H: Hal>(&mut self, hal: &mut H, at: Ticks) {
        match self.edge {
            Edge::PeriodStart => {
                self.period_start = at;
                let on = (self.duty * self.period as f64).round() as Ticks;
                if on == 0 {
                    self.drive(hal, false);
                    hal.arm_timer(self.channel, at + self.period);
                } else if on >= self.period {
                    self.drive(hal, true);
                    hal.arm_timer(self.channel, at + self.period);
                } else {
                    self.drive(hal, true);
                    self.edge = Edge::Off;
                    hal.arm_timer(self.channel, at + on);
                }
            }
            Edge::Off => {
                self.drive(hal, false);
                self.edge = Edge::PeriodStart;
                hal.arm_timer(self.channel, self.period_start + self.period);
            }
        }
    }

    /// Stop pulsing and leave the output inactive.
    pub fn force_off<H: Hal>(&mut self, hal: &mut H) {
        self.duty = 0.0;
        hal.cancel_timer(self.channel);
        self.drive(hal, false);
        self.edge = Edge::PeriodStart;
    }

    #[inline]
    fn drive<H: Hal>(&mut self, hal: &mut H, active: bool) {
        self.active = active;
        hal.write_pin(self.pin, active != self.invert);
    }
}
