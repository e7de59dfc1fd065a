//! Heater controller.
//!
//! Split across the two contexts:
//!
//! - the heater timer handler runs the PWM and, once per control interval
//!   at a period start, samples the thermistor, enforces the safety envelope
//!   and posts [`Event::HeaterSample`];
//! - the loop runs the control law on the stored sample and sets the duty
//!   for the next period, and feeds the stability observer.
//!
//! A reading outside `min_safe_temp..=max_safe_temp`, or at an ADC rail,
//! trips the emergency flag whether or not a target is set.

use delta_common::hal::driver::Hal;
use delta_common::hal::types::{PinId, Ticks, TimerChannel};
use delta_common::printer::config::HeaterConfig;
use delta_common::printer::safety::{EmergencyReason, SafetyStatus};
use delta_common::printer::thermistor::Thermistor;

use super::control::ControlLaw;
use super::observer::TemperatureObserver;
use super::pwm::SoftPwm;
use crate::clock::TimeBase;
use crate::error::CommandError;
use crate::event::{Event, EventQueue};
use crate::safety::EmergencyFlag;

/// Snapshot for the command interpreter and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterState {
    /// Latest estimate; `None` before the first sample.
    pub temperature: Option<f64>,
    pub target: Option<f64>,
    pub integral: f64,
    pub duty: f64,
    pub output_active: bool,
    pub stable: bool,
    pub safety: SafetyStatus,
}

#[derive(Debug)]
pub struct Heater {
    index: u8,
    name: String,
    adc_pin: PinId,
    thermistor: Thermistor,
    min_safe: f64,
    max_safe: f64,
    pwm: SoftPwm,
    control_interval: Ticks,
    control_dt: f64,
    next_sample: Ticks,
    law: ControlLaw,
    observer: TemperatureObserver,
    target: Option<f64>,
    /// Written by the handler only.
    sample: Option<f64>,
    samples: u64,
}

impl Heater {
    pub fn new(index: u8, config: &HeaterConfig, time: &TimeBase, now: Ticks) -> Self {
        let channel = TimerChannel::Heater(index);
        Self {
            index,
            name: config.name.clone(),
            adc_pin: config.adc_pin,
            thermistor: Thermistor::new(&config.thermistor),
            min_safe: config.min_safe_temp,
            max_safe: config.max_safe_temp,
            pwm: SoftPwm::new(
                channel,
                config.output_pin,
                config.output_invert,
                time.ticks(config.pulse_interval),
            ),
            control_interval: time.ticks(config.control_interval).max(1),
            control_dt: config.control_interval,
            next_sample: now,
            law: ControlLaw::new(config),
            observer: TemperatureObserver::new(&config.observer, time, now),
            target: None,
            sample: None,
            samples: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Begin PWM periods and sampling at `now`.
    pub fn start<H: Hal>(&mut self, hal: &mut H, now: Ticks) {
        self.next_sample = now;
        self.pwm.start(hal, now);
    }

    // ─── Interrupt side ─────────────────────────────────────────────

    /// Heater timer handler. `at` is the deadline that fired.
    pub fn on_timer<H: Hal>(
        &mut self,
        hal: &mut H,
        at: Ticks,
        emergency: &EmergencyFlag,
        events: &mut EventQueue,
    ) {
        if self.pwm.at_period_start() && at >= self.next_sample {
            let behind = (at - self.next_sample) / self.control_interval;
            self.next_sample += (behind + 1) * self.control_interval;

            // A failed conversion reads as a rail, i.e. a sensor fault.
            let raw = hal.read_adc(self.adc_pin).unwrap_or(0);
            let temperature = self.thermistor.temp_from_raw(raw);
            self.sample = Some(temperature);
            self.samples += 1;

            if let Some(reason) = self.check_envelope(temperature) {
                emergency.trip(reason);
                self.pwm.force_off(hal);
                return;
            }
            events.post(Event::HeaterSample(self.index));
        }
        self.pwm.on_timer(hal, at);
    }

    fn check_envelope(&self, temperature: f64) -> Option<EmergencyReason> {
        let heater = self.index;
        if !temperature.is_finite() {
            Some(EmergencyReason::SensorFault { heater })
        } else if temperature > self.max_safe {
            Some(EmergencyReason::HeaterTooHot { heater })
        } else if temperature < self.min_safe {
            Some(EmergencyReason::HeaterTooCold { heater })
        } else {
            None
        }
    }

    // ─── Loop side ──────────────────────────────────────────────────

    /// Run the control law on the latest sample.
    pub fn on_sample(&mut self) {
        let Some(temperature) = self.sample else {
            return;
        };
        let duty = match self.target {
            Some(target) => self.law.update(target, temperature, self.control_dt),
            None => 0.0,
        };
        self.pwm.set_duty(duty);
    }

    pub fn poll_observer(&mut self, now: Ticks) {
        self.observer.poll(now, self.sample, self.target);
    }

    /// Set the target temperature. Zero, negative or non-finite turns the
    /// heater off.
    pub fn set_target(&mut self, target: f64, now: Ticks) -> Result<(), CommandError> {
        if target.is_finite() && target > 0.0 && !(self.min_safe..=self.max_safe).contains(&target)
        {
            return Err(CommandError::TargetOutOfRange {
                target,
                min: self.min_safe,
                max: self.max_safe,
            });
        }
        self.target = (target.is_finite() && target > 0.0).then_some(target);
        self.law.reset();
        self.observer.reset(now);
        if self.target.is_none() {
            self.pwm.set_duty(0.0);
        }
        Ok(())
    }

    pub fn is_stable(&self) -> bool {
        self.target.is_some() && self.observer.is_stable()
    }

    /// Emergency: output off for good.
    pub fn shutdown<H: Hal>(&mut self, hal: &mut H) {
        self.target = None;
        self.pwm.force_off(hal);
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn state(&self, safety: SafetyStatus) -> HeaterState {
        HeaterState {
            temperature: self.sample,
            target: self.target,
            integral: self.law.integral(),
            duty: self.pwm.duty(),
            output_active: self.pwm.is_active(),
            stable: self.is_stable(),
            safety,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delta_common::hal::types::PinMode;
    use delta_common::printer::config::PrinterConfig;
    use delta_hal::SimHal;

    struct Rig {
        hal: SimHal,
        heater: Heater,
        flag: EmergencyFlag,
        events: EventQueue,
    }

    fn rig() -> Rig {
        let cfg = PrinterConfig::builtin().unwrap();
        let mut hal = SimHal::from_config(&cfg);
        let hc = &cfg.heaters[0];
        hal.configure_pin(hc.output_pin, PinMode::Output).unwrap();
        let time = TimeBase::new(cfg.clock.tick_hz);
        let mut heater = Heater::new(0, hc, &time, 0);
        heater.start(&mut hal, 0);
        Rig {
            hal,
            heater,
            flag: EmergencyFlag::new(),
            events: EventQueue::new(16),
        }
    }

    impl Rig {
        /// Drive handler and loop side in 10 ms slices.
        fn run(&mut self, ticks: Ticks) {
            let end = self.hal.horizon() + ticks;
            while self.hal.horizon() < end {
                self.hal.advance((end - self.hal.horizon()).min(10_000));
                while let Some((_, at)) = self.hal.poll_timer() {
                    self.heater
                        .on_timer(&mut self.hal, at, &self.flag, &mut self.events);
                }
                while let Some(ev) = self.events.next() {
                    if ev == Event::HeaterSample(0) {
                        self.heater.on_sample();
                    }
                }
            }
        }
    }

    #[test]
    fn samples_once_per_control_interval() {
        let mut r = rig();
        r.run(1_000_000);
        // 0.0, 0.2, ..., 1.0 s
        assert_eq!(r.heater.samples(), 6);
        let t = r.heater.state(r.flag.status()).temperature.unwrap();
        assert!((t - 25.0).abs() < 1.0, "t={t}");
    }

    #[test]
    fn target_range_is_checked() {
        let mut r = rig();
        assert!(matches!(
            r.heater.set_target(300.0, 0),
            Err(CommandError::TargetOutOfRange { .. })
        ));
        assert!(r.heater.set_target(200.0, 0).is_ok());
        assert!(r.heater.set_target(0.0, 0).is_ok());
        assert_eq!(r.heater.state(SafetyStatus::Normal).target, None);
    }

    #[test]
    fn heats_toward_target() {
        let mut r = rig();
        r.heater.set_target(100.0, 0).unwrap();
        r.run(500_000);
        assert!(r.heater.state(SafetyStatus::Normal).duty > 0.0);
        r.run(20_000_000);
        let t = r.heater.state(SafetyStatus::Normal).temperature.unwrap();
        assert!(t > 60.0, "t={t}");
        assert!(!r.flag.is_tripped());
    }

    #[test]
    fn overheat_trips_emergency_within_one_interval() {
        let mut r = rig();
        r.run(100_000);
        r.hal.plant_mut(0).unwrap().set_temperature(290.0);
        r.run(200_000);
        assert_eq!(
            r.flag.reason(),
            Some(EmergencyReason::HeaterTooHot { heater: 0 })
        );
        let s = r.heater.state(r.flag.status());
        assert_eq!(s.duty, 0.0);
        assert!(!s.output_active);
        assert!(!r.hal.is_armed(TimerChannel::Heater(0)));
    }

    #[test]
    fn open_sensor_is_a_fault() {
        let mut r = rig();
        r.hal.plant_mut(0).unwrap().set_adc_override(Some(u16::MAX));
        r.run(10);
        assert_eq!(
            r.flag.reason(),
            Some(EmergencyReason::SensorFault { heater: 0 })
        );
    }

    #[test]
    fn cold_reading_trips_without_a_target() {
        let mut r = rig();
        assert_eq!(r.heater.state(SafetyStatus::Normal).target, None);
        r.hal.plant_mut(0).unwrap().set_temperature(12.0);
        r.run(400_000);
        assert_eq!(
            r.flag.reason(),
            Some(EmergencyReason::HeaterTooCold { heater: 0 })
        );
    }
}
