//! Simulation driver implementation.
//!
//! `SimHal` implements the `Hal` trait in software. Time only moves when the
//! test or binary calls [`SimHal::advance`]; armed timers then fire in
//! deadline order through `poll_timer`, and each fire moves the clock to its
//! deadline so handlers observe the exact time they were scheduled for.

use super::io::PinBank;
use super::physics::{SimAxis, ThermalPlant};
use delta_common::hal::driver::{Hal, HalError};
use delta_common::hal::types::{PinId, PinMode, Ticks, TimerChannel};
use delta_common::printer::config::PrinterConfig;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Highest pin number on the simulated board.
const SIM_PIN_LIMIT: u16 = 255;

/// What a pin is wired to on the simulated board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wiring {
    Step(usize),
    Dir(usize),
    Enable(usize),
    Endstop(usize),
    HeaterOutput(usize),
    HeaterAdc(usize),
}

/// Hardware watchdog model.
#[derive(Debug, Default)]
struct WatchdogModel {
    timeout: Option<Ticks>,
    last_kick: Ticks,
    resets: u32,
}

/// Software board implementing the HAL contract.
pub struct SimHal {
    tick_hz: u32,
    now: Ticks,
    /// Time up to which timers may fire.
    horizon: Ticks,
    timers: BTreeMap<TimerChannel, Ticks>,
    pins: PinBank,
    wiring: HashMap<PinId, Wiring>,
    axes: Vec<SimAxis>,
    plants: Vec<ThermalPlant>,
    watchdog: WatchdogModel,
    timer_fires: u64,
}

impl SimHal {
    /// Bare board with no wired peripherals.
    pub fn new(tick_hz: u32) -> Self {
        Self {
            tick_hz,
            now: 0,
            horizon: 0,
            timers: BTreeMap::new(),
            pins: PinBank::new(SIM_PIN_LIMIT),
            wiring: HashMap::new(),
            axes: Vec::new(),
            plants: Vec::new(),
            watchdog: WatchdogModel::default(),
            timer_fires: 0,
        }
    }

    /// Board wired according to the printer table: one carriage per axis,
    /// one thermal plant per heater.
    pub fn from_config(config: &PrinterConfig) -> Self {
        let mut hal = Self::new(config.clock.tick_hz);
        for (i, axis) in config.axes.iter().enumerate() {
            hal.wiring.insert(axis.step_pin, Wiring::Step(i));
            hal.wiring.insert(axis.dir_pin, Wiring::Dir(i));
            hal.wiring.insert(axis.enable_pin, Wiring::Enable(i));
            if let Some(h) = &axis.homing {
                hal.wiring.insert(h.endstop_pin, Wiring::Endstop(i));
            }
            hal.axes.push(SimAxis::new(axis));
        }
        for (i, heater) in config.heaters.iter().enumerate() {
            hal.wiring.insert(heater.output_pin, Wiring::HeaterOutput(i));
            hal.wiring.insert(heater.adc_pin, Wiring::HeaterAdc(i));
            hal.plants.push(ThermalPlant::new(heater));
        }
        info!(
            machine = %config.shared.machine_name,
            axes = hal.axes.len(),
            heaters = hal.plants.len(),
            tick_hz = hal.tick_hz,
            "simulation board wired"
        );
        hal
    }

    // ─── Time ───────────────────────────────────────────────────────

    /// Allow time to move forward by `ticks`. Timers due in that window fire
    /// through `poll_timer`; once none remain the clock settles at the end
    /// of the window.
    pub fn advance(&mut self, ticks: Ticks) {
        self.horizon = self.horizon.max(self.now).saturating_add(ticks);
    }

    /// Seconds → ticks at this board's clock rate.
    pub fn ticks_from_secs(&self, secs: f64) -> Ticks {
        (secs * f64::from(self.tick_hz)).round().max(0.0) as Ticks
    }

    pub fn horizon(&self) -> Ticks {
        self.horizon
    }

    fn settle(&mut self, t: Ticks) {
        if t <= self.now {
            return;
        }
        let dt = (t - self.now) as f64 / f64::from(self.tick_hz);
        for plant in &mut self.plants {
            plant.integrate(dt);
        }
        if let Some(timeout) = self.watchdog.timeout {
            if t.saturating_sub(self.watchdog.last_kick) > timeout {
                self.watchdog.resets += 1;
                self.watchdog.last_kick = t;
                warn!(at = t, "simulated watchdog expired: board reset");
            }
        }
        self.now = t;
    }

    // ─── Inspection ─────────────────────────────────────────────────

    pub fn axis(&self, index: usize) -> Option<&SimAxis> {
        self.axes.get(index)
    }

    pub fn axis_mut(&mut self, index: usize) -> Option<&mut SimAxis> {
        self.axes.get_mut(index)
    }

    pub fn plant(&self, index: usize) -> Option<&ThermalPlant> {
        self.plants.get(index)
    }

    pub fn plant_mut(&mut self, index: usize) -> Option<&mut ThermalPlant> {
        self.plants.get_mut(index)
    }

    /// Current level of any pin (outputs as driven, inputs as sensed).
    pub fn pin_level(&self, pin: PinId) -> bool {
        self.read_pin(pin)
    }

    pub fn rising_edges(&self, pin: PinId) -> u64 {
        self.pins.rising_edges(pin)
    }

    /// Ticks `pin` has spent high since startup.
    pub fn high_ticks(&self, pin: PinId) -> Ticks {
        self.pins.high_ticks(pin, self.now)
    }

    pub fn is_armed(&self, channel: TimerChannel) -> bool {
        self.timers.contains_key(&channel)
    }

    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }

    pub fn watchdog_resets(&self) -> u32 {
        self.watchdog.resets
    }

    pub fn timer_fires(&self) -> u64 {
        self.timer_fires
    }
}

impl Hal for SimHal {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn now(&self) -> Ticks {
        self.now
    }

    fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    fn configure_pin(&mut self, pin: PinId, mode: PinMode) -> Result<(), HalError> {
        self.pins.configure(pin, mode, self.now)
    }

    fn read_pin(&self, pin: PinId) -> bool {
        match self.wiring.get(&pin) {
            Some(Wiring::Endstop(i)) => self.axes.get(*i).is_some_and(SimAxis::endstop_level),
            _ => self.pins.level(pin),
        }
    }

    fn write_pin(&mut self, pin: PinId, high: bool) {
        if !self.pins.is_configured(pin) {
            return;
        }
        let rising = self.pins.write(pin, high, self.now);
        match self.wiring.get(&pin).copied() {
            Some(Wiring::Step(i)) if rising => {
                if let Some(axis) = self.axes.get_mut(i) {
                    axis.on_step();
                }
            }
            Some(Wiring::Dir(i)) => {
                if let Some(axis) = self.axes.get_mut(i) {
                    axis.set_dir_level(high);
                }
            }
            Some(Wiring::Enable(i)) => {
                if let Some(axis) = self.axes.get_mut(i) {
                    axis.set_enable_level(high);
                }
            }
            Some(Wiring::HeaterOutput(i)) => {
                if let Some(plant) = self.plants.get_mut(i) {
                    plant.set_output_level(high);
                }
            }
            _ => {}
        }
    }

    fn read_adc(&mut self, pin: PinId) -> Result<u16, HalError> {
        match self.wiring.get(&pin) {
            Some(Wiring::HeaterAdc(i)) => self
                .plants
                .get(*i)
                .map(ThermalPlant::adc)
                .ok_or(HalError::NotAnalog(pin)),
            _ => Err(HalError::NotAnalog(pin)),
        }
    }

    fn arm_timer(&mut self, channel: TimerChannel, deadline: Ticks) {
        self.timers.insert(channel, deadline);
    }

    fn cancel_timer(&mut self, channel: TimerChannel) {
        self.timers.remove(&channel);
    }

    fn poll_timer(&mut self) -> Option<(TimerChannel, Ticks)> {
        let next = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= self.horizon)
            .min_by_key(|(channel, deadline)| (**deadline, **channel))
            .map(|(c, d)| (*c, *d));
        match next {
            Some((channel, deadline)) => {
                self.timers.remove(&channel);
                self.settle(deadline);
                self.timer_fires += 1;
                Some((channel, deadline))
            }
            None => {
                let horizon = self.horizon;
                self.settle(horizon);
                None
            }
        }
    }

    fn watchdog_start(&mut self, timeout: Ticks) -> Result<(), HalError> {
        if timeout == 0 {
            return Err(HalError::Watchdog("zero timeout".into()));
        }
        self.watchdog.timeout = Some(timeout);
        self.watchdog.last_kick = self.now;
        debug!(timeout, "simulated watchdog started");
        Ok(())
    }

    fn watchdog_kick(&mut self) {
        self.watchdog.last_kick = self.now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_in_deadline_order_and_move_clock() {
        let mut hal = SimHal::new(1_000_000);
        hal.arm_timer(TimerChannel::Heater(0), 300);
        hal.arm_timer(TimerChannel::Axis(1), 100);
        hal.arm_timer(TimerChannel::Event, 5_000);
        hal.advance(1_000);

        assert_eq!(hal.poll_timer(), Some((TimerChannel::Axis(1), 100)));
        assert_eq!(hal.now(), 100);
        assert_eq!(hal.poll_timer(), Some((TimerChannel::Heater(0), 300)));
        assert_eq!(hal.poll_timer(), None);
        assert_eq!(hal.now(), 1_000);
        assert!(hal.is_armed(TimerChannel::Event));
    }

    #[test]
    fn rearming_replaces_deadline() {
        let mut hal = SimHal::new(1_000);
        hal.arm_timer(TimerChannel::Fan(0), 10);
        hal.arm_timer(TimerChannel::Fan(0), 20);
        hal.advance(15);
        assert_eq!(hal.poll_timer(), None);
        hal.advance(10);
        assert_eq!(hal.poll_timer(), Some((TimerChannel::Fan(0), 20)));
    }

    #[test]
    fn watchdog_resets_when_not_kicked() {
        let mut hal = SimHal::new(1_000);
        hal.watchdog_start(100).unwrap();
        hal.advance(80);
        hal.poll_timer();
        hal.watchdog_kick();
        hal.advance(80);
        hal.poll_timer();
        assert_eq!(hal.watchdog_resets(), 0);
        hal.advance(200);
        hal.poll_timer();
        assert_eq!(hal.watchdog_resets(), 1);
        assert!(hal.watchdog_start(0).is_err());
    }

    #[test]
    fn adc_only_on_wired_heater_pins() {
        let cfg = PrinterConfig::builtin().unwrap();
        let mut hal = SimHal::from_config(&cfg);
        let adc = cfg.heaters[0].adc_pin;
        assert!(hal.read_adc(adc).is_ok());
        assert_eq!(
            hal.read_adc(PinId(99)),
            Err(HalError::NotAnalog(PinId(99)))
        );
    }

    #[test]
    fn step_pin_moves_wired_carriage() {
        let cfg = PrinterConfig::builtin().unwrap();
        let mut hal = SimHal::from_config(&cfg);
        let a = &cfg.axes[0];
        for pin in [a.step_pin, a.dir_pin, a.enable_pin] {
            hal.configure_pin(pin, PinMode::Output).unwrap();
        }
        hal.write_pin(a.enable_pin, false);
        let before = hal.axis(0).unwrap().position_steps();
        for _ in 0..5 {
            hal.write_pin(a.step_pin, true);
            hal.write_pin(a.step_pin, false);
        }
        assert_eq!(hal.rising_edges(a.step_pin), 5);
        assert_eq!(hal.axis(0).unwrap().position_steps(), before + 5);
    }
}
