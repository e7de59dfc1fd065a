//! Shared fixtures.

mod delta;
mod heater_safety;
mod homing;
mod planner_scenario;
mod watchdog;

use delta_common::printer::config::PrinterConfig;
use delta_core::Printer;
use delta_hal::SimHal;

pub fn printer() -> Printer<SimHal> {
    printer_with(PrinterConfig::builtin().unwrap())
}

pub fn printer_with(cfg: PrinterConfig) -> Printer<SimHal> {
    let hal = SimHal::from_config(&cfg);
    Printer::new(hal, cfg).unwrap()
}

/// Home A, B and C and wait for all three.
pub fn homed_printer() -> Printer<SimHal> {
    let mut p = printer();
    p.start_homing_all().unwrap();
    assert!(p.run_until(15.0, |p| p.is_idle()), "homing did not settle");
    for axis in 0..3 {
        assert!(p.is_homed(axis), "axis {axis} not homed");
    }
    p
}
