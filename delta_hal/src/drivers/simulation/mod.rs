//! Simulation driver module.
//!
//! Software board for development and testing without physical hardware:
//! deterministic clock and timers, pins with edge counting, stepper
//! carriages with end-stops, thermal plants behind heater outputs and a
//! hardware watchdog model.

mod driver;
mod io;
mod physics;

pub use driver::SimHal;
pub use io::PinBank;
pub use physics::{AMBIENT_TEMP, SimAxis, ThermalPlant};
