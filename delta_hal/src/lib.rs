//! # Delta HAL Library
//!
//! Hardware abstraction drivers for the delta printer core. Drivers
//! implement the `Hal` trait defined in `delta_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`drivers`] - HAL driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                  delta_core (Printer<H>)                   │
//! └────────────────────────────┬───────────────────────────────┘
//!                              │ Hal trait
//!                              ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  SimHal: clock · timers · pins · ADC · watchdog            │
//! │     ├── SimAxis (step/dir/enable → carriage, end-stop)     │
//! │     └── ThermalPlant (heater output → temperature → ADC)   │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod drivers;

pub use crate::drivers::simulation::SimHal;
