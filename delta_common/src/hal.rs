//! Hardware abstraction contract.
//!
//! The firmware core never touches registers. It drives pins, reads the ADC,
//! arms per-channel timers and feeds the hardware watchdog through the
//! [`Hal`](driver::Hal) trait. Register-level drivers and the software
//! simulation live in the `delta_hal` crate.

pub mod driver;
pub mod types;
