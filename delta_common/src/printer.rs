//! Printer domain types shared by the core, the HAL drivers and tests.

pub mod config;
pub mod homing;
pub mod motion;
pub mod safety;
pub mod thermistor;
