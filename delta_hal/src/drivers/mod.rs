//! HAL driver implementations.
//!
//! - [`simulation`] - Software board for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `Hal` trait from `delta_common::hal::driver`
//! 3. Add export and documentation

pub mod simulation;
