//! Physics models behind the simulated pins.

mod axis;
mod thermal;

pub use axis::SimAxis;
pub use thermal::{AMBIENT_TEMP, ThermalPlant};
