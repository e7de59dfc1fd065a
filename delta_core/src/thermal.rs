//! Temperature control: heaters, their control laws and fans.

pub mod control;
pub mod fan;
pub mod heater;
pub mod observer;
pub mod pid;
pub mod pwm;

pub use fan::Fan;
pub use heater::{Heater, HeaterState};
