//! Fail-safe machinery: the one-way emergency flag and the watchdog
//! supervisor.

pub mod emergency;
pub mod watchdog;

pub use emergency::EmergencyFlag;
pub use watchdog::WatchdogSupervisor;
