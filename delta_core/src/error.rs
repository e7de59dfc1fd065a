//! Core error types.
//!
//! Admission of motion has its own result type
//! ([`EnqueueResult`](delta_common::printer::motion::EnqueueResult)); the
//! enums here cover startup and the remaining command surface.

use delta_common::config::ConfigError;
use delta_common::hal::driver::HalError;
use thiserror::Error;

/// Startup failure.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("hardware setup failed: {0}")]
    Hal(#[from] HalError),
}

/// Command refused by the core. Non-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CommandError {
    #[error("no heater {0}")]
    UnknownHeater(usize),
    #[error("no fan {0}")]
    UnknownFan(usize),
    #[error("no axis {0}")]
    UnknownAxis(usize),
    #[error("target {target} outside safe range [{min}, {max}]")]
    TargetOutOfRange { target: f64, min: f64, max: f64 },
    #[error("axis {0} has no end-stop configured")]
    HomingNotConfigured(usize),
    #[error("motion in progress")]
    Busy,
    #[error("emergency shutdown active")]
    Emergency,
}
