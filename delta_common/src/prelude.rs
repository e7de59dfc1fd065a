//! Prelude module for common re-exports.
//!
//! # Usage
//!
//! ```rust
//! use delta_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};
pub use crate::printer::config::{
    AxisConfig, AxisHomingConfig, ControlMode, DeltaConfig, FanConfig, HeaterConfig,
    ObserverConfig, PidParams, PlannerConfig, PrinterConfig, ThermistorConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::*;

// ─── Hardware Abstraction ───────────────────────────────────────────
pub use crate::hal::driver::{Hal, HalError};
pub use crate::hal::types::{PinId, PinMode, Ticks, TimerChannel};

// ─── Printer Domain ─────────────────────────────────────────────────
pub use crate::printer::homing::{HomeDirection, HomingFailure, HomingPhase};
pub use crate::printer::motion::{
    CartesianMove, EnqueueResult, MoveSegment, RejectReason, SegmentFlags,
};
pub use crate::printer::safety::{EmergencyReason, SafetyStatus};
pub use crate::printer::thermistor::Thermistor;
