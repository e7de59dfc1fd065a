//! Control laws mapping a temperature sample to a heater duty.

use delta_common::printer::config::{ControlMode, HeaterConfig, PidParams};

use super::pid::{PidState, pid_compute};

/// Per-heater control law, chosen by `control` in the config table.
#[derive(Debug, Clone)]
pub enum ControlLaw {
    Pid { gains: PidParams, state: PidState },
    /// Full on below `target − hysteresis`, off above `target + hysteresis`,
    /// unchanged in between.
    BangBang { hysteresis: f64, on: bool },
}

impl ControlLaw {
    pub fn new(config: &HeaterConfig) -> Self {
        match config.control {
            ControlMode::Pid => Self::Pid {
                gains: config.pid,
                state: PidState::default(),
            },
            ControlMode::BangBang => Self::BangBang {
                hysteresis: config.hysteresis,
                on: false,
            },
        }
    }

    /// Duty in `[0, 1]` for this sample.
    pub fn update(&mut self, target: f64, value: f64, dt: f64) -> f64 {
        match self {
            Self::Pid { gains, state } => pid_compute(state, gains, target, value, dt),
            Self::BangBang { hysteresis, on } => {
                if value < target - *hysteresis {
                    *on = true;
                } else if value > target + *hysteresis {
                    *on = false;
                }
                if *on { 1.0 } else { 0.0 }
            }
        }
    }

    pub fn reset(&mut self) {
        match self {
            Self::Pid { state, .. } => state.reset(),
            Self::BangBang { on, .. } => *on = false,
        }
    }

    /// PID integrator, zero for bang-bang.
    pub fn integral(&self) -> f64 {
        match self {
            Self::Pid { state, .. } => state.integral(),
            Self::BangBang { .. } => 0.0,
        }
    }
}
