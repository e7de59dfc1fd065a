//! Homing enums shared between configuration and the homing state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction in which an axis seeks its end-stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeDirection {
    /// End-stop at the axis maximum.
    Positive,
    /// End-stop at the axis minimum.
    Negative,
}

impl HomeDirection {
    /// +1.0 or -1.0.
    pub const fn sign(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }

    /// Opposite direction (used for the retract phase).
    pub const fn reversed(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

/// Homing phase of a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HomingPhase {
    /// Not homing.
    #[default]
    Idle = 0,
    /// Moving toward the end-stop at fast speed.
    FastApproach = 1,
    /// Backing off the end-stop by the retract distance.
    Retract = 2,
    /// Approaching again at slow speed.
    SlowApproach = 3,
    /// Position established.
    Done = 4,
    /// End-stop not found within the allowed distance.
    Failed = 5,
}

impl HomingPhase {
    /// Convert from u8. Returns `None` for invalid values.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Idle),
            1 => Some(Self::FastApproach),
            2 => Some(Self::Retract),
            3 => Some(Self::SlowApproach),
            4 => Some(Self::Done),
            5 => Some(Self::Failed),
            _ => None,
        }
    }

    /// `true` while the axis is moving under homing control.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::FastApproach | Self::Retract | Self::SlowApproach
        )
    }
}

/// Reason a homing sequence ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HomingFailure {
    /// Fast approach travelled its maximum distance without a trigger.
    #[error("end-stop not reached during fast approach")]
    FastApproachExhausted,
    /// Slow approach travelled its maximum distance without a trigger.
    #[error("end-stop not reached during slow approach")]
    SlowApproachExhausted,
    /// Emergency shutdown interrupted the sequence.
    #[error("homing aborted by emergency shutdown")]
    Aborted,
    /// An end-stop or idle event was dropped by a full event queue.
    #[error("homing event lost to a full event queue")]
    EventsLost,
}
