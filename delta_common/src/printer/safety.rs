//! Emergency shutdown reasons.
//!
//! The emergency flag itself lives in the core; this module only names why it
//! was raised. Reasons pack into a `u16` so the core can store them in an
//! atomic next to the flag.

use core::fmt;

/// Why the firmware entered emergency shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyReason {
    /// Heater temperature above its maximum safe value.
    HeaterTooHot { heater: u8 },
    /// Heater temperature below its minimum safe value.
    HeaterTooCold { heater: u8 },
    /// Thermistor reading at an ADC rail (open or shorted sensor).
    SensorFault { heater: u8 },
    /// Requested by the command interpreter.
    External,
}

impl EmergencyReason {
    /// Pack into a non-zero code. Zero means "no emergency".
    pub const fn to_code(self) -> u16 {
        match self {
            Self::HeaterTooHot { heater } => 0x0100 | heater as u16,
            Self::HeaterTooCold { heater } => 0x0200 | heater as u16,
            Self::SensorFault { heater } => 0x0300 | heater as u16,
            Self::External => 0x0400,
        }
    }

    /// Unpack a code produced by [`to_code`](Self::to_code).
    pub const fn from_code(code: u16) -> Option<Self> {
        let heater = (code & 0x00FF) as u8;
        match code & 0xFF00 {
            0x0100 => Some(Self::HeaterTooHot { heater }),
            0x0200 => Some(Self::HeaterTooCold { heater }),
            0x0300 => Some(Self::SensorFault { heater }),
            0x0400 => Some(Self::External),
            _ => None,
        }
    }

    /// Heater that tripped the envelope, if any.
    pub const fn heater(self) -> Option<u8> {
        match self {
            Self::HeaterTooHot { heater }
            | Self::HeaterTooCold { heater }
            | Self::SensorFault { heater } => Some(heater),
            Self::External => None,
        }
    }
}

impl fmt::Display for EmergencyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaterTooHot { heater } => write!(f, "heater {heater} above safe range"),
            Self::HeaterTooCold { heater } => write!(f, "heater {heater} below safe range"),
            Self::SensorFault { heater } => write!(f, "heater {heater} sensor fault"),
            Self::External => f.write_str("external emergency stop"),
        }
    }
}

/// Result of the `query_safety_status` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SafetyStatus {
    /// No emergency raised.
    #[default]
    Normal,
    /// Terminal state until reset.
    Emergency(EmergencyReason),
}

impl SafetyStatus {
    pub const fn is_emergency(self) -> bool {
        matches!(self, Self::Emergency(_))
    }
}
