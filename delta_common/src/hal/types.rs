//! Value types exchanged across the HAL boundary.

use serde::{Deserialize, Serialize};

/// Monotonic clock value in HAL ticks.
pub type Ticks = u64;

/// Board pin number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub u16);

impl core::fmt::Display for PinId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "pin{}", self.0)
    }
}

/// Electrical mode of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PinMode {
    /// Floating input.
    Input = 0,
    /// Input with internal pull-up (end-stops).
    InputPullUp = 1,
    /// Push-pull output.
    Output = 2,
}

/// Hardware timer channel.
///
/// Each channel owns one absolute deadline at a time. Re-arming a channel
/// replaces its previous deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerChannel {
    /// Wakes the event loop (planner force-flush, housekeeping).
    Event,
    /// Step pulse generation for one axis.
    Axis(u8),
    /// Soft-PWM and control sampling for one heater.
    Heater(u8),
    /// Soft-PWM for one fan.
    Fan(u8),
}

impl TimerChannel {
    /// Dense slot index used by drivers that keep channels in an array.
    ///
    /// Layout: `[Event, Axis(0..a), Heater(0..h), Fan(0..f)]`.
    pub const fn slot(self, max_axes: usize, max_heaters: usize) -> usize {
        match self {
            Self::Event => 0,
            Self::Axis(i) => 1 + i as usize,
            Self::Heater(i) => 1 + max_axes + i as usize,
            Self::Fan(i) => 1 + max_axes + max_heaters + i as usize,
        }
    }
}
