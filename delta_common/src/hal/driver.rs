//! HAL driver trait and error types.
//!
//! This module defines:
//! - `Hal` trait - Interface implemented by board and simulation drivers
//! - `HalError` enum - Error types for HAL operations

use super::types::{PinId, PinMode, Ticks, TimerChannel};
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Pin number not present on this board.
    #[error("Unknown pin: {0}")]
    UnknownPin(PinId),

    /// Pin already configured in an incompatible mode.
    #[error("Pin {0} already claimed")]
    PinConflict(PinId),

    /// Pin has no ADC channel.
    #[error("Pin {0} is not an analog input")]
    NotAnalog(PinId),

    /// Timer channel outside the driver's channel table.
    #[error("Timer channel {0:?} not available")]
    NoSuchTimer(TimerChannel),

    /// Watchdog could not be armed with the requested timeout.
    #[error("Watchdog error: {0}")]
    Watchdog(String),
}

/// Trait defining the hardware surface used by the firmware core.
///
/// # Interrupt model
///
/// Timer channels carry absolute deadlines. The driver reports expired
/// channels through [`Hal::poll_timer`] in deadline order; the core runs the
/// handler bound to that channel, which may re-arm it. On a board this is
/// called from the timer ISR, in simulation from the driver's time advance.
///
/// # Timing Contracts
///
/// | Operation | RT Constraint |
/// |-----------|---------------|
/// | `write_pin` / `read_pin` | bounded, no allocation |
/// | `arm_timer` / `cancel_timer` | bounded, no allocation |
/// | `read_adc` | bounded (returns last conversion) |
/// | `watchdog_kick` | bounded |
pub trait Hal {
    /// Driver identifier (e.g. "simulation", "teensy3").
    fn name(&self) -> &'static str;

    /// Current monotonic clock value.
    fn now(&self) -> Ticks;

    /// Clock rate in ticks per second.
    fn tick_hz(&self) -> u32;

    /// Configure a digital pin.
    ///
    /// # Errors
    /// `UnknownPin` or `PinConflict`.
    fn configure_pin(&mut self, pin: PinId, mode: PinMode) -> Result<(), HalError>;

    /// Read the logical level of a digital input.
    fn read_pin(&self, pin: PinId) -> bool;

    /// Drive a digital output.
    fn write_pin(&mut self, pin: PinId, high: bool);

    /// Latest raw ADC conversion on an analog pin, scaled to 16 bits.
    ///
    /// # Errors
    /// `NotAnalog` if the pin has no ADC channel.
    fn read_adc(&mut self, pin: PinId) -> Result<u16, HalError>;

    /// Arm `channel` to fire at the absolute time `deadline`.
    ///
    /// A deadline already in the past fires on the next poll.
    fn arm_timer(&mut self, channel: TimerChannel, deadline: Ticks);

    /// Arm `channel` relative to the current time.
    fn arm_timer_after(&mut self, channel: TimerChannel, delay: Ticks) {
        let now = self.now();
        self.arm_timer(channel, now.saturating_add(delay));
    }

    /// Disarm `channel`. No-op if it is not armed.
    fn cancel_timer(&mut self, channel: TimerChannel);

    /// Next expired channel, earliest deadline first.
    ///
    /// Returns the channel and the deadline it was armed for; the channel is
    /// disarmed before returning.
    fn poll_timer(&mut self) -> Option<(TimerChannel, Ticks)>;

    /// Start the hardware watchdog. Once started it cannot be stopped.
    ///
    /// # Errors
    /// `Watchdog` if the timeout cannot be represented.
    fn watchdog_start(&mut self, timeout: Ticks) -> Result<(), HalError>;

    /// Reload the hardware watchdog counter.
    fn watchdog_kick(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullHal {
        now: Ticks,
        armed: Option<(TimerChannel, Ticks)>,
    }

    impl Hal for NullHal {
        fn name(&self) -> &'static str {
            "null"
        }
        fn now(&self) -> Ticks {
            self.now
        }
        fn tick_hz(&self) -> u32 {
            1000
        }
        fn configure_pin(&mut self, _pin: PinId, _mode: PinMode) -> Result<(), HalError> {
            Ok(())
        }
        fn read_pin(&self, _pin: PinId) -> bool {
            false
        }
        fn write_pin(&mut self, _pin: PinId, _high: bool) {}
        fn read_adc(&mut self, pin: PinId) -> Result<u16, HalError> {
            Err(HalError::NotAnalog(pin))
        }
        fn arm_timer(&mut self, channel: TimerChannel, deadline: Ticks) {
            self.armed = Some((channel, deadline));
        }
        fn cancel_timer(&mut self, _channel: TimerChannel) {
            self.armed = None;
        }
        fn poll_timer(&mut self) -> Option<(TimerChannel, Ticks)> {
            None
        }
        fn watchdog_start(&mut self, _timeout: Ticks) -> Result<(), HalError> {
            Ok(())
        }
        fn watchdog_kick(&mut self) {}
    }

    #[test]
    fn arm_timer_after_is_relative_to_now() {
        let mut hal = NullHal {
            now: 500,
            armed: None,
        };
        hal.arm_timer_after(TimerChannel::Fan(1), 20);
        assert_eq!(hal.armed, Some((TimerChannel::Fan(1), 520)));
    }

    #[test]
    fn hal_error_display() {
        let err = HalError::NotAnalog(PinId(4));
        assert!(err.to_string().contains("pin4"));
    }
}
