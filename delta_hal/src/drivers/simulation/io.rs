//! Pin bank for the simulation driver.
//!
//! Tracks mode, level, rising edges and accumulated high time per pin so
//! tests can measure step counts and PWM duty without a scope.

use delta_common::hal::driver::HalError;
use delta_common::hal::types::{PinId, PinMode, Ticks};
use std::collections::HashMap;
use tracing::trace;

/// State of one simulated pin.
#[derive(Debug, Clone, Copy)]
struct PinState {
    mode: PinMode,
    level: bool,
    rising_edges: u64,
    /// Ticks spent high, up to `since`.
    high_ticks: Ticks,
    since: Ticks,
}

/// All pins of the simulated board.
#[derive(Debug, Default)]
pub struct PinBank {
    pins: HashMap<PinId, PinState>,
    /// Highest valid pin number.
    pin_limit: u16,
}

impl PinBank {
    pub fn new(pin_limit: u16) -> Self {
        Self {
            pins: HashMap::new(),
            pin_limit,
        }
    }

    /// Claim a pin in `mode`. Re-claiming in the same mode is allowed.
    pub fn configure(&mut self, pin: PinId, mode: PinMode, now: Ticks) -> Result<(), HalError> {
        if pin.0 > self.pin_limit {
            return Err(HalError::UnknownPin(pin));
        }
        match self.pins.get(&pin) {
            Some(state) if state.mode != mode => Err(HalError::PinConflict(pin)),
            Some(_) => Ok(()),
            None => {
                self.pins.insert(
                    pin,
                    PinState {
                        mode,
                        level: mode == PinMode::InputPullUp,
                        rising_edges: 0,
                        high_ticks: 0,
                        since: now,
                    },
                );
                Ok(())
            }
        }
    }

    /// Drive an output. Returns `true` on a rising edge.
    ///
    /// Writes to unconfigured pins are dropped.
    pub fn write(&mut self, pin: PinId, high: bool, now: Ticks) -> bool {
        let Some(state) = self.pins.get_mut(&pin) else {
            trace!(%pin, "write to unconfigured pin ignored");
            return false;
        };
        if state.level {
            state.high_ticks += now.saturating_sub(state.since);
        }
        state.since = now;
        let rising = high && !state.level;
        if rising {
            state.rising_edges += 1;
        }
        state.level = high;
        rising
    }

    pub fn level(&self, pin: PinId) -> bool {
        self.pins.get(&pin).is_some_and(|s| s.level)
    }

    pub fn is_configured(&self, pin: PinId) -> bool {
        self.pins.contains_key(&pin)
    }

    pub fn rising_edges(&self, pin: PinId) -> u64 {
        self.pins.get(&pin).map_or(0, |s| s.rising_edges)
    }

    /// Total ticks the pin has been high up to `now`.
    pub fn high_ticks(&self, pin: PinId, now: Ticks) -> Ticks {
        self.pins.get(&pin).map_or(0, |s| {
            s.high_ticks + if s.level { now.saturating_sub(s.since) } else { 0 }
        })
    }
}
