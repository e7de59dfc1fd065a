//! Hardware watchdog supervision.
//!
//! The loop kicks the hardware watchdog once per iteration. If an iteration
//! hangs past the timeout the hardware resets the machine; software cannot
//! intervene.

use delta_common::hal::driver::{Hal, HalError};
use delta_common::hal::types::Ticks;
use tracing::info;

/// Starts the hardware watchdog and tracks kicks.
#[derive(Debug)]
pub struct WatchdogSupervisor {
    timeout: Ticks,
    last_kick: Ticks,
    kicks: u64,
    /// Longest gap between two kicks seen so far.
    max_gap: Ticks,
}

impl WatchdogSupervisor {
    /// Start the hardware watchdog with `timeout` ticks.
    pub fn start<H: Hal>(hal: &mut H, timeout: Ticks) -> Result<Self, HalError> {
        hal.watchdog_start(timeout)?;
        info!(timeout, "watchdog armed");
        Ok(Self {
            timeout,
            last_kick: hal.now(),
            kicks: 0,
            max_gap: 0,
        })
    }

    #[inline]
    pub fn kick<H: Hal>(&mut self, hal: &mut H) {
        let now = hal.now();
        self.max_gap = self.max_gap.max(now.saturating_sub(self.last_kick));
        self.last_kick = now;
        self.kicks += 1;
        hal.watchdog_kick();
    }

    pub fn timeout(&self) -> Ticks {
        self.timeout
    }

    pub fn kicks(&self) -> u64 {
        self.kicks
    }

    pub fn max_gap(&self) -> Ticks {
        self.max_gap
    }

    /// Ticks left before the hardware deadline.
    pub fn remaining(&self, now: Ticks) -> Ticks {
        (self.last_kick + self.timeout).saturating_sub(now)
    }
}
