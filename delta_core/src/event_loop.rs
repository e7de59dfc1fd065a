//! Cooperative loop driver and its statistics.
//!
//! On hardware the loop simply calls [`Printer::run_once`] forever while
//! timer interrupts preempt it. With the simulated HAL nothing preempts, so
//! the driver advances simulated time in small slices and lets each
//! iteration service whatever timers fell due.

use core::sync::atomic::{AtomicBool, Ordering};

use delta_hal::SimHal;
use tracing::debug;

use crate::printer::Printer;

/// Default simulated slice per loop iteration [s].
pub const DEFAULT_SLICE: f64 = 0.001;

/// Loop iteration counters. O(1) to update, no allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    /// Timer handlers run.
    pub timer_fires: u64,
    /// Events drained.
    pub events: u64,
    pub max_fires_per_iteration: usize,
    pub max_events_per_iteration: usize,
}

impl LoopStats {
    #[inline]
    pub fn record(&mut self, fired: usize, events: usize) {
        self.iterations += 1;
        self.timer_fires += fired as u64;
        self.events += events as u64;
        self.max_fires_per_iteration = self.max_fires_per_iteration.max(fired);
        self.max_events_per_iteration = self.max_events_per_iteration.max(events);
    }
}

impl Printer<SimHal> {
    /// Run the loop for `secs` of simulated time.
    pub fn run_for(&mut self, secs: f64) {
        let slice = self.time().ticks(DEFAULT_SLICE).max(1);
        let end = self.hal().horizon() + self.time().ticks(secs);
        while self.hal().horizon() < end {
            let step = slice.min(end - self.hal().horizon());
            self.hal_mut().advance(step);
            self.run_once();
        }
    }

    /// Run until `done` holds or `timeout` seconds pass. Returns whether
    /// `done` was reached.
    pub fn run_until(&mut self, timeout: f64, mut done: impl FnMut(&Self) -> bool) -> bool {
        let slice = self.time().ticks(DEFAULT_SLICE).max(1);
        let end = self.hal().horizon() + self.time().ticks(timeout);
        while self.hal().horizon() < end {
            if done(self) {
                return true;
            }
            self.hal_mut().advance(slice);
            self.run_once();
        }
        done(self)
    }
}

/// Drive a simulated printer until `duration` elapses or `running` clears.
pub fn run_simulated(printer: &mut Printer<SimHal>, duration: f64, running: &AtomicBool) -> LoopStats {
    let slice = printer.time().ticks(DEFAULT_SLICE).max(1);
    let end = printer.hal().horizon() + printer.time().ticks(duration);
    while running.load(Ordering::Relaxed) && printer.hal().horizon() < end {
        printer.hal_mut().advance(slice);
        printer.run_once();
    }
    let stats = *printer.loop_stats();
    debug!(iterations = stats.iterations, fires = stats.timer_fires, "simulation stopped");
    stats
}
