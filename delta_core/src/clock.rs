//! Time base: conversions between seconds and HAL ticks.

use delta_common::hal::types::Ticks;

/// Clock rate of the HAL timer, shared by every component that schedules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBase {
    tick_hz: f64,
}

impl TimeBase {
    pub fn new(tick_hz: u32) -> Self {
        Self {
            tick_hz: f64::from(tick_hz.max(1)),
        }
    }

    #[inline]
    pub fn tick_hz(&self) -> f64 {
        self.tick_hz
    }

    /// Seconds → ticks, rounded to the nearest tick.
    #[inline]
    pub fn ticks(&self, secs: f64) -> Ticks {
        (secs * self.tick_hz).round().max(0.0) as Ticks
    }

    /// Seconds → fractional ticks.
    #[inline]
    pub fn ticks_f(&self, secs: f64) -> f64 {
        secs * self.tick_hz
    }

    #[inline]
    pub fn secs(&self, ticks: Ticks) -> f64 {
        ticks as f64 / self.tick_hz
    }

    /// Fractional ticks → seconds.
    #[inline]
    pub fn secs_f(&self, ticks: f64) -> f64 {
        ticks / self.tick_hz
    }
}

/// Periodic deadline tracker for loop-side housekeeping.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period: Ticks,
    next: Ticks,
}

impl Interval {
    pub fn new(period: Ticks, now: Ticks) -> Self {
        let period = period.max(1);
        Self {
            period,
            next: now + period,
        }
    }

    /// `true` once per elapsed period. Missed periods are skipped, not
    /// replayed.
    pub fn due(&mut self, now: Ticks) -> bool {
        if now < self.next {
            return false;
        }
        let behind = (now - self.next) / self.period;
        self.next += (behind + 1) * self.period;
        true
    }

    pub fn restart(&mut self, now: Ticks) {
        self.next = now + self.period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let tb = TimeBase::new(1_000_000);
        assert_eq!(tb.ticks(0.2), 200_000);
        assert_eq!(tb.ticks(-1.0), 0);
        assert!((tb.secs(50) - 50e-6).abs() < 1e-15);
        assert_eq!(tb.ticks_f(1.5e-6), 1.5);
    }

    #[test]
    fn interval_skips_missed_periods() {
        let mut iv = Interval::new(100, 0);
        assert!(!iv.due(99));
        assert!(iv.due(100));
        assert!(!iv.due(150));
        assert!(iv.due(450));
        assert!(!iv.due(499));
        assert!(iv.due(500));
    }
}
