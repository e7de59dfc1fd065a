//! Temperature stability observer.
//!
//! Samples on its own interval and reports stable once the temperature has
//! stayed within `tolerance` of the target for at least `min_time`. Any
//! sample outside the band restarts the count.

use delta_common::hal::types::Ticks;
use delta_common::printer::config::ObserverConfig;

use crate::clock::{Interval, TimeBase};

#[derive(Debug, Clone)]
pub struct TemperatureObserver {
    interval: Interval,
    tolerance: f64,
    min_time: Ticks,
    in_band_since: Option<Ticks>,
    stable: bool,
}

impl TemperatureObserver {
    pub fn new(config: &ObserverConfig, time: &TimeBase, now: Ticks) -> Self {
        Self {
            interval: Interval::new(time.ticks(config.interval), now),
            tolerance: config.tolerance,
            min_time: time.ticks(config.min_time),
            in_band_since: None,
            stable: false,
        }
    }

    /// Start over, e.g. after a target change.
    pub fn reset(&mut self, now: Ticks) {
        self.interval.restart(now);
        self.in_band_since = None;
        self.stable = false;
    }

    /// Feed the latest temperature. Only acts when the interval is due.
    pub fn poll(&mut self, now: Ticks, temperature: Option<f64>, target: Option<f64>) {
        if !self.interval.due(now) {
            return;
        }
        let in_band = match (temperature, target) {
            (Some(t), Some(target)) => t.is_finite() && (t - target).abs() <= self.tolerance,
            _ => false,
        };
        if in_band {
            let since = *self.in_band_since.get_or_insert(now);
            self.stable = now - since >= self.min_time;
        } else {
            self.in_band_since = None;
            self.stable = false;
        }
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer() -> TemperatureObserver {
        let cfg = ObserverConfig {
            interval: 0.5,
            tolerance: 3.0,
            min_time: 3.0,
        };
        TemperatureObserver::new(&cfg, &TimeBase::new(1_000), 0)
    }

    #[test]
    fn stable_after_min_time_in_band() {
        let mut obs = observer();
        let mut now = 0;
        for _ in 0..7 {
            now += 500;
            obs.poll(now, Some(201.0), Some(200.0));
        }
        // First in-band sample at 500, 3 s later at 3500.
        assert!(obs.is_stable());
        obs.poll(now + 500, Some(210.0), Some(200.0));
        assert!(!obs.is_stable());
    }

    #[test]
    fn not_stable_without_target() {
        let mut obs = observer();
        for k in 1..20 {
            obs.poll(k * 500, Some(25.0), None);
        }
        assert!(!obs.is_stable());
    }

    #[test]
    fn polls_between_intervals_are_ignored() {
        let mut obs = observer();
        obs.poll(100, Some(200.0), Some(200.0));
        obs.poll(400, Some(200.0), Some(200.0));
        obs.poll(500, Some(200.0), Some(200.0));
        obs.poll(3400, Some(200.0), Some(200.0));
        assert!(!obs.is_stable());
        obs.poll(3500, Some(200.0), Some(200.0));
        assert!(obs.is_stable());
    }
}
