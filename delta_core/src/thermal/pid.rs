//! PID temperature control with clamped integral state and an
//! exponentially smoothed derivative.
//!
//! The integral accumulates in output units and is clamped to
//! `[i_state_min, i_state_max]` every step. The derivative acts on the
//! measurement, not the error, so target changes do not kick the output:
//!
//! ```text
//! d_k = h·d_{k-1} + (1 − h)·D·(T_{k-1} − T_k)/dt
//! ```

use delta_common::printer::config::PidParams;

/// Internal state of the controller.
///
/// Reset whenever the target changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PidState {
    integral: f64,
    /// Previous measurement; `None` until the first sample.
    last: Option<f64>,
    derivative: f64,
}

impl PidState {
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

/// Compute one control step. Returns duty in `[0, 1]`.
#[inline]
pub fn pid_compute(state: &mut PidState, gains: &PidParams, target: f64, value: f64, dt: f64) -> f64 {
    if dt <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    let error = target - value;

    // ── I term (clamped) ────────────────────────────────────
    state.integral =
        (state.integral + gains.i * error * dt).clamp(gains.i_state_min, gains.i_state_max);

    // ── D term (smoothed) ───────────────────────────────────
    state.derivative = match state.last {
        Some(last) => {
            let raw = gains.d * (last - value) / dt;
            gains.d_history * state.derivative + (1.0 - gains.d_history) * raw
        }
        None => 0.0,
    };
    state.last = Some(value);

    (gains.p * error + state.integral + state.derivative).clamp(0.0, 1.0)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f64 = 0.2;

    fn extruder() -> PidParams {
        PidParams {
            p: 0.047,
            i: 0.0006,
            d: 0.17,
            i_state_min: 0.0,
            i_state_max: 0.4,
            d_history: 0.7,
        }
    }

    #[test]
    fn proportional_only_first_step() {
        let mut s = PidState::default();
        let g = PidParams {
            i: 0.0,
            d: 0.0,
            ..extruder()
        };
        let out = pid_compute(&mut s, &g, 200.0, 190.0, DT);
        assert!((out - 0.47).abs() < 1e-12);
    }

    #[test]
    fn output_saturates() {
        let mut s = PidState::default();
        assert_eq!(pid_compute(&mut s, &extruder(), 220.0, 25.0, DT), 1.0);
        let mut s = PidState::default();
        assert_eq!(pid_compute(&mut s, &extruder(), 25.0, 220.0, DT), 0.0);
    }

    #[test]
    fn integral_accumulates_and_clamps() {
        let mut s = PidState::default();
        let g = extruder();
        pid_compute(&mut s, &g, 200.0, 190.0, DT);
        assert!((s.integral() - 0.0006 * 10.0 * DT).abs() < 1e-12);
        for _ in 0..100_000 {
            pid_compute(&mut s, &g, 200.0, 25.0, DT);
        }
        assert_eq!(s.integral(), 0.4);
    }

    #[test]
    fn derivative_opposes_rising_temperature() {
        let g = PidParams {
            p: 0.0,
            i: 0.0,
            d: 1.0,
            d_history: 0.0,
            ..extruder()
        };
        let mut s = PidState::default();
        pid_compute(&mut s, &g, 200.0, 100.0, DT);
        // Falling measurement pushes output up.
        let out = pid_compute(&mut s, &g, 200.0, 99.9, DT);
        assert!((out - 0.5).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_state() {
        let mut s = PidState::default();
        pid_compute(&mut s, &extruder(), 200.0, 150.0, DT);
        s.reset();
        assert_eq!(s.integral(), 0.0);
    }

    proptest! {
        #[test]
        fn integral_stays_within_clamp(
            samples in prop::collection::vec(-50.0f64..400.0, 1..200),
            target in 0.0f64..300.0,
        ) {
            let g = extruder();
            let mut s = PidState::default();
            for v in samples {
                let out = pid_compute(&mut s, &g, target, v, DT);
                prop_assert!((0.0..=1.0).contains(&out));
                prop_assert!(s.integral() >= g.i_state_min && s.integral() <= g.i_state_max);
            }
        }
    }
}
