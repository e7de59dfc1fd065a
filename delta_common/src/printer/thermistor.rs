//! Beta-model NTC thermistor in a resistor divider.
//!
//! The thermistor sits on the low side of a divider with a fixed resistor
//! `R` to the reference. The ADC fraction is `f = Rt / (R + Rt)` and
//!
//! ```text
//! 1/T = 1/T0 + ln(Rt / R0) / beta        (T in kelvin, T0 = 25 °C)
//! ```

use super::config::ThermistorConfig;
use crate::consts::ADC_FULL_SCALE;

const KELVIN_OFFSET: f64 = 273.15;
const T0_KELVIN: f64 = 25.0 + KELVIN_OFFSET;

/// Converts between raw ADC readings and °C for one thermistor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thermistor {
    resistor_r: f64,
    r0: f64,
    beta: f64,
    min_temp: f64,
    max_temp: f64,
}

impl Thermistor {
    pub fn new(cfg: &ThermistorConfig) -> Self {
        Self {
            resistor_r: cfg.resistor_r,
            r0: cfg.r0,
            beta: cfg.beta,
            min_temp: cfg.min_temp,
            max_temp: cfg.max_temp,
        }
    }

    /// Temperature for a raw ADC value.
    ///
    /// Readings at either rail (open or shorted sensor) yield a non-finite
    /// value; callers treat that as a sensor fault.
    pub fn temp_from_raw(&self, raw: u16) -> f64 {
        if raw == 0 || raw == ADC_FULL_SCALE {
            return f64::NAN;
        }
        let f = f64::from(raw) / f64::from(ADC_FULL_SCALE);
        let rt = self.resistor_r * f / (1.0 - f);
        let inv_t = 1.0 / T0_KELVIN + (rt / self.r0).ln() / self.beta;
        1.0 / inv_t - KELVIN_OFFSET
    }

    /// Raw ADC value for a temperature, clamped to the model's range.
    ///
    /// Used by the simulation driver and tests to synthesize readings.
    pub fn raw_from_temp(&self, temp: f64) -> u16 {
        let t = temp.clamp(self.min_temp, self.max_temp) + KELVIN_OFFSET;
        let rt = self.r0 * (self.beta * (1.0 / t - 1.0 / T0_KELVIN)).exp();
        let f = rt / (self.resistor_r + rt);
        let raw = (f * f64::from(ADC_FULL_SCALE)).round();
        raw.clamp(1.0, f64::from(ADC_FULL_SCALE - 1)) as u16
    }

    /// Temperature range over which the inverse is defined.
    pub fn range(&self) -> (f64, f64) {
        (self.min_temp, self.max_temp)
    }
}
