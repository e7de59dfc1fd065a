//! First-order thermal plant behind a heater output.
//!
//! `dT/dt = heat_rate * on - loss * (T - ambient)`, integrated exactly over
//! each interval during which the output level is constant.

use delta_common::printer::config::HeaterConfig;
use delta_common::printer::thermistor::Thermistor;

/// Default ambient temperature [°C].
pub const AMBIENT_TEMP: f64 = 25.0;

/// Simulated hot-end or bed.
#[derive(Debug, Clone)]
pub struct ThermalPlant {
    thermistor: Thermistor,
    output_invert: bool,
    temperature: f64,
    ambient: f64,
    /// Heating rate at full power [°C/s].
    heat_rate: f64,
    /// Loss coefficient [1/s].
    loss: f64,
    output_level: bool,
    /// Forced raw ADC value (sensor fault injection).
    adc_override: Option<u16>,
}

impl ThermalPlant {
    pub fn new(config: &HeaterConfig) -> Self {
        Self {
            thermistor: Thermistor::new(&config.thermistor),
            output_invert: config.output_invert,
            temperature: AMBIENT_TEMP,
            ambient: AMBIENT_TEMP,
            heat_rate: 4.0,
            loss: 0.01,
            output_level: config.output_invert,
            adc_override: None,
        }
    }

    /// Override heating and loss constants.
    pub fn set_dynamics(&mut self, heat_rate: f64, loss: f64) {
        self.heat_rate = heat_rate;
        self.loss = loss;
    }

    pub fn is_heating(&self) -> bool {
        self.output_level != self.output_invert
    }

    pub fn set_output_level(&mut self, high: bool) {
        self.output_level = high;
    }

    /// Advance the plant by `dt` seconds at the current output level.
    pub fn integrate(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let power = if self.is_heating() { self.heat_rate } else { 0.0 };
        if self.loss > 0.0 {
            let steady = self.ambient + power / self.loss;
            self.temperature = steady + (self.temperature - steady) * (-self.loss * dt).exp();
        } else {
            self.temperature += power * dt;
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temp: f64) {
        self.temperature = temp;
    }

    pub fn set_adc_override(&mut self, raw: Option<u16>) {
        self.adc_override = raw;
    }

    /// Raw ADC sample for the current temperature.
    pub fn adc(&self) -> u16 {
        self.adc_override
            .unwrap_or_else(|| self.thermistor.raw_from_temp(self.temperature))
    }
}
