//! Configuration loading for the firmware core.
//!
//! The parameter table itself and its structural validation live in
//! `delta_common`; this module adds the checks that depend on how the core
//! schedules work (tick rate versus step rate, per-segment stepper buffer
//! demand, heater sampling on PWM period starts) and reports where the
//! table came from.

use std::path::{Path, PathBuf};

use delta_common::config::{ConfigError, ConfigLoader};
use delta_common::printer::config::PrinterConfig;

use crate::clock::TimeBase;

/// Stepper buffer slots one committed segment may need per axis.
const SEGMENT_PHASES: usize = 3;

/// Where a configuration table was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Builtin,
    Inline,
}

/// A validated table ready for [`Printer::new`](crate::printer::Printer::new).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub printer: PrinterConfig,
    pub source: ConfigSource,
}

/// Load and validate a TOML parameter table.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let printer = PrinterConfig::load(path)?;
    validate_runtime(&printer)?;
    Ok(LoadedConfig {
        printer,
        source: ConfigSource::File(path.to_path_buf()),
    })
}

/// Load from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigError> {
    let printer = PrinterConfig::load_str(content)?;
    validate_runtime(&printer)?;
    Ok(LoadedConfig {
        printer,
        source: ConfigSource::Inline,
    })
}

/// The reference table compiled into the binary.
pub fn load_builtin() -> Result<LoadedConfig, ConfigError> {
    let printer = PrinterConfig::builtin()?;
    validate_runtime(&printer)?;
    Ok(LoadedConfig {
        printer,
        source: ConfigSource::Builtin,
    })
}

// ─── Scheduling checks ──────────────────────────────────────────────

/// Checks that only make sense for this core's timing model.
pub fn validate_runtime(config: &PrinterConfig) -> Result<(), ConfigError> {
    let tick_hz = f64::from(config.clock.tick_hz);
    let time = TimeBase::new(config.clock.tick_hz);
    // Each step needs its own timer firing, at least two ticks apart.
    if config.planner.max_step_rate * 2.0 > tick_hz {
        return Err(ConfigError::ValidationError(format!(
            "max_step_rate {} too high for a {} Hz timer",
            config.planner.max_step_rate, config.clock.tick_hz
        )));
    }
    if config.planner.stepper_buffer_size < SEGMENT_PHASES {
        return Err(ConfigError::ValidationError(format!(
            "stepper_buffer_size {} cannot hold one segment ({SEGMENT_PHASES} phases)",
            config.planner.stepper_buffer_size
        )));
    }
    for heater in &config.heaters {
        if heater.control_interval < heater.pulse_interval {
            return Err(ConfigError::ValidationError(format!(
                "heater {}: control_interval shorter than pulse_interval",
                heater.name
            )));
        }
        // Samples are taken on PWM period starts only.
        let pulse = time.ticks(heater.pulse_interval).max(1);
        if time.ticks(heater.control_interval) % pulse != 0 {
            return Err(ConfigError::ValidationError(format!(
                "heater {}: control_interval {} is not a whole number of pulse_interval {}",
                heater.name, heater.control_interval, heater.pulse_interval
            )));
        }
    }
    if let Some(delta) = &config.delta {
        if delta.diagonal_rod <= delta.tower_radius() {
            return Err(ConfigError::ValidationError(
                "delta.diagonal_rod must exceed the tower radius".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = include_str!("../../delta_common/config/printer.toml");

    #[test]
    fn builtin_table_passes() {
        let loaded = load_builtin().unwrap();
        assert_eq!(loaded.source, ConfigSource::Builtin);
        assert_eq!(loaded.printer.axes.len(), 4);
    }

    #[test]
    fn load_from_file_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printer.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(TABLE.as_bytes())
            .unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.source, ConfigSource::File(path));
    }

    #[test]
    fn step_rate_must_fit_tick_rate() {
        let table = TABLE.replace("tick_hz = 1000000", "tick_hz = 100000");
        let err = load_config_from_str(&table).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(m) if m.contains("max_step_rate")));
    }

    #[test]
    fn stepper_buffer_must_hold_a_segment() {
        let mut cfg = PrinterConfig::builtin().unwrap();
        cfg.planner.stepper_buffer_size = 2;
        assert!(validate_runtime(&cfg).is_err());
    }

    #[test]
    fn control_interval_must_align_with_pwm_periods() {
        let mut cfg = PrinterConfig::builtin().unwrap();
        cfg.heaters[0].pulse_interval = 0.15;
        cfg.heaters[0].control_interval = 0.2;
        assert!(matches!(
            validate_runtime(&cfg),
            Err(ConfigError::ValidationError(_))
        ));
        cfg.heaters[0].pulse_interval = 0.1;
        assert!(validate_runtime(&cfg).is_ok());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_config(Path::new("/nonexistent/printer.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound));
    }
}
