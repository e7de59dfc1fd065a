//! Printer table loading tests.
//!
//! File-based loading through `ConfigLoader`, the shipped reference table,
//! a second heater (bed) and the cross-section validation rules.

use delta_common::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REFERENCE: &str = include_str!("../config/printer.toml");

const BED_HEATER: &str = r#"
[[heaters]]
name = "B"
adc_pin = 20
output_pin = 21
output_invert = true
min_safe_temp = 20.0
max_safe_temp = 120.0
pulse_interval = 0.3
control_interval = 0.3
control = "pid"

[heaters.thermistor]
resistor_r = 4700.0
r0 = 10000.0
beta = 3480.0
min_temp = 10.0
max_temp = 150.0

[heaters.pid]
p = 1.0
i = 0.012
d = 2.5
i_state_min = 0.0
i_state_max = 1.0
d_history = 0.8

[heaters.observer]
interval = 0.5
tolerance = 1.5
min_time = 3.0
"#;

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn reference_table_loads_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "printer.toml", REFERENCE);
    let cfg = PrinterConfig::load(&path).unwrap();
    assert_eq!(cfg.shared.machine_name, "teensy3-delta");
    assert_eq!(cfg.machine.led_pin, Some(PinId(13)));
    assert_eq!(cfg.heaters.len(), 1);
    assert_eq!(cfg.fans.len(), 1);
    assert!((cfg.fans[0].speed_multiply * 255.0 - 1.0).abs() < 1e-12);
}

#[test]
fn bed_heater_is_expressible() {
    let dir = TempDir::new().unwrap();
    let body = format!("{REFERENCE}\n{BED_HEATER}");
    let cfg = PrinterConfig::load(&write(dir.path(), "printer.toml", &body)).unwrap();
    assert_eq!(cfg.heaters.len(), 2);
    let bed = &cfg.heaters[cfg.heater_index("B").unwrap()];
    assert_eq!(bed.max_safe_temp, 120.0);
    assert_eq!(bed.pid.d_history, 0.8);
}

#[test]
fn bang_bang_mode_parses() {
    let body = REFERENCE.replace("control = \"pid\"", "control = \"bang_bang\"\nhysteresis = 4.0");
    let cfg = PrinterConfig::load_str(&body).unwrap();
    assert_eq!(cfg.heaters[0].control, ControlMode::BangBang);
    assert_eq!(cfg.heaters[0].hysteresis, 4.0);
}

#[test]
fn unknown_control_mode_is_parse_error() {
    let body = REFERENCE.replace("control = \"pid\"", "control = \"fuzzy\"");
    assert!(matches!(
        PrinterConfig::load_str(&body),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn duplicate_heater_name_is_validation_error() {
    let body = format!("{REFERENCE}\n{}", BED_HEATER.replace("name = \"B\"", "name = \"T\""));
    assert!(matches!(
        PrinterConfig::load_str(&body),
        Err(ConfigError::ValidationError(msg)) if msg.contains("duplicate heater")
    ));
}

#[test]
fn safe_range_must_be_ordered() {
    let body = REFERENCE.replace("max_safe_temp = 280.0", "max_safe_temp = 10.0");
    assert!(matches!(
        PrinterConfig::load_str(&body),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn lookahead_capacity_bounded_by_compile_time_limit() {
    let body = REFERENCE.replace(
        "lookahead_capacity = 28",
        &format!("lookahead_capacity = {}", MAX_LOOKAHEAD + 1),
    );
    assert!(PrinterConfig::load_str(&body).is_err());
}

#[test]
fn missing_file_reports_not_found() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        PrinterConfig::load(&dir.path().join("absent.toml")),
        Err(ConfigError::FileNotFound)
    ));
}
