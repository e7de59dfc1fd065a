//! Thermal safety envelope through the full interrupt and loop path.

use delta_common::hal::types::TimerChannel;
use delta_common::printer::config::{ControlMode, PrinterConfig};
use delta_common::printer::motion::{EnqueueResult, MoveSegment, RejectReason};
use delta_common::printer::safety::{EmergencyReason, SafetyStatus};
use delta_core::Printer;
use delta_core::error::{CommandError, CoreError};
use delta_hal::SimHal;

use super::{printer, printer_with};

#[test]
fn overheat_trips_emergency_within_one_control_interval() {
    let mut p = printer();
    p.set_heater_target(0, 200.0).unwrap();
    p.run_for(0.5);
    assert_eq!(p.query_safety_status(), SafetyStatus::Normal);

    p.hal_mut().plant_mut(0).unwrap().set_temperature(290.0);
    p.run_for(0.2);

    assert_eq!(
        p.query_safety_status(),
        SafetyStatus::Emergency(EmergencyReason::HeaterTooHot { heater: 0 })
    );
    let state = p.heater_state(0).unwrap();
    assert_eq!(state.duty, 0.0);
    assert!(!state.output_active);
    assert!(!p.hal().plant(0).unwrap().is_heating());
    assert!(state.safety.is_emergency());
}

#[test]
fn emergency_forces_every_output_off_and_stays_latched() {
    let mut p = printer();
    p.set_fan_speed(0, 255.0).unwrap();
    let seg = MoveSegment::new(600.0).with_axis(3, 5.0);
    assert!(p.enqueue_segment(&seg).is_accepted());
    p.flush();
    p.run_for(0.05);
    assert!(!p.is_idle());

    p.hal_mut().plant_mut(0).unwrap().set_adc_override(Some(u16::MAX));
    p.run_for(0.25);

    assert_eq!(
        p.query_safety_status(),
        SafetyStatus::Emergency(EmergencyReason::SensorFault { heater: 0 })
    );
    assert_eq!(p.fan_duty(0), Some(0.0));
    assert!(p.is_idle());
    assert!(!p.axis_state(3).unwrap().enabled);
    assert!(!p.hal().axis(3).unwrap().is_enabled());
    assert!(!p.hal().is_armed(TimerChannel::Axis(3)));
    assert!(!p.hal().is_armed(TimerChannel::Event));

    // A later overheat does not replace the first reason.
    p.hal_mut().plant_mut(0).unwrap().set_adc_override(None);
    p.hal_mut().plant_mut(0).unwrap().set_temperature(295.0);
    p.run_for(0.5);
    assert_eq!(
        p.query_safety_status(),
        SafetyStatus::Emergency(EmergencyReason::SensorFault { heater: 0 })
    );
    assert_eq!(
        p.enqueue_segment(&seg),
        EnqueueResult::Rejected(RejectReason::Emergency)
    );
    assert_eq!(p.set_fan_speed(0, 10.0), Err(CommandError::Emergency));
    assert_eq!(p.start_homing_all(), Err(CommandError::Emergency));
}

#[test]
fn cold_sensor_trips_even_when_idle() {
    let mut p = printer();
    p.hal_mut().plant_mut(0).unwrap().set_temperature(12.0);
    p.run_for(0.4);
    assert_eq!(
        p.query_safety_status(),
        SafetyStatus::Emergency(EmergencyReason::HeaterTooCold { heater: 0 })
    );
    assert!(p.set_heater_target(0, 180.0).is_err());
}

#[test]
fn misaligned_control_interval_is_refused() {
    let mut cfg = PrinterConfig::builtin().unwrap();
    cfg.heaters[0].pulse_interval = 0.15;
    cfg.heaters[0].control_interval = 0.2;
    let hal = SimHal::from_config(&cfg);
    assert!(matches!(Printer::new(hal, cfg), Err(CoreError::Config(_))));
}

#[test]
fn fast_pwm_still_samples_every_control_interval() {
    let mut cfg = PrinterConfig::builtin().unwrap();
    cfg.heaters[0].pulse_interval = 0.05;
    let mut p = printer_with(cfg);
    p.set_heater_target(0, 200.0).unwrap();
    p.run_for(0.601);
    assert_eq!(p.query_safety_status(), SafetyStatus::Normal);

    p.hal_mut().plant_mut(0).unwrap().set_temperature(290.0);
    p.run_for(0.2);
    assert_eq!(
        p.query_safety_status(),
        SafetyStatus::Emergency(EmergencyReason::HeaterTooHot { heater: 0 })
    );
}

#[test]
fn bang_bang_heater_reaches_target_and_reports_stable() {
    let mut cfg = PrinterConfig::builtin().unwrap();
    cfg.heaters[0].control = ControlMode::BangBang;
    cfg.heaters[0].hysteresis = 1.0;
    let mut p = printer_with(cfg);
    p.hal_mut().plant_mut(0).unwrap().set_dynamics(5.0, 0.01);
    p.set_heater_target(0, 150.0).unwrap();
    assert_eq!(p.query_heater_stable(0), Ok(false));

    let stable = p.run_until(120.0, |p| p.query_heater_stable(0) == Ok(true));
    assert!(stable, "heater never settled: {:?}", p.heater_state(0));
    let temp = p.heater_state(0).unwrap().temperature.unwrap();
    assert!((temp - 150.0).abs() <= 3.0, "settled at {temp}");
    assert_eq!(p.query_safety_status(), SafetyStatus::Normal);
}

#[test]
fn target_outside_safe_range_is_refused() {
    let mut p = printer();
    assert!(matches!(
        p.set_heater_target(0, 300.0),
        Err(CommandError::TargetOutOfRange { .. })
    ));
    p.set_heater_target(0, 0.0).unwrap();
    assert_eq!(p.heater_state(0).unwrap().target, None);
}
