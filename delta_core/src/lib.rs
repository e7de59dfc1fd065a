//! # Delta Printer Core
//!
//! Real-time firmware core for a linear-delta 3D printer. A single
//! cooperative loop owns all state; timer interrupts generate step pulses
//! and heater PWM edges and hand results back through a bounded event queue.
//!
//! ## Layers
//!
//! 1. **Motion**: look-ahead [`Planner`](motion::Planner), per-axis
//!    [`AxisStepper`](motion::AxisStepper), [`DeltaTransform`](motion::DeltaTransform)
//! 2. **Thermal**: [`Heater`](thermal::Heater) control loops, software PWM, fans
//! 3. **Homing**: per-axis [`HomingSupervisor`](homing::HomingSupervisor)
//! 4. **Safety**: [`EmergencyFlag`](safety::EmergencyFlag) and the hardware watchdog
//!
//! [`Printer`](printer::Printer) ties these together behind the command
//! surface; [`event_loop`] drives it against the simulated HAL.
//!
//! ## No allocation after start-up
//!
//! Queues, stepper buffers and per-axis state are fixed-capacity
//! `heapless` containers sized at construction.

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod event_loop;
pub mod homing;
pub mod motion;
pub mod printer;
pub mod safety;
pub mod thermal;

pub use printer::Printer;
