//! Delta Printer Common Library
//!
//! Shared types for every crate of the delta printer workspace: the
//! configuration table and its loader, move/segment types, safety and homing
//! enums, the thermistor model, and the hardware abstraction contract.
//!
//! # Module Structure
//!
//! - [`config`] - Generic TOML loading and the shared config block
//! - [`consts`] - Compile-time capacity limits
//! - [`hal`] - Hardware abstraction trait (`Hal`) and its value types
//! - [`printer`] - Printer parameter table, segments, safety, homing, thermistor
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use delta_common::prelude::*;
//!
//! let config = PrinterConfig::builtin().expect("reference table parses");
//! assert_eq!(config.axes.len(), 4);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod printer;
