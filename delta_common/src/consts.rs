//! Compile-time limits for the delta printer workspace.
//!
//! Runtime capacities come from the configuration table and are validated
//! against these bounds once at startup. Fixed-size buffers in the core are
//! sized from them, so nothing in the loop or in interrupt context allocates.

use static_assertions::const_assert;

/// Maximum number of physical axes (steppers).
pub const MAX_AXES: usize = 8;

/// Maximum number of heaters.
pub const MAX_HEATERS: usize = 4;

/// Maximum number of fans.
pub const MAX_FANS: usize = 4;

/// Upper bound for the configured lookahead window capacity.
pub const MAX_LOOKAHEAD: usize = 64;

/// Upper bound for the per-axis committed step-command buffer.
pub const MAX_STEPPER_BUFFER: usize = 64;

/// Slots in the interrupt → loop event queue.
pub const EVENT_QUEUE_SLOTS: usize = 64;

/// Full-scale value of a raw ADC sample (HAL drivers scale to 16 bits).
pub const ADC_FULL_SCALE: u16 = u16::MAX;

/// Number of delta towers.
pub const DELTA_TOWERS: usize = 3;

/// Default clock tick rate [Hz].
pub const DEFAULT_TICK_HZ: u32 = 1_000_000;

const_assert!(MAX_AXES >= DELTA_TOWERS);
const_assert!(MAX_AXES <= u8::MAX as usize);
const_assert!(MAX_HEATERS <= u8::MAX as usize);
