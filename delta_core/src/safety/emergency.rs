//! Global emergency flag.
//!
//! Written from interrupt context (heater envelope) and from the loop
//! (external stop). Transitions only from clear to tripped; the first reason
//! recorded wins. There is no way to clear it short of a full reset.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use delta_common::printer::safety::{EmergencyReason, SafetyStatus};

/// One-way kill switch shared by every handler.
#[derive(Debug, Default)]
pub struct EmergencyFlag {
    tripped: AtomicBool,
    reason: AtomicU16,
}

impl EmergencyFlag {
    pub const fn new() -> Self {
        Self {
            tripped: AtomicBool::new(false),
            reason: AtomicU16::new(0),
        }
    }

    /// Raise the flag. Returns `true` if this call was the first.
    pub fn trip(&self, reason: EmergencyReason) -> bool {
        let first = self
            .reason
            .compare_exchange(0, reason.to_code(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.tripped.store(true, Ordering::Release);
        first
    }

    #[inline]
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<EmergencyReason> {
        EmergencyReason::from_code(self.reason.load(Ordering::Acquire))
    }

    pub fn status(&self) -> SafetyStatus {
        match (self.is_tripped(), self.reason()) {
            (true, Some(reason)) => SafetyStatus::Emergency(reason),
            (true, None) => SafetyStatus::Emergency(EmergencyReason::External),
            (false, _) => SafetyStatus::Normal,
        }
    }
}
