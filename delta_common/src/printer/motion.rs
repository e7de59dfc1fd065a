//! Move requests and planner admission results.

use crate::consts::MAX_AXES;
use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Per-segment flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SegmentFlags: u8 {
        /// Generated by the homing sequence.
        const HOMING  = 0b0000_0001;
        /// Sub-segment of a Cartesian move produced by the delta transform.
        const VIRTUAL = 0b0000_0010;
    }
}

/// One planned move in physical axis space.
///
/// `target[i] == None` leaves axis `i` where the previous segment ends.
/// Immutable once enqueued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveSegment {
    /// Absolute target per axis, in axis units.
    pub target: [Option<f64>; MAX_AXES],
    /// Requested feed rate in the caller's units (scaled by
    /// `speed_limit_multiply` before planning).
    pub feedrate: f64,
    pub flags: SegmentFlags,
}

impl MoveSegment {
    /// Segment that moves no axis yet.
    pub const fn new(feedrate: f64) -> Self {
        Self {
            target: [None; MAX_AXES],
            feedrate,
            flags: SegmentFlags::empty(),
        }
    }

    /// Set the target of one axis. Indices past `MAX_AXES` are ignored.
    #[must_use]
    pub fn with_axis(mut self, axis: usize, position: f64) -> Self {
        if let Some(slot) = self.target.get_mut(axis) {
            *slot = Some(position);
        }
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: SegmentFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Iterator over `(axis, target)` for axes this segment names.
    pub fn axes(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.target
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|v| (i, v)))
    }
}

/// Move expressed in virtual Cartesian space for the delta transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianMove {
    /// Target X, Y, Z of the effector.
    pub target: [f64; 3],
    /// Targets for non-tower axes (e.g. the extruder), interpolated along
    /// the split.
    pub passthrough: [Option<f64>; MAX_AXES],
    /// Requested Cartesian feed rate.
    pub feedrate: f64,
}

impl CartesianMove {
    pub const fn new(x: f64, y: f64, z: f64, feedrate: f64) -> Self {
        Self {
            target: [x, y, z],
            passthrough: [None; MAX_AXES],
            feedrate,
        }
    }

    #[must_use]
    pub fn with_axis(mut self, axis: usize, position: f64) -> Self {
        if let Some(slot) = self.passthrough.get_mut(axis) {
            *slot = Some(position);
        }
        self
    }
}

/// Why a move was refused at admission.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RejectReason {
    #[error("axis {axis} target {target} outside [{min}, {max}]")]
    OutOfBounds {
        axis: usize,
        target: f64,
        min: f64,
        max: f64,
    },
    #[error("axis {axis} is not homed")]
    NotHomed { axis: usize },
    #[error("axis index {axis} not configured")]
    UnknownAxis { axis: usize },
    #[error("Cartesian target not reachable by the delta arms")]
    Unreachable,
    #[error("no delta transform configured")]
    NoTransform,
    #[error("feed rate must be finite and positive")]
    InvalidFeedrate,
    #[error("emergency shutdown active")]
    Emergency,
}

/// Outcome of `enqueue_segment` / `enqueue_cartesian`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnqueueResult {
    /// Segment buffered.
    Accepted,
    /// Segment refused; nothing was buffered.
    Rejected(RejectReason),
    /// No room; retry after the window drains.
    Full,
}

impl EnqueueResult {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_builder_names_axes() {
        let seg = MoveSegment::new(600.0)
            .with_axis(0, 10.0)
            .with_axis(3, 2.5)
            .with_axis(MAX_AXES + 4, 1.0)
            .with_flags(SegmentFlags::VIRTUAL);
        let named: Vec<_> = seg.axes().collect();
        assert_eq!(named, vec![(0, 10.0), (3, 2.5)]);
        assert!(seg.flags.contains(SegmentFlags::VIRTUAL));
        assert!(!seg.flags.contains(SegmentFlags::HOMING));
    }

    #[test]
    fn reject_reason_messages() {
        let r = RejectReason::OutOfBounds {
            axis: 1,
            target: 400.0,
            min: 0.0,
            max: 360.0,
        };
        assert!(r.to_string().contains("400"));
        assert!(!EnqueueResult::Rejected(r).is_accepted());
        assert!(EnqueueResult::Accepted.is_accepted());
    }
}
