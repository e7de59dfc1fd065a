//! Homing supervision.
//!
//! Each homed axis runs three constant-speed moves on its stepper:
//!
//! | Phase        | Direction       | Distance        | Ends when                   |
//! |--------------|-----------------|-----------------|-----------------------------|
//! | FastApproach | toward end-stop | `fast_max_dist` | end-stop trips → Retract    |
//! | Retract      | away            | `retract_dist`  | distance covered → Slow     |
//! | SlowApproach | toward end-stop | `slow_max_dist` | end-stop trips → Done       |
//!
//! Running out of distance in either approach ends in `Failed` and leaves
//! the axis unhomed. The supervisor only decides; the caller owns the
//! stepper and feeds back [`on_endstop`](HomingSupervisor::on_endstop) and
//! [`on_idle`](HomingSupervisor::on_idle).

use delta_common::printer::config::{AxisConfig, AxisHomingConfig};
use delta_common::printer::homing::{HomeDirection, HomingFailure, HomingPhase};

// ─── Actions ────────────────────────────────────────────────────────

/// Constant-speed run requested by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingMove {
    pub positive: bool,
    pub steps: u32,
    /// [steps/s]
    pub rate: f64,
    /// Stop at the end-stop.
    pub endstop_check: bool,
}

/// What the caller must do next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HomingAction {
    Move(HomingMove),
    /// Homing succeeded; set the axis to `position`.
    Done { position: f64 },
    Failed(HomingFailure),
    /// Event not relevant to the current phase.
    None,
}

// ─── Supervisor ─────────────────────────────────────────────────────

/// Per-axis homing state machine.
#[derive(Debug, Clone)]
pub struct HomingSupervisor {
    phase: HomingPhase,
    config: AxisHomingConfig,
    steps_per_unit: f64,
    home_position: f64,
    last_failure: Option<HomingFailure>,
}

impl HomingSupervisor {
    /// `None` for axes without an end-stop.
    pub fn new(axis: &AxisConfig) -> Option<Self> {
        let config = axis.homing.clone()?;
        let home_position = axis.home_position()?;
        Some(Self {
            phase: HomingPhase::Idle,
            config,
            steps_per_unit: axis.steps_per_unit,
            home_position,
            last_failure: None,
        })
    }

    #[inline]
    pub fn phase(&self) -> HomingPhase {
        self.phase
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    pub fn last_failure(&self) -> Option<HomingFailure> {
        self.last_failure
    }

    fn motion(&self, direction: HomeDirection, dist: f64, speed: f64, check: bool) -> HomingMove {
        let steps = (dist * self.steps_per_unit).ceil().max(1.0);
        HomingMove {
            positive: direction == HomeDirection::Positive,
            steps: steps.min(f64::from(u32::MAX)) as u32,
            rate: speed * self.steps_per_unit,
            endstop_check: check,
        }
    }

    /// Begin the sequence with the fast approach.
    pub fn start(&mut self) -> HomingAction {
        self.phase = HomingPhase::FastApproach;
        self.last_failure = None;
        HomingAction::Move(self.motion(
            self.config.direction,
            self.config.fast_max_dist,
            self.config.fast_speed,
            true,
        ))
    }

    /// The stepper stopped on the end-stop.
    pub fn on_endstop(&mut self) -> HomingAction {
        match self.phase {
            HomingPhase::FastApproach => {
                self.phase = HomingPhase::Retract;
                HomingAction::Move(self.motion(
                    self.config.direction.reversed(),
                    self.config.retract_dist,
                    self.config.retract_speed,
                    false,
                ))
            }
            HomingPhase::SlowApproach => {
                self.phase = HomingPhase::Done;
                HomingAction::Done {
                    position: self.home_position,
                }
            }
            _ => HomingAction::None,
        }
    }

    /// The stepper ran out of steps without an end-stop trigger.
    pub fn on_idle(&mut self) -> HomingAction {
        match self.phase {
            HomingPhase::FastApproach => self.fail(HomingFailure::FastApproachExhausted),
            HomingPhase::Retract => {
                self.phase = HomingPhase::SlowApproach;
                HomingAction::Move(self.motion(
                    self.config.direction,
                    self.config.slow_max_dist,
                    self.config.slow_speed,
                    true,
                ))
            }
            HomingPhase::SlowApproach => self.fail(HomingFailure::SlowApproachExhausted),
            _ => HomingAction::None,
        }
    }

    /// Stop an active sequence. Idle, done or failed sequences are left
    /// as they are.
    pub fn abort(&mut self, reason: HomingFailure) -> HomingAction {
        if self.is_active() {
            self.fail(reason)
        } else {
            HomingAction::None
        }
    }

    fn fail(&mut self, reason: HomingFailure) -> HomingAction {
        self.phase = HomingPhase::Failed;
        self.last_failure = Some(reason);
        HomingAction::Failed(reason)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
