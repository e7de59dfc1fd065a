//! Motion: look-ahead planning, step generation and the delta transform.

pub mod delta;
pub mod planner;
pub mod stepper;

pub use delta::{DeltaSplit, DeltaTransform};
pub use planner::{CommittedSegment, Planner, PlannerStats, VelocityProfile};
pub use stepper::{AxisState, AxisStepper, StepCommand};
