//! Workflow operations for waypoint.
//!
//! [`WorkflowHandle`] composes the state manager, detector, rules, gate and handoff crates
//! into the operation surface used by the CLI and by embedding tools. [`observe`] gathers the
//! filesystem facts the detector reconciles against.

mod handle;
pub mod observe;
mod status;

pub use handle::{NextStepsReport, WorkflowHandle};
pub use observe::observe;
pub use status::{GoalCounts, PhaseProgress, StatusReport};
