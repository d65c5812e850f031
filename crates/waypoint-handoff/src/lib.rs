//! Handoff of workflow context to downstream tools.
//!
//! A [`Consumer`] pairs an extractor (state to [`HandoffContext`]) with a parameter builder.
//! [`prepare_handoff`] produces a [`SuggestedCall`] and records the handoff in the state's
//! integration record; it never invokes the downstream tool.

pub mod consumer;
pub mod context;
mod prepare;

pub use consumer::{BUILTIN_CONSUMERS, Consumer};
pub use context::{Extractor, GoalContext, HandoffContext, goal_context};
pub use prepare::{HandoffResult, SuggestedCall, prepare_builtin_handoff, prepare_handoff};
