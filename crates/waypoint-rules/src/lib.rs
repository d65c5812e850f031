//! Next-step suggestions for waypoint workflows.
//!
//! A [`Rule`] pairs a pure predicate with a suggestion builder. [`suggest_next`] evaluates an
//! ordered rule list against a state snapshot and returns the ranked suggestions; each
//! suggestion names the downstream tool and the parameters to call it with.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `engine` | [`RuleContext`], [`Rule`], [`suggest_next`] |
//! | `suggestion` | [`Suggestion`], [`PriorityTier`] |
//! | `builtin` | Shipped rule sets, see [`builtin_rules`] |

pub mod builtin;
mod engine;
mod suggestion;

pub use builtin::{all_rules, builtin_rules};
pub use engine::{NextSteps, NextStepsStatus, Rule, RuleContext, suggest_next};
pub use suggestion::{PriorityTier, Proposal, Suggestion};
