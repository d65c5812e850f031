//! Transition check result types

use serde::{Deserialize, Serialize};

/// Outcome of checking whether a workflow may move from one phase to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCheck {
    /// Phase the workflow is in
    pub from: String,

    /// Phase being checked; equal to `from` when checking workflow completion
    pub to: String,

    /// Conjunction of every condition
    pub allowed: bool,

    /// Human-readable summary of the result
    pub summary: String,

    /// Individual prerequisites evaluated
    pub conditions: Vec<GateCondition>,

    /// One entry per failing prerequisite, suitable for showing verbatim
    pub blockers: Vec<String>,
}

/// Individual prerequisite evaluated by the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateCondition {
    /// Name of condition
    pub name: String,

    /// Description of what the condition checks
    pub description: String,

    /// Whether the condition passed
    pub passed: bool,

    /// Actual value observed
    pub actual: Option<String>,

    /// Expected value for passing
    pub expected: Option<String>,
}
