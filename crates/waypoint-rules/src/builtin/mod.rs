//! Rule sets shipped with the engine.
//!
//! Domain rules are registered ahead of the common rules so that, at equal priority, the
//! domain-specific suggestion wins the tie.

pub mod common;
pub mod project_management;
pub mod spec_driven;

use waypoint_state::WorkflowType;

use crate::engine::Rule;

/// Ordered rule list for a workflow type
#[must_use]
pub fn builtin_rules(workflow_type: &WorkflowType) -> Vec<Rule> {
    let domain: &[Rule] = match workflow_type {
        WorkflowType::ProjectManagement => project_management::RULES,
        WorkflowType::SpecDriven => spec_driven::RULES,
        WorkflowType::Generic(_) => &[],
    };
    domain.iter().chain(common::RULES).copied().collect()
}

/// Every rule shipped, regardless of domain
pub fn all_rules() -> impl Iterator<Item = &'static Rule> {
    project_management::RULES
        .iter()
        .chain(spec_driven::RULES)
        .chain(common::RULES)
}
