//! Phase transition gate for waypoint workflows.
//!
//! [`can_advance`] and [`can_complete`] evaluate prerequisites without changing anything;
//! [`advance`] and [`complete_workflow`] apply a transition to a copy of the state when the
//! check allows it (or when validation is explicitly skipped).

pub mod transition;
pub mod types;
pub mod validator;

// Re-exports for convenience
pub use transition::{advance, begin, complete_workflow};
pub use types::{GateCondition, TransitionCheck};
pub use validator::{can_advance, can_complete, readiness};

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{TimeZone, Utc};
    use waypoint_state::{PhaseState, WorkflowState, WorkflowType};

    /// Workflow at "/p1" with its first phase started
    pub(crate) fn started(workflow_type: WorkflowType) -> WorkflowState {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        crate::begin(&WorkflowState::new("/p1", workflow_type, now), now)
    }

    /// Project-management workflow in `phase`, every earlier phase complete
    pub(crate) fn pm_at(phase: &str) -> WorkflowState {
        let mut state = started(WorkflowType::ProjectManagement);
        let target = state.domain().index_of(phase).unwrap();
        for (index, definition) in state.domain().phases.iter().enumerate() {
            let status = state.phases.get_mut(definition.name).unwrap();
            if index < target {
                status.status = PhaseState::Complete;
            } else if index == target {
                status.status = PhaseState::InProgress;
                status.started_at = Some(state.created);
            }
        }
        state.current_phase = phase.to_string();
        state
    }

    /// Mark every step of the current phase complete
    pub(crate) fn complete_steps(state: &mut WorkflowState) {
        let phase = state.current_phase.clone();
        for step in state.domain().phase(&phase).unwrap().steps {
            state.complete_step(None, step, state.created).unwrap();
        }
    }
}
