//! In-memory mutations of a workflow state.
//!
//! Nothing here reads the clock or touches disk; callers pass `now` and persist through
//! [`StateManager::save`](crate::StateManager::save).

use chrono::{DateTime, Utc};
use tracing::debug;

use waypoint_utils::error::WaypointError;

use crate::custom_data::SpecDrivenData;
use crate::domain::WorkflowType;
use crate::state::{Blocker, GoalStage, PhaseState, WorkflowState};

impl WorkflowState {
    /// Record `step` as done in `phase` (default: the current phase).
    ///
    /// Returns `Ok(false)` when the step was already recorded. The phase must have started.
    pub fn complete_step(
        &mut self,
        phase: Option<&str>,
        step: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, WaypointError> {
        let phase = phase.unwrap_or(self.current_phase.as_str()).to_string();
        let definition = self
            .domain()
            .phase(&phase)
            .filter(|p| p.has_step(step))
            .ok_or_else(|| WaypointError::UnknownStep {
                phase: phase.clone(),
                step: step.to_string(),
            })?;

        let current_phase = self.current_phase.clone();
        let status = self
            .phases
            .get_mut(&phase)
            .ok_or_else(|| WaypointError::UnknownStep {
                phase: phase.clone(),
                step: step.to_string(),
            })?;

        if status.completed_steps.iter().any(|s| s == step) {
            return Ok(false);
        }

        match status.status {
            PhaseState::InProgress => {}
            PhaseState::NotStarted => {
                return Err(WaypointError::InvalidTarget {
                    from: current_phase,
                    target: phase,
                    reason: "steps can only be completed in a started phase".to_string(),
                });
            }
            PhaseState::Complete => {
                return Err(WaypointError::InvalidTarget {
                    from: current_phase,
                    target: phase,
                    reason: "the phase is already complete; record rework as a step of the current phase"
                        .to_string(),
                });
            }
        }

        status.completed_steps.push(step.to_string());
        debug!(phase = %phase, step, at = %now, "step completed");

        if phase == self.current_phase {
            self.current_step = self.remaining_steps(definition.name).first().map(|s| s.to_string());
        }
        Ok(true)
    }

    /// Track a new goal in `potential`.
    ///
    /// Re-adding a potential goal is a no-op; a goal in any other list cannot be re-added.
    pub fn add_goal(&mut self, goal_id: &str) -> Result<bool, WaypointError> {
        match self.goals.stage_of(goal_id) {
            None => {
                self.goals.potential.push(goal_id.to_string());
                Ok(true)
            }
            Some(GoalStage::Potential) => Ok(false),
            Some(stage) => Err(WaypointError::InvalidGoalTransition {
                goal_id: goal_id.to_string(),
                from: stage.to_string(),
                to: GoalStage::Potential.to_string(),
            }),
        }
    }

    /// potential → selected
    pub fn promote_goal(&mut self, goal_id: &str) -> Result<(), WaypointError> {
        self.move_goal(goal_id, &[GoalStage::Potential], GoalStage::Selected)
    }

    /// selected → completed
    pub fn complete_goal(&mut self, goal_id: &str) -> Result<(), WaypointError> {
        self.move_goal(goal_id, &[GoalStage::Selected], GoalStage::Completed)
    }

    /// any non-archived list → archived
    pub fn archive_goal(&mut self, goal_id: &str) -> Result<(), WaypointError> {
        self.move_goal(
            goal_id,
            &[GoalStage::Potential, GoalStage::Selected, GoalStage::Completed],
            GoalStage::Archived,
        )
    }

    fn move_goal(
        &mut self,
        goal_id: &str,
        allowed_from: &[GoalStage],
        to: GoalStage,
    ) -> Result<(), WaypointError> {
        let from = self
            .goals
            .stage_of(goal_id)
            .ok_or_else(|| WaypointError::UnknownGoal {
                goal_id: goal_id.to_string(),
            })?;

        if !allowed_from.contains(&from) {
            return Err(WaypointError::InvalidGoalTransition {
                goal_id: goal_id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.goals.list_mut(from).retain(|g| g != goal_id);
        self.goals.list_mut(to).push(goal_id.to_string());
        debug!(goal = goal_id, from = %from, to = %to, "goal moved");
        Ok(())
    }

    /// Record an open blocker and return its id (`B-<n>`).
    pub fn record_blocker(&mut self, description: &str, now: DateTime<Utc>) -> String {
        let id = format!("B-{}", self.blockers.len() + 1);
        self.blockers.push(Blocker {
            id: id.clone(),
            description: description.to_string(),
            raised_at: now,
            resolved_at: None,
        });
        id
    }

    /// Mark a blocker resolved. Returns `Ok(false)` if it already was.
    pub fn resolve_blocker(&mut self, id: &str, now: DateTime<Utc>) -> Result<bool, WaypointError> {
        let blocker = self
            .blockers
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| WaypointError::UnknownBlocker { id: id.to_string() })?;

        if blocker.resolved_at.is_some() {
            return Ok(false);
        }
        blocker.resolved_at = Some(now);
        Ok(true)
    }

    /// Name the feature a spec-driven workflow specifies. `Ok(false)` if unchanged.
    pub fn set_feature_name(&mut self, name: &str) -> Result<bool, WaypointError> {
        let data = self.spec_driven_data("set_feature_name")?;
        if data.feature_name.as_deref() == Some(name) {
            return Ok(false);
        }
        data.feature_name = Some(name.to_string());
        Ok(true)
    }

    /// Open a clarification question. `Ok(false)` if the same question is already open.
    pub fn add_clarification(&mut self, question: &str) -> Result<bool, WaypointError> {
        let data = self.spec_driven_data("add_clarification")?;
        if data.open_clarifications.iter().any(|q| q == question) {
            return Ok(false);
        }
        data.open_clarifications.push(question.to_string());
        Ok(true)
    }

    /// Close an open clarification, matched by its exact text. `Ok(false)` if none matches.
    pub fn resolve_clarification(&mut self, question: &str) -> Result<bool, WaypointError> {
        let data = self.spec_driven_data("resolve_clarification")?;
        let before = data.open_clarifications.len();
        data.open_clarifications.retain(|q| q != question);
        Ok(data.open_clarifications.len() != before)
    }

    fn spec_driven_data(&mut self, operation: &str) -> Result<&mut SpecDrivenData, WaypointError> {
        let workflow_type = self.workflow_type.to_string();
        self.custom_data
            .spec_driven_mut()
            .ok_or_else(|| WaypointError::UnsupportedOperation {
                operation: operation.to_string(),
                workflow_type,
                supported: WorkflowType::SpecDriven.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn started_pm() -> WorkflowState {
        let mut state = WorkflowState::new("/p1", WorkflowType::ProjectManagement, at(0));
        let first = state.phases.get_mut("initialization").unwrap();
        first.status = PhaseState::InProgress;
        first.started_at = Some(at(0));
        state.current_step = Some("create-structure".to_string());
        state
    }

    #[test]
    fn test_complete_step_advances_current_step() {
        let mut state = started_pm();

        assert!(state.complete_step(None, "create-structure", at(1)).unwrap());
        assert_eq!(state.current_step.as_deref(), Some("capture-vision"));

        assert!(!state.complete_step(None, "create-structure", at(2)).unwrap());
        assert!(state.complete_step(None, "capture-vision", at(3)).unwrap());
        assert_eq!(state.current_step, None);
    }

    #[test]
    fn test_complete_unknown_step() {
        let mut state = started_pm();
        let err = state.complete_step(None, "select-goals", at(1)).unwrap_err();
        assert!(matches!(err, WaypointError::UnknownStep { .. }));
    }

    #[test]
    fn test_complete_step_in_unstarted_phase() {
        let mut state = started_pm();
        let err = state
            .complete_step(Some("execution"), "track-progress", at(1))
            .unwrap_err();
        assert!(matches!(err, WaypointError::InvalidTarget { .. }));
    }

    #[test]
    fn test_goal_lifecycle() {
        let mut state = started_pm();
        assert!(state.add_goal("g1").unwrap());
        assert!(!state.add_goal("g1").unwrap());

        state.promote_goal("g1").unwrap();
        assert_eq!(state.goals.selected, vec!["g1"]);
        assert!(state.goals.potential.is_empty());

        state.complete_goal("g1").unwrap();
        state.archive_goal("g1").unwrap();
        assert_eq!(state.goals.archived, vec!["g1"]);
        assert_eq!(state.goals.total(), 1);
    }

    #[test]
    fn test_illegal_goal_moves() {
        let mut state = started_pm();
        state.add_goal("g1").unwrap();

        let err = state.complete_goal("g1").unwrap_err();
        assert!(matches!(err, WaypointError::InvalidGoalTransition { .. }));

        let err = state.promote_goal("missing").unwrap_err();
        assert!(matches!(err, WaypointError::UnknownGoal { .. }));

        state.archive_goal("g1").unwrap();
        assert!(state.archive_goal("g1").is_err());
        assert!(state.add_goal("g1").is_err());
    }

    #[test]
    fn test_blockers() {
        let mut state = started_pm();
        let first = state.record_blocker("waiting on legal review", at(1));
        let second = state.record_blocker("budget not approved", at(2));
        assert_eq!((first.as_str(), second.as_str()), ("B-1", "B-2"));
        assert_eq!(state.open_blockers().count(), 2);

        assert!(state.resolve_blocker("B-1", at(3)).unwrap());
        assert!(!state.resolve_blocker("B-1", at(4)).unwrap());
        assert_eq!(state.open_blockers().count(), 1);

        let err = state.resolve_blocker("B-9", at(5)).unwrap_err();
        assert!(matches!(err, WaypointError::UnknownBlocker { .. }));
    }

    #[test]
    fn test_feature_name_and_clarifications() {
        let mut state = WorkflowState::new("/p1", WorkflowType::SpecDriven, at(0));

        assert!(state.set_feature_name("checkout").unwrap());
        assert!(!state.set_feature_name("checkout").unwrap());
        assert_eq!(state.custom_data.feature_name(), Some("checkout"));

        assert!(state.add_clarification("Which payment providers?").unwrap());
        assert!(!state.add_clarification("Which payment providers?").unwrap());
        assert!(state.add_clarification("Guest checkout?").unwrap());
        assert_eq!(state.custom_data.open_clarifications().len(), 2);

        assert!(state.resolve_clarification("Which payment providers?").unwrap());
        assert!(!state.resolve_clarification("Which payment providers?").unwrap());
        assert_eq!(state.custom_data.open_clarifications(), ["Guest checkout?".to_string()]);
    }

    #[test]
    fn test_spec_fields_rejected_for_other_domains() {
        let mut state = started_pm();
        let before = state.clone();

        let err = state.set_feature_name("checkout").unwrap_err();
        assert!(matches!(
            err,
            WaypointError::UnsupportedOperation { ref workflow_type, .. }
                if workflow_type == "project-management"
        ));
        assert!(state.add_clarification("Why?").is_err());
        assert!(state.resolve_clarification("Why?").is_err());
        assert_eq!(state, before);
    }
}
