use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use waypoint_gate::{TransitionCheck, readiness};
use waypoint_state::{Blocker, IntegrationRecord, PhaseState, WorkflowState};
use waypoint_utils::error::WaypointError;

/// Point-in-time summary of a workflow, as shown by `waypoint status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub project_path: String,
    pub name: String,
    pub workflow_type: String,
    pub current_phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Phases in domain order
    pub phases: Vec<PhaseProgress>,
    pub goals: GoalCounts,
    pub integrations: BTreeMap<String, IntegrationRecord>,
    pub open_blockers: Vec<Blocker>,
    /// Spec-driven workflows only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_clarifications: Vec<String>,
    /// Check for the next phase, or for completion at the terminal phase; absent once complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness: Option<TransitionCheck>,
    pub workflow_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    pub name: String,
    pub status: PhaseState,
    pub completed_steps: usize,
    pub total_steps: usize,
    /// 0-100, rounded down
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalCounts {
    pub potential: usize,
    pub selected: usize,
    pub completed: usize,
    pub archived: usize,
}

impl StatusReport {
    pub fn from_state(state: &WorkflowState) -> Result<Self, WaypointError> {
        let domain = state.domain();
        let phases = domain
            .phases
            .iter()
            .map(|definition| {
                let status = state.phases.get(definition.name);
                let total = definition.steps.len();
                let completed = status.map_or(0, |s| {
                    definition
                        .steps
                        .iter()
                        .filter(|step| s.completed_steps.iter().any(|c| c == *step))
                        .count()
                });
                PhaseProgress {
                    name: definition.name.to_string(),
                    status: status.map_or(PhaseState::NotStarted, |s| s.status),
                    completed_steps: completed,
                    total_steps: total,
                    percent: percent(completed, total),
                }
            })
            .collect();

        let readiness = readiness(state)?;
        let workflow_complete = state.phase_state(domain.terminal_phase().name)
            == Some(PhaseState::Complete);

        Ok(Self {
            project_path: state.project_path.clone(),
            name: state.name.clone(),
            workflow_type: state.workflow_type.to_string(),
            current_phase: state.current_phase.clone(),
            current_step: state.current_step.clone(),
            created: state.created,
            last_updated: state.last_updated,
            phases,
            goals: GoalCounts {
                potential: state.goals.potential.len(),
                selected: state.goals.selected.len(),
                completed: state.goals.completed.len(),
                archived: state.goals.archived.len(),
            },
            integrations: state.integrations.clone(),
            open_blockers: state.open_blockers().cloned().collect(),
            feature_name: state.custom_data.feature_name().map(str::to_string),
            open_clarifications: state.custom_data.open_clarifications().to_vec(),
            readiness,
            workflow_complete,
        })
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(completed * 100 / total).unwrap_or(100)
}
