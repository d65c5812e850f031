//! Normalized context handed to downstream consumers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use waypoint_state::{GoalStage, WorkflowState};
use waypoint_utils::error::WaypointError;

/// Pure function turning a state and a handed-off id into the consumer's context
pub type Extractor = fn(&WorkflowState, &str) -> Result<HandoffContext, WaypointError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffContext {
    pub project_path: String,
    pub workflow_name: String,
    pub workflow_type: String,
    pub goal: GoalContext,
}

/// One goal in the shape downstream specification tools expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalContext {
    pub goal_id: String,
    /// Falls back to the goal id when no details were recorded
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<String>,
}

impl GoalContext {
    /// JSON object form used in call parameters
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("goalId".to_string(), Value::String(self.goal_id.clone()));
        object.insert("name".to_string(), Value::String(self.name.clone()));
        object.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        if let Some(impact) = &self.impact {
            object.insert("impact".to_string(), Value::String(impact.clone()));
        }
        if let Some(effort) = &self.effort {
            object.insert("effort".to_string(), Value::String(effort.clone()));
        }
        Value::Object(object)
    }
}

/// Default extractor: the goal's recorded details.
///
/// Archived and untracked goals cannot be handed off.
pub fn goal_context(state: &WorkflowState, goal_id: &str) -> Result<HandoffContext, WaypointError> {
    match state.goals.stage_of(goal_id) {
        None | Some(GoalStage::Archived) => {
            return Err(WaypointError::UnknownGoal {
                goal_id: goal_id.to_string(),
            });
        }
        Some(_) => {}
    }

    let detail = state.custom_data.goal_detail(goal_id);
    let goal = GoalContext {
        goal_id: goal_id.to_string(),
        name: detail
            .map(|d| d.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| goal_id.to_string()),
        description: detail.map(|d| d.description.clone()).unwrap_or_default(),
        impact: detail.and_then(|d| d.impact.clone()),
        effort: detail.and_then(|d| d.effort.clone()),
    };

    Ok(HandoffContext {
        project_path: state.project_path.clone(),
        workflow_name: state.name.clone(),
        workflow_type: state.workflow_type.to_string(),
        goal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use waypoint_state::{GoalDetail, WorkflowType};

    fn pm() -> WorkflowState {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        WorkflowState::new("/work/checkout", WorkflowType::ProjectManagement, now)
    }

    #[test]
    fn test_details_are_extracted() {
        let mut state = pm();
        state.add_goal("g1").unwrap();
        state.custom_data.set_goal_detail(
            "g1",
            GoalDetail {
                name: "Faster checkout".to_string(),
                description: "Cut checkout to one page".to_string(),
                impact: Some("high".to_string()),
                effort: None,
            },
        );

        let context = goal_context(&state, "g1").unwrap();
        assert_eq!(context.workflow_name, "checkout");
        assert_eq!(context.goal.name, "Faster checkout");
        assert_eq!(context.goal.impact.as_deref(), Some("high"));

        let json = context.goal.to_json();
        assert_eq!(json["goalId"], "g1");
        assert!(json.get("effort").is_none());
    }

    #[test]
    fn test_missing_details_fall_back_to_id() {
        let mut state = pm();
        state.add_goal("g2").unwrap();

        let context = goal_context(&state, "g2").unwrap();
        assert_eq!(context.goal.name, "g2");
        assert_eq!(context.goal.description, "");
    }

    #[test]
    fn test_archived_and_unknown_goals_are_rejected() {
        let mut state = pm();
        state.add_goal("g3").unwrap();
        state.archive_goal("g3").unwrap();

        for goal in ["g3", "nope"] {
            assert!(matches!(
                goal_context(&state, goal),
                Err(WaypointError::UnknownGoal { .. })
            ));
        }
    }
}
