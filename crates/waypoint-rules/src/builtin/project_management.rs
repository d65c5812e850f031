//! Goal-centric rules for project-management workflows.

use chrono::{DateTime, Utc};
use serde_json::Value;

use waypoint_state::{WorkflowState, WorkflowType};

use crate::engine::{Rule, RuleContext};
use crate::suggestion::Proposal;

/// Consumer goals are handed to during execution
const HANDOFF_CONSUMER: &str = "spec-driven";

pub const RULES: &[Rule] = &[
    Rule {
        id: "pm-select-goals",
        priority: 88,
        predicate: needs_goal_selection,
        build: promote_first_potential,
    },
    Rule {
        id: "pm-handoff-selected-goal",
        priority: 86,
        predicate: has_goal_awaiting_handoff,
        build: handoff_next_goal,
    },
    Rule {
        id: "pm-brainstorm-goals",
        priority: 78,
        predicate: no_goals_during_development,
        build: brainstorm_goals,
    },
    Rule {
        id: "pm-review-stalled-goals",
        priority: 72,
        predicate: selected_goals_stalled,
        build: review_stalled_goals,
    },
    Rule {
        id: "pm-complete-handed-off-goal",
        priority: 66,
        predicate: has_handed_off_selected_goal,
        build: complete_handed_off_goal,
    },
];

fn is_pm(ctx: &RuleContext<'_>) -> bool {
    ctx.state.workflow_type == WorkflowType::ProjectManagement
}

fn in_phase(ctx: &RuleContext<'_>, phase: &str) -> bool {
    is_pm(ctx) && ctx.state.current_phase == phase && ctx.current_phase_in_progress()
}

fn handed_off(state: &WorkflowState, goal_id: &str) -> bool {
    state
        .integrations
        .values()
        .any(|record| record.handoff_ids.iter().any(|id| id == goal_id))
}

fn goal_params(ctx: &RuleContext<'_>, goal_id: &str) -> serde_json::Map<String, Value> {
    let mut params = ctx.project_params();
    params.insert("goalId".to_string(), Value::String(goal_id.to_string()));
    params
}

fn goal_label(state: &WorkflowState, goal_id: &str) -> String {
    match state.custom_data.goal_detail(goal_id) {
        Some(detail) if !detail.name.is_empty() => format!("'{}' ({goal_id})", detail.name),
        _ => format!("'{goal_id}'"),
    }
}

fn needs_goal_selection(ctx: &RuleContext<'_>) -> bool {
    in_phase(ctx, "goal-development")
        && !ctx.state.goals.potential.is_empty()
        && ctx.state.goals.selected.is_empty()
}

fn promote_first_potential(ctx: &RuleContext<'_>) -> Proposal {
    let goals = &ctx.state.goals.potential;
    let first = goals.first().map_or("", String::as_str);
    Proposal {
        action: format!(
            "Select at least one of {} potential goal(s), e.g. {}",
            goals.len(),
            goal_label(ctx.state, first)
        ),
        target_tool: "promote_goal",
        params: Value::Object(goal_params(ctx, first)),
    }
}

fn next_goal_awaiting_handoff<'s>(ctx: &RuleContext<'s>) -> Option<&'s str> {
    let state = ctx.state;
    state
        .goals
        .selected
        .iter()
        .map(String::as_str)
        .find(|goal| !handed_off(state, goal))
}

fn has_goal_awaiting_handoff(ctx: &RuleContext<'_>) -> bool {
    in_phase(ctx, "execution") && next_goal_awaiting_handoff(ctx).is_some()
}

fn handoff_next_goal(ctx: &RuleContext<'_>) -> Proposal {
    let goal = next_goal_awaiting_handoff(ctx).unwrap_or_default();
    let mut params = goal_params(ctx, goal);
    params.insert(
        "consumer".to_string(),
        Value::String(HANDOFF_CONSUMER.to_string()),
    );
    Proposal {
        action: format!(
            "Hand off selected goal {} to {HANDOFF_CONSUMER} development",
            goal_label(ctx.state, goal)
        ),
        target_tool: "prepare_handoff",
        params: Value::Object(params),
    }
}

fn no_goals_during_development(ctx: &RuleContext<'_>) -> bool {
    in_phase(ctx, "goal-development") && ctx.state.goals.total() == 0
}

fn brainstorm_goals(ctx: &RuleContext<'_>) -> Proposal {
    Proposal {
        action: "Brainstorm potential goals for the project".to_string(),
        target_tool: "add_goal",
        params: Value::Object(ctx.project_params()),
    }
}

/// When the current selection became active: execution start, else goal development start
fn selection_started(state: &WorkflowState) -> DateTime<Utc> {
    ["execution", "goal-development"]
        .iter()
        .find_map(|phase| state.phases.get(*phase).and_then(|p| p.started_at))
        .unwrap_or(state.created)
}

/// Cross-phase: selected goals exist, none completed or archived, for longer than the review window
fn selected_goals_stalled(ctx: &RuleContext<'_>) -> bool {
    let goals = &ctx.state.goals;
    is_pm(ctx)
        && !goals.selected.is_empty()
        && goals.completed.is_empty()
        && goals.archived.is_empty()
        && ctx.now - selection_started(ctx.state) > ctx.review_after
}

fn review_stalled_goals(ctx: &RuleContext<'_>) -> Proposal {
    let days = (ctx.now - selection_started(ctx.state)).num_days();
    let mut params = ctx.project_params();
    params.insert(
        "goalIds".to_string(),
        Value::Array(
            ctx.state
                .goals
                .selected
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    Proposal {
        action: format!(
            "Review {} selected goal(s): no goal has been completed or archived in {days} days",
            ctx.state.goals.selected.len()
        ),
        target_tool: "get_status",
        params: Value::Object(params),
    }
}

fn first_handed_off_selected<'s>(ctx: &RuleContext<'s>) -> Option<&'s str> {
    let state = ctx.state;
    state
        .goals
        .selected
        .iter()
        .map(String::as_str)
        .find(|goal| handed_off(state, goal))
}

fn has_handed_off_selected_goal(ctx: &RuleContext<'_>) -> bool {
    in_phase(ctx, "execution") && first_handed_off_selected(ctx).is_some()
}

fn complete_handed_off_goal(ctx: &RuleContext<'_>) -> Proposal {
    let goal = first_handed_off_selected(ctx).unwrap_or_default();
    Proposal {
        action: format!(
            "Mark goal {} complete once its downstream work has landed",
            goal_label(ctx.state, goal)
        ),
        target_tool: "complete_goal",
        params: Value::Object(goal_params(ctx, goal)),
    }
}
