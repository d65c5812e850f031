//! Rules that apply to every workflow type.

use serde_json::Value;

use waypoint_state::{GoalStage, PhaseState, WorkflowType};

use crate::engine::{Rule, RuleContext};
use crate::suggestion::Proposal;

pub const RULES: &[Rule] = &[
    Rule {
        id: "open-blockers",
        priority: 95,
        predicate: has_open_blockers,
        build: resolve_first_blocker,
    },
    Rule {
        id: "phase-ready-to-advance",
        priority: 85,
        predicate: phase_ready_to_advance,
        build: advance_to_next_phase,
    },
    Rule {
        id: "complete-workflow",
        priority: 80,
        predicate: terminal_phase_finished,
        build: complete_workflow,
    },
    Rule {
        id: "continue-current-step",
        priority: 70,
        predicate: has_remaining_step,
        build: complete_next_step,
    },
    Rule {
        id: "missing-goal-files",
        priority: 62,
        predicate: active_goal_missing_on_disk,
        build: archive_missing_goal,
    },
];

fn has_open_blockers(ctx: &RuleContext<'_>) -> bool {
    ctx.state.open_blockers().next().is_some()
}

fn resolve_first_blocker(ctx: &RuleContext<'_>) -> Proposal {
    let open: Vec<_> = ctx.state.open_blockers().collect();
    let mut params = ctx.project_params();
    let action = match open.first() {
        Some(blocker) => {
            params.insert("blockerId".to_string(), Value::String(blocker.id.clone()));
            if open.len() > 1 {
                format!(
                    "Resolve blocker {} ({}) and {} more before advancing",
                    blocker.id,
                    blocker.description,
                    open.len() - 1
                )
            } else {
                format!("Resolve blocker {} ({}) before advancing", blocker.id, blocker.description)
            }
        }
        None => "Resolve open blockers before advancing".to_string(),
    };
    Proposal {
        action,
        target_tool: "resolve_blocker",
        params: Value::Object(params),
    }
}

fn phase_ready_to_advance(ctx: &RuleContext<'_>) -> bool {
    ctx.current_phase_in_progress()
        && ctx.remaining_steps().is_empty()
        && !has_open_blockers(ctx)
        && ctx.state.domain().next_phase(&ctx.state.current_phase).is_some()
}

fn advance_to_next_phase(ctx: &RuleContext<'_>) -> Proposal {
    let mut params = ctx.project_params();
    let next = ctx
        .state
        .domain()
        .next_phase(&ctx.state.current_phase)
        .map_or("", |p| p.name);
    params.insert("targetPhase".to_string(), Value::String(next.to_string()));
    Proposal {
        action: format!(
            "All steps of '{}' are done; advance to '{next}'",
            ctx.state.current_phase
        ),
        target_tool: "advance_phase",
        params: Value::Object(params),
    }
}

fn terminal_phase_finished(ctx: &RuleContext<'_>) -> bool {
    ctx.state.current_phase == ctx.state.domain().terminal_phase().name
        && ctx.current_phase_in_progress()
        && ctx.remaining_steps().is_empty()
        && !has_open_blockers(ctx)
}

fn complete_workflow(ctx: &RuleContext<'_>) -> Proposal {
    Proposal {
        action: "Every phase is done; mark the workflow complete".to_string(),
        target_tool: "complete_workflow",
        params: Value::Object(ctx.project_params()),
    }
}

/// Spec-driven workflows have their own step guidance
fn has_remaining_step(ctx: &RuleContext<'_>) -> bool {
    ctx.state.workflow_type != WorkflowType::SpecDriven
        && ctx.current_phase_in_progress()
        && !ctx.remaining_steps().is_empty()
}

fn complete_next_step(ctx: &RuleContext<'_>) -> Proposal {
    let step = ctx.remaining_steps().first().copied().unwrap_or_default();
    let mut params = ctx.project_params();
    params.insert(
        "phase".to_string(),
        Value::String(ctx.state.current_phase.clone()),
    );
    params.insert("step".to_string(), Value::String(step.to_string()));
    Proposal {
        action: format!("Work on step '{step}' of phase '{}'", ctx.state.current_phase),
        target_tool: "complete_step",
        params: Value::Object(params),
    }
}

fn missing_active_goal<'s>(ctx: &RuleContext<'s>) -> Option<(&'s str, GoalStage)> {
    let state = ctx.state;
    state.drift.missing_goals.iter().find_map(|goal| {
        match state.goals.stage_of(goal) {
            Some(stage @ (GoalStage::Potential | GoalStage::Selected)) => {
                Some((goal.as_str(), stage))
            }
            _ => None,
        }
    })
}

fn active_goal_missing_on_disk(ctx: &RuleContext<'_>) -> bool {
    missing_active_goal(ctx).is_some()
}

fn archive_missing_goal(ctx: &RuleContext<'_>) -> Proposal {
    let mut params = ctx.project_params();
    let action = match missing_active_goal(ctx) {
        Some((goal, stage)) => {
            params.insert("goalId".to_string(), Value::String(goal.to_string()));
            format!("Goal '{goal}' ({stage}) has no file on disk; restore it or archive it")
        }
        None => "Review goals whose files are missing".to_string(),
    };
    Proposal {
        action,
        target_tool: "archive_goal",
        params: Value::Object(params),
    }
}
