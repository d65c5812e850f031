//! Question-guided rules for spec-driven workflows.
//!
//! Every suggestion targets the `sdd_guide` tool; the `action` parameter tells it which
//! interaction to open.

use serde_json::Value;

use waypoint_state::WorkflowType;

use crate::engine::{Rule, RuleContext};
use crate::suggestion::Proposal;

const GUIDE_TOOL: &str = "sdd_guide";

pub const RULES: &[Rule] = &[
    Rule {
        id: "sdd-resolve-clarifications",
        priority: 92,
        predicate: has_open_clarifications,
        build: resolve_clarification,
    },
    Rule {
        id: "sdd-start-phase",
        priority: 90,
        predicate: phase_not_begun,
        build: start_phase,
    },
    Rule {
        id: "sdd-continue-phase",
        priority: 74,
        predicate: phase_partially_answered,
        build: continue_phase,
    },
    Rule {
        id: "sdd-name-feature",
        priority: 60,
        predicate: feature_unnamed,
        build: name_feature,
    },
];

fn is_sdd(ctx: &RuleContext<'_>) -> bool {
    ctx.state.workflow_type == WorkflowType::SpecDriven
}

fn guide_params(ctx: &RuleContext<'_>, action: &str) -> serde_json::Map<String, Value> {
    let mut params = ctx.project_params();
    params.insert("action".to_string(), Value::String(action.to_string()));
    params
}

fn step_params(ctx: &RuleContext<'_>, step: &str) -> Value {
    let mut params = guide_params(ctx, "answer");
    params.insert(
        "phase".to_string(),
        Value::String(ctx.state.current_phase.clone()),
    );
    params.insert("step".to_string(), Value::String(step.to_string()));
    Value::Object(params)
}

fn completed_step_count(ctx: &RuleContext<'_>) -> usize {
    ctx.state
        .phases
        .get(&ctx.state.current_phase)
        .map_or(0, |p| p.completed_steps.len())
}

fn has_open_clarifications(ctx: &RuleContext<'_>) -> bool {
    is_sdd(ctx) && !ctx.state.custom_data.open_clarifications().is_empty()
}

fn resolve_clarification(ctx: &RuleContext<'_>) -> Proposal {
    let open = ctx.state.custom_data.open_clarifications();
    let question = open.first().cloned().unwrap_or_default();
    let mut params = guide_params(ctx, "clarify");
    params.insert("question".to_string(), Value::String(question.clone()));
    Proposal {
        action: format!(
            "Resolve {} open clarification(s), starting with: {question}",
            open.len()
        ),
        target_tool: GUIDE_TOOL,
        params: Value::Object(params),
    }
}

/// The current phase has started but none of its questions is answered yet
fn phase_not_begun(ctx: &RuleContext<'_>) -> bool {
    is_sdd(ctx)
        && ctx.current_phase_in_progress()
        && completed_step_count(ctx) == 0
        && !ctx.remaining_steps().is_empty()
}

fn start_phase(ctx: &RuleContext<'_>) -> Proposal {
    let step = ctx.remaining_steps().first().copied().unwrap_or_default();
    let action = match ctx.state.current_phase.as_str() {
        "constitution" => "Start the constitution: describe the project's guiding principles",
        "specification" => "Start the specification: write the user stories",
        "clarification" => "Review the specification for ambiguities",
        "planning" => "Start planning: outline the architecture",
        "tasks" => "Break the plan down into tasks",
        "implementation" => "Start implementing the task list",
        other => {
            return Proposal {
                action: format!("Start '{other}' with '{step}'"),
                target_tool: GUIDE_TOOL,
                params: step_params(ctx, step),
            };
        }
    };
    Proposal {
        action: action.to_string(),
        target_tool: GUIDE_TOOL,
        params: step_params(ctx, step),
    }
}

fn phase_partially_answered(ctx: &RuleContext<'_>) -> bool {
    is_sdd(ctx)
        && ctx.current_phase_in_progress()
        && completed_step_count(ctx) > 0
        && !ctx.remaining_steps().is_empty()
}

fn continue_phase(ctx: &RuleContext<'_>) -> Proposal {
    let remaining = ctx.remaining_steps();
    let step = remaining.first().copied().unwrap_or_default();
    Proposal {
        action: format!(
            "Continue '{}' with '{step}' ({} question(s) left)",
            ctx.state.current_phase,
            remaining.len()
        ),
        target_tool: GUIDE_TOOL,
        params: step_params(ctx, step),
    }
}

fn feature_unnamed(ctx: &RuleContext<'_>) -> bool {
    is_sdd(ctx)
        && ctx.state.current_phase == "specification"
        && ctx.state.custom_data.feature_name().is_none()
}

fn name_feature(ctx: &RuleContext<'_>) -> Proposal {
    let mut params = guide_params(ctx, "answer");
    params.insert(
        "question".to_string(),
        Value::String("featureName".to_string()),
    );
    Proposal {
        action: "Name the feature being specified".to_string(),
        target_tool: GUIDE_TOOL,
        params: Value::Object(params),
    }
}
