//! Command handlers for the waypoint CLI
//!
//! Each handler runs one [`WorkflowHandle`] operation and prints its result, either as human
//! text or, with `--json`, as JCS canonical JSON on stdout.

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use crate::{
    DriftRecord, GoalDetail, NextStepsStatus, PhaseState, StatusReport, TransitionCheck,
    WorkflowHandle, WorkflowState, emit_jcs,
};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", emit_jcs(value)?);
    Ok(())
}

/// Execute `waypoint init`
pub fn execute_init_command(
    handle: &WorkflowHandle,
    project: &str,
    workflow_type: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let state = handle.initialize(project, workflow_type, force)?;
    if json {
        return print_json(&state);
    }

    println!(
        "✓ Initialized {} workflow '{}'",
        state.workflow_type, state.name
    );
    println!("  Project: {}", state.project_path);
    println!("  Phase:   {}", state.current_phase);
    if let Some(step) = &state.current_step {
        println!("  Step:    {step}");
    }
    println!(
        "  State:   {}",
        handle.manager().state_path(&state.project_path)
    );
    Ok(())
}

/// Execute `waypoint next`
pub fn execute_next_command(
    handle: &WorkflowHandle,
    project: &str,
    max: Option<usize>,
    skip_sync: bool,
    json: bool,
) -> Result<()> {
    let report = handle.get_next_steps(project, max, skip_sync)?;
    if json {
        return print_json(&report);
    }

    print_drift(&report.drift);

    match report.status {
        NextStepsStatus::WorkflowComplete => {
            println!("Workflow complete. Nothing left to do.");
        }
        NextStepsStatus::NothingActionable => {
            println!("No suggestions right now.");
        }
        NextStepsStatus::Actionable => {
            println!("Next steps:");
            for (i, suggestion) in report.suggestions.iter().enumerate() {
                println!(
                    "  {}. [{} {}] {}",
                    i + 1,
                    suggestion.tier,
                    suggestion.priority,
                    suggestion.action
                );
                println!(
                    "       → {} {}",
                    suggestion.target_tool,
                    serde_json::to_string(&suggestion.params)?
                );
            }
        }
    }
    Ok(())
}

/// Execute `waypoint status`
pub fn execute_status_command(handle: &WorkflowHandle, project: &str, json: bool) -> Result<()> {
    let report = handle.get_status(project)?;
    if json {
        return print_json(&report);
    }
    print_status(&report);
    Ok(())
}

fn print_status(report: &StatusReport) {
    println!("Workflow: {} ({})", report.name, report.workflow_type);
    println!("Project:  {}", report.project_path);
    println!(
        "Updated:  {}",
        report.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    println!("Phases:");
    for phase in &report.phases {
        let marker = match phase.status {
            PhaseState::Complete => "✓",
            PhaseState::InProgress => "▶",
            PhaseState::NotStarted => " ",
        };
        println!(
            "  {marker} {:<20} {:>3}% ({}/{} steps)",
            phase.name, phase.percent, phase.completed_steps, phase.total_steps
        );
    }
    if let Some(step) = &report.current_step {
        println!("  Current step: {step}");
    }
    println!();

    println!(
        "Goals: {} potential, {} selected, {} completed, {} archived",
        report.goals.potential, report.goals.selected, report.goals.completed, report.goals.archived
    );

    if !report.integrations.is_empty() {
        println!("Integrations:");
        for (name, record) in &report.integrations {
            let state = if record.used { "used" } else { "available" };
            println!("  {name}: {state} ({} handoff(s))", record.handoff_ids.len());
        }
    }

    if !report.open_blockers.is_empty() {
        println!("Open blockers:");
        for blocker in &report.open_blockers {
            println!("  {} {}", blocker.id, blocker.description);
        }
    }

    if let Some(feature) = &report.feature_name {
        println!("Feature: {feature}");
    }
    if !report.open_clarifications.is_empty() {
        println!("Open clarifications:");
        for question in &report.open_clarifications {
            println!("  ? {question}");
        }
    }

    if report.workflow_complete {
        println!("\nWorkflow complete.");
    } else if let Some(check) = &report.readiness {
        println!();
        print_check(check);
    }
}

fn print_check(check: &TransitionCheck) {
    let verdict = if check.allowed { "✓" } else { "✗" };
    println!("{verdict} {}", check.summary);
    for condition in &check.conditions {
        let mark = if condition.passed { "✓" } else { "✗" };
        print!("  {mark} {}", condition.description);
        if let (Some(actual), Some(expected)) = (&condition.actual, &condition.expected) {
            print!(" (actual: {actual}, expected: {expected})");
        }
        println!();
    }
    for blocker in &check.blockers {
        println!("  • {blocker}");
    }
}

fn print_drift(drift: &[DriftRecord]) {
    if drift.is_empty() {
        return;
    }
    println!("Reconciled {} change(s):", drift.len());
    for record in drift {
        println!(
            "  {:<8} {:<16} {}",
            record.change_type, record.category, record.details
        );
    }
    println!();
}

fn last_transition(state: &WorkflowState) -> Option<(&str, &str, bool)> {
    state
        .transitions
        .last()
        .map(|t| (t.from.as_str(), t.to.as_str(), t.validation_skipped))
}

/// Execute `waypoint advance`
pub fn execute_advance_command(
    handle: &WorkflowHandle,
    project: &str,
    target: Option<&str>,
    skip_validation: bool,
    json: bool,
) -> Result<()> {
    let state = handle.advance_phase(project, target, skip_validation)?;
    if json {
        return print_json(&state);
    }

    if let Some((from, to, skipped)) = last_transition(&state) {
        println!("✓ Advanced from '{from}' to '{to}'");
        if skipped {
            println!("  Validation skipped (recorded in the transition history)");
        }
    }
    if let Some(step) = &state.current_step {
        println!("  Next step: {step}");
    }
    Ok(())
}

/// Execute `waypoint validate`
pub fn execute_validate_command(handle: &WorkflowHandle, project: &str, json: bool) -> Result<()> {
    let check = handle.validate_readiness(project)?;
    if json {
        return print_json(&json!({ "readiness": check }));
    }

    match check {
        Some(check) => print_check(&check),
        None => println!("Workflow complete. No transition left to validate."),
    }
    Ok(())
}

/// Execute `waypoint handoff`
pub fn execute_handoff_command(
    handle: &WorkflowHandle,
    project: &str,
    consumer: &str,
    goal_id: &str,
    json: bool,
) -> Result<()> {
    let result = handle.prepare_handoff(project, consumer, goal_id)?;
    if json {
        return print_json(&json!({
            "alreadyHandedOff": result.already_handed_off,
            "context": result.context,
            "suggestedCall": result.suggested_call,
        }));
    }

    if result.already_handed_off {
        println!("Goal '{goal_id}' was already handed off to {consumer}.");
    } else {
        println!("✓ Recorded handoff of goal '{goal_id}' to {consumer}");
    }
    println!("Suggested call: {}", result.suggested_call.target_tool);
    println!(
        "{}",
        serde_json::to_string_pretty(&result.suggested_call.params)?
    );
    Ok(())
}

/// Execute `waypoint sync`
pub fn execute_sync_command(handle: &WorkflowHandle, project: &str, json: bool) -> Result<()> {
    let drift = handle.sync(project)?;
    if json {
        return print_json(&json!({ "changes": drift }));
    }

    if drift.is_empty() {
        println!("✓ State matches the project directory");
    } else {
        print_drift(&drift);
    }
    Ok(())
}

/// Execute `waypoint step`
pub fn execute_step_command(
    handle: &WorkflowHandle,
    project: &str,
    phase: Option<&str>,
    step: &str,
    json: bool,
) -> Result<()> {
    let completed = handle.complete_step(project, phase, step)?;
    if json {
        return print_json(&json!({ "step": step, "completed": completed }));
    }

    if completed {
        println!("✓ Step '{step}' complete");
    } else {
        println!("Step '{step}' was already complete");
    }
    Ok(())
}

/// Execute `waypoint goal add`
pub fn execute_goal_add_command(
    handle: &WorkflowHandle,
    project: &str,
    goal_id: &str,
    detail: Option<GoalDetail>,
) -> Result<()> {
    if handle.add_goal(project, goal_id, detail)? {
        println!("✓ Added potential goal '{goal_id}'");
    } else {
        println!("Goal '{goal_id}' is already tracked");
    }
    Ok(())
}

/// Execute `waypoint goal promote|complete|archive`
pub fn execute_goal_move_command(
    handle: &WorkflowHandle,
    project: &str,
    goal_id: &str,
    action: &str,
) -> Result<()> {
    let stage = match action {
        "promote" => {
            handle.promote_goal(project, goal_id)?;
            "selected"
        }
        "complete" => {
            handle.complete_goal(project, goal_id)?;
            "completed"
        }
        "archive" => {
            handle.archive_goal(project, goal_id)?;
            "archived"
        }
        other => anyhow::bail!("unknown goal action: {other}"),
    };
    println!("✓ Goal '{goal_id}' is now {stage}");
    Ok(())
}

/// Execute `waypoint blocker add`
pub fn execute_blocker_add_command(
    handle: &WorkflowHandle,
    project: &str,
    description: &str,
) -> Result<()> {
    let id = handle.record_blocker(project, description)?;
    println!("✓ Recorded blocker {id}");
    Ok(())
}

/// Execute `waypoint blocker resolve`
pub fn execute_blocker_resolve_command(
    handle: &WorkflowHandle,
    project: &str,
    id: &str,
) -> Result<()> {
    if handle.resolve_blocker(project, id)? {
        println!("✓ Resolved blocker {id}");
    } else {
        println!("Blocker {id} was already resolved");
    }
    Ok(())
}

/// Execute `waypoint feature`
pub fn execute_feature_command(
    handle: &WorkflowHandle,
    project: &str,
    name: &str,
    json: bool,
) -> Result<()> {
    let changed = handle.set_feature_name(project, name)?;
    if json {
        return print_json(&json!({ "featureName": name, "changed": changed }));
    }

    if changed {
        println!("✓ Feature named '{name}'");
    } else {
        println!("Feature is already named '{name}'");
    }
    Ok(())
}

/// Execute `waypoint clarify add`
pub fn execute_clarify_add_command(
    handle: &WorkflowHandle,
    project: &str,
    question: &str,
) -> Result<()> {
    if handle.add_clarification(project, question)? {
        println!("✓ Opened clarification: {question}");
    } else {
        println!("Clarification is already open: {question}");
    }
    Ok(())
}

/// Execute `waypoint clarify resolve`
pub fn execute_clarify_resolve_command(
    handle: &WorkflowHandle,
    project: &str,
    question: &str,
) -> Result<()> {
    if handle.resolve_clarification(project, question)? {
        println!("✓ Resolved clarification: {question}");
    } else {
        println!("No open clarification matches: {question}");
    }
    Ok(())
}

/// Execute `waypoint complete`
pub fn execute_complete_command(
    handle: &WorkflowHandle,
    project: &str,
    skip_validation: bool,
    json: bool,
) -> Result<()> {
    let state = handle.complete_workflow(project, skip_validation)?;
    if json {
        return print_json(&state);
    }

    println!("✓ Workflow '{}' complete", state.name);
    if let Some((_, _, true)) = last_transition(&state) {
        println!("  Validation skipped (recorded in the transition history)");
    }
    Ok(())
}
