//! Prerequisite evaluation for phase transitions.
//!
//! Every prerequisite is evaluated, even after one fails, so the caller sees the full list
//! of blockers at once.

use waypoint_state::{PhaseDefinition, PhaseState, WorkflowState, WorkflowType};
use waypoint_utils::error::WaypointError;

use crate::types::{GateCondition, TransitionCheck};

/// Check whether `state` may move to `target` (default: the next phase).
///
/// Unreachable targets (the current phase, an earlier phase, a phase the domain does not
/// define, or anything past the terminal phase) are [`WaypointError::InvalidTarget`], not a
/// failed check.
pub fn can_advance(
    state: &WorkflowState,
    target: Option<&str>,
) -> Result<TransitionCheck, WaypointError> {
    let (from_index, to_index, to) = resolve_target(state, target)?;
    let from = state.current_phase.as_str();

    let mut conditions = Vec::new();
    let mut blockers = Vec::new();

    let steps_passed = evaluate_steps_complete(state, from, &mut conditions, &mut blockers);
    let blockers_passed = evaluate_open_blockers(state, &mut conditions, &mut blockers);
    let skipped_passed =
        evaluate_skipped_phases(state, from_index, to_index, &mut conditions, &mut blockers);
    let domain_passed =
        evaluate_domain_prerequisites(state, to, &mut conditions, &mut blockers);

    let allowed = steps_passed && blockers_passed && skipped_passed && domain_passed;
    let summary = if allowed {
        format!("Ready to advance from '{from}' to '{}'", to.name)
    } else {
        format!(
            "Cannot advance from '{from}' to '{}': {} prerequisite(s) unmet",
            to.name,
            blockers.len()
        )
    };

    Ok(TransitionCheck {
        from: from.to_string(),
        to: to.name.to_string(),
        allowed,
        summary,
        conditions,
        blockers,
    })
}

/// Check whether the workflow may be completed in place.
///
/// Only a workflow whose current phase is the terminal phase, and not yet complete, can be
/// completed.
pub fn can_complete(state: &WorkflowState) -> Result<TransitionCheck, WaypointError> {
    let domain = state.domain();
    let terminal = domain.terminal_phase();
    let from = state.current_phase.as_str();

    if from != terminal.name {
        return Err(WaypointError::InvalidTarget {
            from: from.to_string(),
            target: terminal.name.to_string(),
            reason: format!(
                "a workflow can only be completed from its terminal phase '{}'",
                terminal.name
            ),
        });
    }
    if state.phase_state(terminal.name) == Some(PhaseState::Complete) {
        return Err(WaypointError::InvalidTarget {
            from: from.to_string(),
            target: terminal.name.to_string(),
            reason: "the workflow is already complete".to_string(),
        });
    }

    let mut conditions = Vec::new();
    let mut blockers = Vec::new();

    let steps_passed = evaluate_steps_complete(state, from, &mut conditions, &mut blockers);
    let blockers_passed = evaluate_open_blockers(state, &mut conditions, &mut blockers);
    let domain_passed =
        evaluate_domain_prerequisites(state, terminal, &mut conditions, &mut blockers);

    let allowed = steps_passed && blockers_passed && domain_passed;
    let summary = if allowed {
        format!("Ready to complete the workflow at '{from}'")
    } else {
        format!(
            "Cannot complete the workflow: {} prerequisite(s) unmet",
            blockers.len()
        )
    };

    Ok(TransitionCheck {
        from: from.to_string(),
        to: from.to_string(),
        allowed,
        summary,
        conditions,
        blockers,
    })
}

/// Readiness of whatever comes next: the following phase, or completion at the terminal
/// phase. `None` once the workflow is complete.
pub fn readiness(state: &WorkflowState) -> Result<Option<TransitionCheck>, WaypointError> {
    let terminal = state.domain().terminal_phase().name;
    if state.current_phase != terminal {
        return can_advance(state, None).map(Some);
    }
    if state.phase_state(terminal) == Some(PhaseState::Complete) {
        return Ok(None);
    }
    can_complete(state).map(Some)
}

/// Resolve the target phase to (from index, to index, definition)
fn resolve_target(
    state: &WorkflowState,
    target: Option<&str>,
) -> Result<(usize, usize, &'static PhaseDefinition), WaypointError> {
    let domain = state.domain();
    let from = state.current_phase.as_str();
    let invalid = |target: &str, reason: String| WaypointError::InvalidTarget {
        from: from.to_string(),
        target: target.to_string(),
        reason,
    };

    let from_index = domain.index_of(from).ok_or_else(|| {
        invalid(
            target.unwrap_or(from),
            format!("current phase is not defined for {} workflows", state.workflow_type),
        )
    })?;

    let Some(target) = target else {
        return match domain.phases.get(from_index + 1) {
            Some(next) => Ok((from_index, from_index + 1, next)),
            None => Err(invalid(
                from,
                "already at the terminal phase; complete the workflow instead".to_string(),
            )),
        };
    };

    let Some(to_index) = domain.index_of(target) else {
        let known: Vec<_> = domain.phase_names().collect();
        return Err(invalid(
            target,
            format!(
                "not a phase of {} workflows (phases: {})",
                state.workflow_type,
                known.join(", ")
            ),
        ));
    };

    if to_index == from_index {
        return Err(invalid(target, "the workflow is already in this phase".to_string()));
    }
    if to_index < from_index {
        return Err(invalid(
            target,
            "phases never move backwards; record rework as a step of the current phase"
                .to_string(),
        ));
    }

    Ok((from_index, to_index, &domain.phases[to_index]))
}

fn evaluate_steps_complete(
    state: &WorkflowState,
    phase: &str,
    conditions: &mut Vec<GateCondition>,
    blockers: &mut Vec<String>,
) -> bool {
    let total = state.domain().phase(phase).map_or(0, |p| p.steps.len());
    let remaining = state.remaining_steps(phase);
    let passed = remaining.is_empty();

    conditions.push(GateCondition {
        name: format!("Steps complete: {phase}"),
        description: format!("Every step of phase '{phase}' is marked complete"),
        passed,
        actual: Some(format!("{}/{total} steps complete", total - remaining.len())),
        expected: Some(format!("{total}/{total} steps complete")),
    });

    if !passed {
        blockers.push(format!(
            "Phase '{phase}' has {} incomplete step(s): {}",
            remaining.len(),
            remaining.join(", ")
        ));
    }

    passed
}

fn evaluate_open_blockers(
    state: &WorkflowState,
    conditions: &mut Vec<GateCondition>,
    blockers: &mut Vec<String>,
) -> bool {
    let open: Vec<_> = state.open_blockers().collect();
    let passed = open.is_empty();

    conditions.push(GateCondition {
        name: "No open blockers".to_string(),
        description: "Every recorded blocker is resolved".to_string(),
        passed,
        actual: Some(format!("{} open", open.len())),
        expected: Some("0 open".to_string()),
    });

    if !passed {
        let listed: Vec<_> = open
            .iter()
            .map(|b| format!("{} ({})", b.id, b.description))
            .collect();
        blockers.push(format!(
            "{} unresolved blocker(s): {}",
            open.len(),
            listed.join("; ")
        ));
    }

    passed
}

/// Every phase strictly between the current phase and the target must already be complete
fn evaluate_skipped_phases(
    state: &WorkflowState,
    from_index: usize,
    to_index: usize,
    conditions: &mut Vec<GateCondition>,
    blockers: &mut Vec<String>,
) -> bool {
    let mut passed = true;
    for skipped in &state.domain().phases[from_index + 1..to_index] {
        let status = state.phase_state(skipped.name);
        let complete = status == Some(PhaseState::Complete);

        conditions.push(GateCondition {
            name: format!("Skipped phase complete: {}", skipped.name),
            description: format!(
                "Phase '{}' lies between the current phase and the target",
                skipped.name
            ),
            passed: complete,
            actual: status.map(|s| s.to_string()),
            expected: Some(PhaseState::Complete.to_string()),
        });

        if !complete {
            blockers.push(format!(
                "Phase '{}' would be skipped but is not complete",
                skipped.name
            ));
            passed = false;
        }
    }
    passed
}

/// Entry criteria specific to a domain's phase
fn evaluate_domain_prerequisites(
    state: &WorkflowState,
    target: &PhaseDefinition,
    conditions: &mut Vec<GateCondition>,
    blockers: &mut Vec<String>,
) -> bool {
    match &state.workflow_type {
        WorkflowType::ProjectManagement => match target.name {
            "execution" => evaluate_goals_selected(state, conditions, blockers),
            "completion" => evaluate_selected_goals_settled(state, conditions, blockers),
            _ => true,
        },
        WorkflowType::SpecDriven => {
            let domain = state.domain();
            match (domain.index_of(target.name), domain.index_of("planning")) {
                (Some(to), Some(planning)) if to >= planning => {
                    evaluate_clarifications_resolved(state, conditions, blockers)
                }
                _ => true,
            }
        }
        WorkflowType::Generic(_) => true,
    }
}

fn evaluate_goals_selected(
    state: &WorkflowState,
    conditions: &mut Vec<GateCondition>,
    blockers: &mut Vec<String>,
) -> bool {
    let selected = state.goals.selected.len();
    let passed = selected > 0;

    conditions.push(GateCondition {
        name: "Goals selected".to_string(),
        description: "At least one goal is in 'selected' before execution starts".to_string(),
        passed,
        actual: Some(format!("{selected} selected")),
        expected: Some(">= 1 selected".to_string()),
    });

    if !passed {
        let hint = if state.goals.potential.is_empty() {
            "add and promote a goal first"
        } else {
            "promote one of the potential goals"
        };
        blockers.push(format!(
            "At least one selected goal is required before execution ({hint})"
        ));
    }

    passed
}

fn evaluate_selected_goals_settled(
    state: &WorkflowState,
    conditions: &mut Vec<GateCondition>,
    blockers: &mut Vec<String>,
) -> bool {
    let pending = &state.goals.selected;
    let passed = pending.is_empty();

    conditions.push(GateCondition {
        name: "Selected goals settled".to_string(),
        description: "Every selected goal is completed or archived".to_string(),
        passed,
        actual: Some(format!("{} selected", pending.len())),
        expected: Some("0 selected".to_string()),
    });

    if !passed {
        blockers.push(format!(
            "{} selected goal(s) still pending: {} (complete or archive them)",
            pending.len(),
            pending.join(", ")
        ));
    }

    passed
}

fn evaluate_clarifications_resolved(
    state: &WorkflowState,
    conditions: &mut Vec<GateCondition>,
    blockers: &mut Vec<String>,
) -> bool {
    let open = state.custom_data.open_clarifications();
    let passed = open.is_empty();

    conditions.push(GateCondition {
        name: "Clarifications resolved".to_string(),
        description: "No open clarification remains before planning".to_string(),
        passed,
        actual: Some(format!("{} open", open.len())),
        expected: Some("0 open".to_string()),
    });

    if !passed {
        blockers.push(format!(
            "{} open clarification(s) must be resolved before planning: {}",
            open.len(),
            open.join("; ")
        ));
    }

    passed
}
