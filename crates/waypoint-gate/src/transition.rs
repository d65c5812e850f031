//! Phase transitions.
//!
//! Each function takes a snapshot and returns the transitioned copy; persisting it is the
//! caller's job. Phase status only ever moves forward: not-started, in-progress, complete.

use chrono::{DateTime, Utc};
use tracing::warn;

use waypoint_state::{PhaseState, TransitionRecord, WorkflowState};
use waypoint_utils::error::WaypointError;
use waypoint_utils::logging::log_phase_transition;

use crate::types::TransitionCheck;
use crate::validator::{can_advance, can_complete};

/// Start the current phase of a freshly created workflow
#[must_use]
pub fn begin(state: &WorkflowState, now: DateTime<Utc>) -> WorkflowState {
    let mut next = state.clone();
    let phase = next.current_phase.clone();
    start_phase(&mut next, &phase, now);
    next.current_step = first_remaining_step(&next, &phase);
    next
}

/// Move to `target` (default: the next phase).
///
/// Fails with [`WaypointError::Blocked`] when a prerequisite is unmet, unless
/// `skip_validation` is set; a skipped validation is logged and recorded in the transition
/// audit trail. Unreachable targets fail regardless of `skip_validation`.
pub fn advance(
    state: &WorkflowState,
    target: Option<&str>,
    skip_validation: bool,
    now: DateTime<Utc>,
) -> Result<WorkflowState, WaypointError> {
    let check = can_advance(state, target)?;
    enforce(state, &check, skip_validation)?;

    let mut next = state.clone();
    finish_phase(&mut next, &check.from, now);
    start_phase(&mut next, &check.to, now);
    next.current_phase = check.to.clone();
    next.current_step = first_remaining_step(&next, &check.to);
    record_transition(&mut next, &check, skip_validation, now);

    Ok(next)
}

/// Archive the workflow in place by completing its terminal phase.
///
/// The record is kept; a transition from the terminal phase to itself marks the moment.
pub fn complete_workflow(
    state: &WorkflowState,
    skip_validation: bool,
    now: DateTime<Utc>,
) -> Result<WorkflowState, WaypointError> {
    let check = can_complete(state)?;
    enforce(state, &check, skip_validation)?;

    let mut next = state.clone();
    // a terminal phase entered without starting it still gets a start time
    start_phase(&mut next, &check.from, now);
    finish_phase(&mut next, &check.from, now);
    next.current_step = None;
    record_transition(&mut next, &check, skip_validation, now);

    Ok(next)
}

fn enforce(
    state: &WorkflowState,
    check: &TransitionCheck,
    skip_validation: bool,
) -> Result<(), WaypointError> {
    if check.allowed {
        return Ok(());
    }
    if !skip_validation {
        return Err(WaypointError::Blocked {
            from: check.from.clone(),
            target: check.to.clone(),
            blockers: check.blockers.clone(),
        });
    }
    warn!(
        project = %state.project_path,
        from = %check.from,
        to = %check.to,
        bypassed = ?check.blockers,
        "phase validation skipped"
    );
    Ok(())
}

fn start_phase(state: &mut WorkflowState, phase: &str, now: DateTime<Utc>) {
    if let Some(status) = state.phases.get_mut(phase)
        && status.status == PhaseState::NotStarted
    {
        status.status = PhaseState::InProgress;
        status.started_at = Some(now);
    }
}

fn finish_phase(state: &mut WorkflowState, phase: &str, now: DateTime<Utc>) {
    if let Some(status) = state.phases.get_mut(phase)
        && status.status == PhaseState::InProgress
    {
        status.status = PhaseState::Complete;
        status.completed_at = Some(now);
    }
}

fn first_remaining_step(state: &WorkflowState, phase: &str) -> Option<String> {
    state
        .remaining_steps(phase)
        .first()
        .map(|step| (*step).to_string())
}

fn record_transition(
    state: &mut WorkflowState,
    check: &TransitionCheck,
    skip_validation: bool,
    now: DateTime<Utc>,
) {
    state.transitions.push(TransitionRecord {
        from: check.from.clone(),
        to: check.to.clone(),
        at: now,
        validation_skipped: skip_validation,
    });
    log_phase_transition(&state.project_path, &check.from, &check.to, skip_validation);
}
