//! Operation façade over the waypoint components.
//!
//! Every operation is one load → compute → save cycle against the record for a project
//! path. Pure components (detector, rules, gate, handoff) receive a snapshot and return a new
//! value; only [`StateManager::save`] writes.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use waypoint_config::{CliArgs, Config};
use waypoint_detector::{DriftRecord, reconcile};
use waypoint_handoff::HandoffResult;
use waypoint_rules::{NextSteps, NextStepsStatus, RuleContext, Suggestion, builtin_rules, suggest_next};
use waypoint_state::{GoalDetail, StateManager, WorkflowState, WorkflowType};
use waypoint_utils::error::{ConfigError, WaypointError};
use waypoint_utils::logging::operation_span;

use crate::observe::observe;
use crate::status::StatusReport;

/// Suggestions plus whatever drift was reconciled to produce them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStepsReport {
    pub status: NextStepsStatus,
    pub suggestions: Vec<Suggestion>,
    /// Empty when sync was skipped or nothing drifted
    pub drift: Vec<DriftRecord>,
}

/// The primary public API for embedding waypoint.
///
/// A handle pairs a [`StateManager`] with the effective [`Config`]. It holds no workflow
/// state between calls: each method reloads the record, so two handles on the same home see
/// each other's writes. One live writer per project path is assumed.
///
/// # Construction
///
/// - [`WorkflowHandle::new`]: configuration discovered from the working directory, as the CLI does
/// - [`WorkflowHandle::from_config`]: explicit configuration, no environment probing
///
/// # Example
///
/// ```rust,no_run
/// use waypoint_engine::WorkflowHandle;
///
/// let handle = WorkflowHandle::new()?;
/// handle.initialize("/work/checkout", "project-management", false)?;
/// let next = handle.get_next_steps("/work/checkout", None, false)?;
/// for suggestion in next.suggestions {
///     println!("[{}] {}", suggestion.tier, suggestion.action);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowHandle {
    manager: StateManager,
    config: Config,
}

impl WorkflowHandle {
    /// Create a handle using configuration discovered from the working directory.
    ///
    /// # Errors
    ///
    /// Returns `Config` errors when discovery or validation fails.
    pub fn new() -> Result<Self, WaypointError> {
        let config = Config::discover(&CliArgs::default()).map_err(discovery_failed)?;
        Ok(Self::from_config(config))
    }

    /// Create a handle using explicit configuration.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let manager = StateManager::new(config.state_home());
        Self { manager, config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn manager(&self) -> &StateManager {
        &self.manager
    }

    /// Create and persist a new workflow with its first phase started.
    ///
    /// Fails with `AlreadyExists` unless `overwrite` is set.
    pub fn initialize(
        &self,
        project_path: &str,
        workflow_type: &str,
        overwrite: bool,
    ) -> Result<WorkflowState, WaypointError> {
        let _span = operation_span(project_path, "initialize").entered();

        let created = self
            .manager
            .create(project_path, WorkflowType::from(workflow_type), overwrite)?;
        let mut state = waypoint_gate::begin(&created, created.created);
        self.manager.save(&mut state)?;

        info!(
            workflow_type = %state.workflow_type,
            phase = %state.current_phase,
            "workflow initialized"
        );
        Ok(state)
    }

    /// Ranked next actions, after reconciling with the filesystem unless `skip_sync` is set.
    ///
    /// Drift found while reconciling is persisted before the rules run.
    pub fn get_next_steps(
        &self,
        project_path: &str,
        max_suggestions: Option<usize>,
        skip_sync: bool,
    ) -> Result<NextStepsReport, WaypointError> {
        let _span = operation_span(project_path, "get_next_steps").entered();

        let mut state = self.manager.load(project_path)?;
        let drift = if skip_sync {
            Vec::new()
        } else {
            self.sync_state(&mut state)?
        };

        let now = Utc::now();
        let ctx = RuleContext::new(&state, now, self.config.review_after_days());
        let rules = builtin_rules(&state.workflow_type);
        let max = max_suggestions.unwrap_or_else(|| self.config.max_suggestions());
        let NextSteps {
            status,
            suggestions,
        } = suggest_next(&ctx, &rules, max);

        Ok(NextStepsReport {
            status,
            suggestions,
            drift,
        })
    }

    /// Read-only summary; does not reconcile
    pub fn get_status(&self, project_path: &str) -> Result<StatusReport, WaypointError> {
        let _span = operation_span(project_path, "get_status").entered();
        let state = self.manager.load(project_path)?;
        StatusReport::from_state(&state)
    }

    /// Move to `target_phase` (default: the next phase).
    pub fn advance_phase(
        &self,
        project_path: &str,
        target_phase: Option<&str>,
        skip_validation: bool,
    ) -> Result<WorkflowState, WaypointError> {
        let _span = operation_span(project_path, "advance_phase").entered();

        let state = self.manager.load(project_path)?;
        let mut next = waypoint_gate::advance(&state, target_phase, skip_validation, Utc::now())?;
        self.manager.save(&mut next)?;
        Ok(next)
    }

    /// Readiness of the next transition; `None` once the workflow is complete
    pub fn validate_readiness(
        &self,
        project_path: &str,
    ) -> Result<Option<waypoint_gate::TransitionCheck>, WaypointError> {
        let _span = operation_span(project_path, "validate_readiness").entered();
        let state = self.manager.load(project_path)?;
        waypoint_gate::readiness(&state)
    }

    /// Prepare the call that hands `goal_id` to a built-in consumer.
    ///
    /// The state is only written the first time a given goal is handed to that consumer.
    pub fn prepare_handoff(
        &self,
        project_path: &str,
        consumer: &str,
        goal_id: &str,
    ) -> Result<HandoffResult, WaypointError> {
        let _span = operation_span(project_path, "prepare_handoff").entered();

        let state = self.manager.load(project_path)?;
        let mut result =
            waypoint_handoff::prepare_builtin_handoff(&state, consumer, goal_id, Utc::now())?;
        if !result.already_handed_off {
            self.manager.save(&mut result.updated_state)?;
        }
        Ok(result)
    }

    /// Reconcile with the filesystem and persist any drift
    pub fn sync(&self, project_path: &str) -> Result<Vec<DriftRecord>, WaypointError> {
        let _span = operation_span(project_path, "sync").entered();
        let mut state = self.manager.load(project_path)?;
        self.sync_state(&mut state)
    }

    /// Mark `step` done in `phase` (default: the current phase). `false` if already done.
    pub fn complete_step(
        &self,
        project_path: &str,
        phase: Option<&str>,
        step: &str,
    ) -> Result<bool, WaypointError> {
        self.mutate(project_path, "complete_step", |state, now| {
            state.complete_step(phase, step, now)
        })
    }

    /// Track a new potential goal, optionally with its details. `false` if already potential.
    pub fn add_goal(
        &self,
        project_path: &str,
        goal_id: &str,
        detail: Option<GoalDetail>,
    ) -> Result<bool, WaypointError> {
        self.mutate(project_path, "add_goal", |state, _| {
            let added = state.add_goal(goal_id)?;
            if let Some(detail) = detail {
                state.custom_data.set_goal_detail(goal_id, detail);
            }
            Ok(added)
        })
    }

    pub fn promote_goal(&self, project_path: &str, goal_id: &str) -> Result<(), WaypointError> {
        self.mutate(project_path, "promote_goal", |state, _| {
            state.promote_goal(goal_id)
        })
    }

    pub fn complete_goal(&self, project_path: &str, goal_id: &str) -> Result<(), WaypointError> {
        self.mutate(project_path, "complete_goal", |state, _| {
            state.complete_goal(goal_id)
        })
    }

    pub fn archive_goal(&self, project_path: &str, goal_id: &str) -> Result<(), WaypointError> {
        self.mutate(project_path, "archive_goal", |state, _| {
            state.archive_goal(goal_id)
        })
    }

    /// Record a blocker; returns its generated id
    pub fn record_blocker(
        &self,
        project_path: &str,
        description: &str,
    ) -> Result<String, WaypointError> {
        self.mutate(project_path, "record_blocker", |state, now| {
            Ok(state.record_blocker(description, now))
        })
    }

    /// `false` if the blocker was already resolved
    pub fn resolve_blocker(&self, project_path: &str, id: &str) -> Result<bool, WaypointError> {
        self.mutate(project_path, "resolve_blocker", |state, now| {
            state.resolve_blocker(id, now)
        })
    }

    /// Archive the workflow in place by completing its terminal phase
    pub fn complete_workflow(
        &self,
        project_path: &str,
        skip_validation: bool,
    ) -> Result<WorkflowState, WaypointError> {
        let _span = operation_span(project_path, "complete_workflow").entered();

        let state = self.manager.load(project_path)?;
        let mut done = waypoint_gate::complete_workflow(&state, skip_validation, Utc::now())?;
        self.manager.save(&mut done)?;
        info!(phase = %done.current_phase, "workflow completed");
        Ok(done)
    }

    /// Store a free-form value in the workflow's custom data.
    ///
    /// Returns `false`, without writing, for workflow types that carry no key/value data.
    pub fn set_custom_value(
        &self,
        project_path: &str,
        key: &str,
        value: Value,
    ) -> Result<bool, WaypointError> {
        self.mutate(project_path, "set_custom_value", |state, _| {
            Ok(state.custom_data.set_value(key, value))
        })
    }

    /// Name the feature a spec-driven workflow specifies. `false` if it already had that name.
    pub fn set_feature_name(&self, project_path: &str, name: &str) -> Result<bool, WaypointError> {
        self.mutate(project_path, "set_feature_name", |state, _| {
            state.set_feature_name(name)
        })
    }

    /// Open a clarification question on a spec-driven workflow
    pub fn add_clarification(
        &self,
        project_path: &str,
        question: &str,
    ) -> Result<bool, WaypointError> {
        self.mutate(project_path, "add_clarification", |state, _| {
            state.add_clarification(question)
        })
    }

    /// `false` if no open clarification has exactly this text
    pub fn resolve_clarification(
        &self,
        project_path: &str,
        question: &str,
    ) -> Result<bool, WaypointError> {
        self.mutate(project_path, "resolve_clarification", |state, _| {
            state.resolve_clarification(question)
        })
    }

    /// Load, apply `f`, and save only if the state changed
    fn mutate<T>(
        &self,
        project_path: &str,
        operation: &str,
        f: impl FnOnce(&mut WorkflowState, DateTime<Utc>) -> Result<T, WaypointError>,
    ) -> Result<T, WaypointError> {
        let _span = operation_span(project_path, operation).entered();

        let mut state = self.manager.load(project_path)?;
        let before = state.clone();
        let outcome = f(&mut state, Utc::now())?;

        if state == before {
            debug!("no change to persist");
        } else {
            self.manager.save(&mut state)?;
        }
        Ok(outcome)
    }

    /// Observe the project directory, reconcile, and persist the merged state if it drifted
    fn sync_state(&self, state: &mut WorkflowState) -> Result<Vec<DriftRecord>, WaypointError> {
        let observations = observe(Path::new(&state.project_path), &self.config.layout)?;
        let reconciliation = reconcile(state, &observations);
        if !reconciliation.has_changes() {
            return Ok(Vec::new());
        }

        *state = reconciliation.merged_state;
        self.manager.save(state)?;
        info!(changes = reconciliation.changes.len(), "drift reconciled");
        Ok(reconciliation.changes)
    }
}

fn discovery_failed(err: anyhow::Error) -> WaypointError {
    match err.downcast::<WaypointError>() {
        Ok(err) => err,
        Err(err) => WaypointError::Config(ConfigError::DiscoveryFailed {
            reason: format!("{err:#}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use waypoint_state::PhaseState;

    /// Handle with an isolated state home plus a project directory
    fn setup() -> (TempDir, WorkflowHandle, String) {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let config = Config::builder()
            .state_dir(home.to_str().unwrap())
            .build()
            .unwrap();
        let project = project.to_str().unwrap().to_string();
        (temp, WorkflowHandle::from_config(config), project)
    }

    #[test]
    fn test_initialize_starts_first_phase() {
        let (_temp, handle, project) = setup();

        handle.initialize(&project, "demo", false).unwrap();
        let status = handle.get_status(&project).unwrap();

        assert_eq!(status.current_phase, "initialization");
        assert_eq!(status.phases[0].status, PhaseState::InProgress);
        assert!(
            status.phases[1..]
                .iter()
                .all(|p| p.status == PhaseState::NotStarted)
        );

        assert!(matches!(
            handle.initialize(&project, "demo", false),
            Err(WaypointError::AlreadyExists { .. })
        ));
        assert!(handle.initialize(&project, "spec-driven", true).is_ok());
    }

    #[test]
    fn test_next_steps_reconciles_goal_files() {
        let (_temp, handle, project) = setup();
        handle.initialize(&project, "project-management", false).unwrap();
        fs::create_dir_all(Path::new(&project).join("goals")).unwrap();
        fs::write(Path::new(&project).join("goals/g1.md"), "# One").unwrap();

        let next = handle.get_next_steps(&project, None, false).unwrap();
        assert_eq!(next.drift.len(), 1);
        assert_eq!(next.status, NextStepsStatus::Actionable);

        let state = handle.manager().load(&project).unwrap();
        assert_eq!(state.goals.potential, vec!["g1".to_string()]);

        // second pass sees no drift
        assert!(handle.sync(&project).unwrap().is_empty());
    }

    #[test]
    fn test_skip_sync_leaves_state_alone() {
        let (_temp, handle, project) = setup();
        handle.initialize(&project, "project-management", false).unwrap();
        fs::create_dir_all(Path::new(&project).join("goals")).unwrap();
        fs::write(Path::new(&project).join("goals/g1.md"), "").unwrap();

        let next = handle.get_next_steps(&project, Some(1), true).unwrap();
        assert!(next.drift.is_empty());
        assert!(next.suggestions.len() <= 1);
        assert!(handle.manager().load(&project).unwrap().goals.potential.is_empty());
    }

    #[test]
    fn test_pm_walkthrough() {
        let (_temp, handle, project) = setup();
        handle.initialize(&project, "project-management", false).unwrap();

        for step in ["create-structure", "capture-vision"] {
            assert!(handle.complete_step(&project, None, step).unwrap());
        }
        assert!(!handle.complete_step(&project, None, "capture-vision").unwrap());
        handle.advance_phase(&project, None, false).unwrap();

        for step in ["brainstorm-goals", "evaluate-goals", "select-goals"] {
            handle.complete_step(&project, None, step).unwrap();
        }
        handle
            .add_goal(
                &project,
                "g1",
                Some(GoalDetail {
                    name: "Faster checkout".to_string(),
                    ..GoalDetail::default()
                }),
            )
            .unwrap();

        let err = handle.advance_phase(&project, None, false).unwrap_err();
        assert!(matches!(err, WaypointError::Blocked { .. }));

        handle.promote_goal(&project, "g1").unwrap();
        let state = handle.advance_phase(&project, None, false).unwrap();
        assert_eq!(state.current_phase, "execution");

        let handoff = handle.prepare_handoff(&project, "spec-driven", "g1").unwrap();
        assert_eq!(handoff.suggested_call.params["goalContext"]["name"], "Faster checkout");
        let again = handle.prepare_handoff(&project, "spec-driven", "g1").unwrap();
        assert!(again.already_handed_off);
        assert_eq!(again.suggested_call, handoff.suggested_call);

        let stored = handle.manager().load(&project).unwrap();
        assert_eq!(stored.integrations["spec-driven"].handoff_ids, vec!["g1".to_string()]);
    }

    #[test]
    fn test_blockers_round_trip() {
        let (_temp, handle, project) = setup();
        handle.initialize(&project, "demo", false).unwrap();

        let id = handle.record_blocker(&project, "waiting on legal").unwrap();
        assert_eq!(id, "B-1");
        let status = handle.get_status(&project).unwrap();
        assert_eq!(status.open_blockers.len(), 1);

        assert!(handle.resolve_blocker(&project, &id).unwrap());
        assert!(handle.get_status(&project).unwrap().open_blockers.is_empty());
        assert!(matches!(
            handle.resolve_blocker(&project, "B-9"),
            Err(WaypointError::UnknownBlocker { .. })
        ));
    }

    #[test]
    fn test_set_custom_value_by_domain() {
        let (_temp, handle, project) = setup();
        handle.initialize(&project, "demo", false).unwrap();
        assert!(handle
            .set_custom_value(&project, "owner", Value::String("ana".to_string()))
            .unwrap());

        handle.initialize(&project, "project-management", true).unwrap();
        assert!(!handle
            .set_custom_value(&project, "owner", Value::String("ana".to_string()))
            .unwrap());
    }

    fn fired_rules(handle: &WorkflowHandle, project: &str) -> Vec<String> {
        handle
            .get_next_steps(project, Some(20), true)
            .unwrap()
            .suggestions
            .into_iter()
            .map(|s| s.rule_id)
            .collect()
    }

    #[test]
    fn test_naming_the_feature_clears_its_suggestion() {
        let (_temp, handle, project) = setup();
        handle.initialize(&project, "spec-driven", false).unwrap();
        handle
            .advance_phase(&project, Some("specification"), true)
            .unwrap();
        assert!(fired_rules(&handle, &project).contains(&"sdd-name-feature".to_string()));

        assert!(handle.set_feature_name(&project, "checkout").unwrap());
        assert!(!handle.set_feature_name(&project, "checkout").unwrap());
        assert!(!fired_rules(&handle, &project).contains(&"sdd-name-feature".to_string()));
        let state = handle.manager().load(&project).unwrap();
        assert_eq!(state.custom_data.feature_name(), Some("checkout"));
    }

    #[test]
    fn test_clarifications_gate_planning_until_resolved() {
        let (_temp, handle, project) = setup();
        handle.initialize(&project, "spec-driven", false).unwrap();
        handle
            .advance_phase(&project, Some("specification"), true)
            .unwrap();
        handle.set_feature_name(&project, "checkout").unwrap();
        handle
            .advance_phase(&project, Some("clarification"), true)
            .unwrap();

        assert!(handle.add_clarification(&project, "Guest checkout?").unwrap());
        assert!(fired_rules(&handle, &project).contains(&"sdd-resolve-clarifications".to_string()));
        handle
            .complete_step(&project, None, "resolve-ambiguities")
            .unwrap();
        assert!(matches!(
            handle.advance_phase(&project, Some("planning"), false),
            Err(WaypointError::Blocked { .. })
        ));

        assert!(handle.resolve_clarification(&project, "Guest checkout?").unwrap());
        assert!(!handle.resolve_clarification(&project, "Guest checkout?").unwrap());
        let fired = fired_rules(&handle, &project);
        assert!(!fired.contains(&"sdd-resolve-clarifications".to_string()));
        let state = handle.advance_phase(&project, Some("planning"), false).unwrap();
        assert_eq!(state.current_phase, "planning");
    }

    #[test]
    fn test_spec_fields_need_a_spec_driven_workflow() {
        let (_temp, handle, project) = setup();
        handle.initialize(&project, "project-management", false).unwrap();
        assert!(matches!(
            handle.set_feature_name(&project, "checkout"),
            Err(WaypointError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            handle.add_clarification(&project, "Why?"),
            Err(WaypointError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_missing_project_is_not_found() {
        let (_temp, handle, _project) = setup();
        assert!(matches!(
            handle.get_status("/nowhere"),
            Err(WaypointError::NotFound { .. })
        ));
    }
}
