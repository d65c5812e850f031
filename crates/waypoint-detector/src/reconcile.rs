use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::{AsRefStr, Display};
use tracing::{debug, warn};

use waypoint_state::{GoalStage, IntegrationRecord, WorkflowState};

use crate::observations::{ObservedItem, Observations};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DriftCategory {
    Goals,
    ActiveWorkflows,
    Integrations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Renamed,
}

/// One detected discrepancy, in words a user can act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftRecord {
    pub category: DriftCategory,
    pub change_type: ChangeType,
    pub path: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub merged_state: WorkflowState,
    /// Ordered by category (goals, active workflows, integrations), then observation order;
    /// removals follow the additions of their category in state order.
    pub changes: Vec<DriftRecord>,
}

impl Reconciliation {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Merge `observations` into a copy of `state` and list what changed.
///
/// Running it again with the same observations on the merged state yields no changes.
#[must_use]
pub fn reconcile(state: &WorkflowState, observations: &Observations) -> Reconciliation {
    let mut merged = state.clone();
    let mut changes = Vec::new();

    if let Some(goals) = &observations.goals {
        reconcile_goals(&mut merged, &dedup(goals), &mut changes);
    }
    if let Some(workflows) = &observations.workflows {
        reconcile_workflows(&mut merged, &dedup(workflows), &mut changes);
    }
    if let Some(integrations) = &observations.integrations {
        reconcile_integrations(&mut merged, &dedup(integrations), &mut changes);
    }

    debug!(
        project = %state.project_path,
        changes = changes.len(),
        "reconciliation complete"
    );

    Reconciliation {
        merged_state: merged,
        changes,
    }
}

/// First occurrence of each id wins
fn dedup(items: &[ObservedItem]) -> Vec<&ObservedItem> {
    let mut seen = HashSet::new();
    items.iter().filter(|i| seen.insert(i.id.as_str())).collect()
}

fn record(
    changes: &mut Vec<DriftRecord>,
    category: DriftCategory,
    change_type: ChangeType,
    path: String,
    details: String,
) {
    changes.push(DriftRecord {
        category,
        change_type,
        path,
        details,
    });
}

/// The id `item` was renamed from, unless that id is itself still observed
fn rename_source<'i>(item: &'i ObservedItem, observed_ids: &HashSet<&str>) -> Option<&'i str> {
    item.renamed_from
        .as_deref()
        .filter(|previous| !observed_ids.contains(previous))
}

fn reconcile_goals(
    state: &mut WorkflowState,
    observed: &[&ObservedItem],
    changes: &mut Vec<DriftRecord>,
) {
    let category = DriftCategory::Goals;
    let observed_ids: HashSet<&str> = observed.iter().map(|i| i.id.as_str()).collect();

    for item in observed {
        let id = item.id.as_str();

        if !state.goals.contains(id)
            && let Some(previous) = rename_source(item, &observed_ids)
            && let Some(stage) = state.goals.stage_of(previous)
        {
            let list = goal_list_mut(state, stage);
            if let Some(slot) = list.iter_mut().find(|g| g.as_str() == previous) {
                *slot = id.to_string();
            }
            state.custom_data.rename_goal(previous, id);
            state.drift.missing_goals.retain(|g| g != previous && g != id);
            record(
                changes,
                category,
                ChangeType::Renamed,
                item.location(),
                format!("Goal '{previous}' renamed to '{id}' ({stage})"),
            );
            continue;
        }

        if !state.goals.contains(id) {
            state.goals.potential.push(id.to_string());
            record(
                changes,
                category,
                ChangeType::Added,
                item.location(),
                format!("Goal '{id}' found on disk and tracked as potential"),
            );
        } else if let Some(pos) = state.drift.missing_goals.iter().position(|g| g == id) {
            state.drift.missing_goals.remove(pos);
            record(
                changes,
                category,
                ChangeType::Modified,
                item.location(),
                format!("Goal '{id}' is present on disk again"),
            );
        }
    }

    let missing: Vec<(String, GoalStage)> = [GoalStage::Potential, GoalStage::Selected]
        .into_iter()
        .flat_map(|stage| {
            state
                .goals
                .list(stage)
                .iter()
                .map(move |g| (g.clone(), stage))
        })
        .filter(|(g, _)| !observed_ids.contains(g.as_str()))
        .filter(|(g, _)| !state.drift.missing_goals.contains(g))
        .collect();

    for (goal, stage) in missing {
        warn!(goal = %goal, stage = %stage, "goal no longer observed on disk");
        record(
            changes,
            category,
            ChangeType::Removed,
            goal.clone(),
            format!(
                "Goal '{goal}' ({stage}) is no longer on disk; it stays tracked until archived explicitly"
            ),
        );
        state.drift.missing_goals.push(goal);
    }
}

fn goal_list_mut(state: &mut WorkflowState, stage: GoalStage) -> &mut Vec<String> {
    match stage {
        GoalStage::Potential => &mut state.goals.potential,
        GoalStage::Selected => &mut state.goals.selected,
        GoalStage::Completed => &mut state.goals.completed,
        GoalStage::Archived => &mut state.goals.archived,
    }
}

fn reconcile_workflows(
    state: &mut WorkflowState,
    observed: &[&ObservedItem],
    changes: &mut Vec<DriftRecord>,
) {
    let category = DriftCategory::ActiveWorkflows;
    let observed_ids: HashSet<&str> = observed.iter().map(|i| i.id.as_str()).collect();

    for item in observed {
        let id = item.id.as_str();
        if state.active_workflows.iter().any(|w| w == id) {
            continue;
        }

        let renamed = rename_source(item, &observed_ids).and_then(|previous| {
            state
                .active_workflows
                .iter()
                .position(|w| w == previous)
                .map(|pos| (pos, previous))
        });

        match renamed {
            Some((pos, previous)) => {
                state.active_workflows[pos] = id.to_string();
                record(
                    changes,
                    category,
                    ChangeType::Renamed,
                    item.location(),
                    format!("Workflow '{previous}' renamed to '{id}'"),
                );
            }
            None => {
                state.active_workflows.push(id.to_string());
                record(
                    changes,
                    category,
                    ChangeType::Added,
                    item.location(),
                    format!("Workflow '{id}' is active"),
                );
            }
        }
    }

    let (kept, gone): (Vec<String>, Vec<String>) = std::mem::take(&mut state.active_workflows)
        .into_iter()
        .partition(|w| observed_ids.contains(w.as_str()));
    state.active_workflows = kept;

    for workflow in gone {
        warn!(workflow = %workflow, "active workflow no longer observed; dropping it");
        record(
            changes,
            category,
            ChangeType::Removed,
            workflow.clone(),
            format!("Workflow '{workflow}' is no longer active"),
        );
    }
}

fn reconcile_integrations(
    state: &mut WorkflowState,
    observed: &[&ObservedItem],
    changes: &mut Vec<DriftRecord>,
) {
    let category = DriftCategory::Integrations;

    for item in observed {
        let id = item.id.as_str();
        if !state.integrations.contains_key(id) {
            state
                .integrations
                .insert(id.to_string(), IntegrationRecord::default());
            record(
                changes,
                category,
                ChangeType::Added,
                item.location(),
                format!("Integration marker '{id}' found"),
            );
        } else if let Some(pos) = state.drift.missing_integrations.iter().position(|i| i == id) {
            state.drift.missing_integrations.remove(pos);
            record(
                changes,
                category,
                ChangeType::Modified,
                item.location(),
                format!("Integration marker '{id}' is present again"),
            );
        }
    }

    // Records with handoff history are not marker-derived and are never reported
    let observed_ids: HashSet<&str> = observed.iter().map(|i| i.id.as_str()).collect();
    let missing: Vec<String> = state
        .integrations
        .iter()
        .filter(|(name, rec)| !rec.used && !observed_ids.contains(name.as_str()))
        .map(|(name, _)| name.clone())
        .filter(|name| !state.drift.missing_integrations.contains(name))
        .collect();

    for name in missing {
        record(
            changes,
            category,
            ChangeType::Removed,
            name.clone(),
            format!("Integration marker '{name}' is gone; the record is kept"),
        );
        state.drift.missing_integrations.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use waypoint_state::WorkflowType;

    fn state() -> WorkflowState {
        WorkflowState::new(
            "/p1",
            WorkflowType::ProjectManagement,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_new_goals_are_added_as_potential() {
        let result = reconcile(&state(), &Observations::with_goals(["g1", "g2"]));

        assert_eq!(result.changes.len(), 2);
        assert!(result.changes.iter().all(|c| {
            c.category == DriftCategory::Goals && c.change_type == ChangeType::Added
        }));
        assert_eq!(result.changes[0].path, "g1");
        assert_eq!(result.merged_state.goals.potential, vec!["g1", "g2"]);
    }

    #[test]
    fn test_second_pass_is_empty() {
        let observations = Observations {
            goals: Some(vec![ObservedItem::new("g1")]),
            workflows: Some(vec![ObservedItem::new("wf-a")]),
            integrations: Some(vec![ObservedItem::new("spec-driven")]),
        };
        let mut start = state();
        start.goals.selected.push("g0".to_string());

        let first = reconcile(&start, &observations);
        assert_eq!(first.changes.len(), 4);

        let second = reconcile(&first.merged_state, &observations);
        assert!(second.changes.is_empty(), "{:?}", second.changes);
        assert_eq!(second.merged_state, first.merged_state);
    }

    #[test]
    fn test_missing_goal_is_reported_once_and_kept() {
        let mut start = state();
        start.goals.selected.push("g1".to_string());

        let first = reconcile(&start, &Observations::with_goals(Vec::<String>::new()));
        assert_eq!(first.changes.len(), 1);
        assert_eq!(first.changes[0].change_type, ChangeType::Removed);
        assert_eq!(first.merged_state.goals.selected, vec!["g1"]);
        assert_eq!(first.merged_state.drift.missing_goals, vec!["g1"]);

        let again = reconcile(&first.merged_state, &Observations::with_goals(Vec::<String>::new()));
        assert!(again.changes.is_empty());

        let back = reconcile(&first.merged_state, &Observations::with_goals(["g1"]));
        assert_eq!(back.changes[0].change_type, ChangeType::Modified);
        assert!(back.merged_state.drift.missing_goals.is_empty());
    }

    #[test]
    fn test_completed_and_archived_goals_are_not_reported_missing() {
        let mut start = state();
        start.goals.completed.push("done".to_string());
        start.goals.archived.push("old".to_string());

        let result = reconcile(&start, &Observations::with_goals(Vec::<String>::new()));
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_renamed_goal_keeps_its_stage() {
        let mut start = state();
        start.goals.selected.push("draft-goal".to_string());
        let observations = Observations {
            goals: Some(vec![
                ObservedItem::new("final-goal")
                    .at("goals/final-goal.md")
                    .renamed_from("draft-goal"),
            ]),
            ..Observations::default()
        };

        let result = reconcile(&start, &observations);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].change_type, ChangeType::Renamed);
        assert_eq!(result.changes[0].path, "goals/final-goal.md");
        assert_eq!(result.merged_state.goals.selected, vec!["final-goal"]);
    }

    #[test]
    fn test_rename_from_a_still_observed_goal_is_an_addition() {
        let mut start = state();
        start.goals.selected.push("old".to_string());
        let observations = Observations {
            goals: Some(vec![
                ObservedItem::new("old"),
                ObservedItem::new("new").renamed_from("old"),
            ]),
            ..Observations::default()
        };

        let first = reconcile(&start, &observations);
        let kinds: Vec<_> = first.changes.iter().map(|c| c.change_type).collect();
        assert_eq!(kinds, vec![ChangeType::Added]);
        assert_eq!(first.merged_state.goals.selected, vec!["old"]);
        assert_eq!(first.merged_state.goals.potential, vec!["new"]);

        let second = reconcile(&first.merged_state, &observations);
        assert!(second.changes.is_empty(), "{:?}", second.changes);
    }

    #[test]
    fn test_rename_from_a_still_observed_workflow_is_an_addition() {
        let mut start = state();
        start.active_workflows = vec!["wf-a".to_string()];
        let observations = Observations {
            workflows: Some(vec![
                ObservedItem::new("wf-b").renamed_from("wf-a"),
                ObservedItem::new("wf-a"),
            ]),
            ..Observations::default()
        };

        let first = reconcile(&start, &observations);
        assert_eq!(first.merged_state.active_workflows, vec!["wf-a", "wf-b"]);
        assert_eq!(first.changes.len(), 1);
        assert_eq!(first.changes[0].change_type, ChangeType::Added);

        let second = reconcile(&first.merged_state, &observations);
        assert!(second.changes.is_empty(), "{:?}", second.changes);
    }

    #[test]
    fn test_workflows_are_ephemeral() {
        let mut start = state();
        start.active_workflows = vec!["wf-a".to_string(), "wf-b".to_string()];
        let observations = Observations {
            workflows: Some(vec![ObservedItem::new("wf-c"), ObservedItem::new("wf-b")]),
            ..Observations::default()
        };

        let result = reconcile(&start, &observations);
        let kinds: Vec<_> = result.changes.iter().map(|c| c.change_type).collect();
        assert_eq!(kinds, vec![ChangeType::Added, ChangeType::Removed]);
        assert_eq!(result.merged_state.active_workflows, vec!["wf-b", "wf-c"]);
    }

    #[test]
    fn test_unobserved_categories_are_untouched() {
        let mut start = state();
        start.active_workflows = vec!["wf-a".to_string()];
        start.goals.potential.push("g1".to_string());

        let result = reconcile(&start, &Observations::default());
        assert!(!result.has_changes());
        assert_eq!(result.merged_state, start);
    }

    #[test]
    fn test_duplicate_observations_count_once() {
        let result = reconcile(&state(), &Observations::with_goals(["g1", "g1"]));
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.merged_state.goals.potential, vec!["g1"]);
    }

    #[test]
    fn test_used_integrations_are_never_reported_missing() {
        let mut start = state();
        start.integrations.insert(
            "spec-driven".to_string(),
            IntegrationRecord {
                used: true,
                last_handoff: None,
                handoff_ids: vec!["g1".to_string()],
            },
        );
        start
            .integrations
            .insert("task-executor".to_string(), IntegrationRecord::default());
        let observations = Observations {
            integrations: Some(Vec::new()),
            ..Observations::default()
        };

        let result = reconcile(&start, &observations);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "task-executor");
        assert_eq!(result.merged_state.integrations.len(), 2);
    }

    #[test]
    fn test_drift_record_json_shape() {
        let record = DriftRecord {
            category: DriftCategory::ActiveWorkflows,
            change_type: ChangeType::Removed,
            path: "wf-a".to_string(),
            details: "gone".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["category"], "active-workflows");
        assert_eq!(value["changeType"], "removed");
    }
}
