//! The durable workflow record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use strum::{AsRefStr, Display, EnumString};

use crate::custom_data::CustomData;
use crate::domain::{DomainDefinition, WorkflowType};

/// Schema version written by this release
pub const STATE_VERSION: &str = "1.0";

/// One workflow instance, addressed by its project path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub version: String,
    pub workflow_type: WorkflowType,
    pub name: String,
    pub project_path: String,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub current_phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    pub phases: BTreeMap<String, PhaseStatus>,
    #[serde(default)]
    pub goals: GoalLists,
    #[serde(default)]
    pub integrations: BTreeMap<String, IntegrationRecord>,
    /// Ephemeral: mirrors the workflow directories last observed
    #[serde(default)]
    pub active_workflows: Vec<String>,
    #[serde(default)]
    pub blockers: Vec<Blocker>,
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
    #[serde(default)]
    pub drift: DriftLedger,
    pub custom_data: CustomData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PhaseState {
    NotStarted,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStatus {
    pub status: PhaseState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_steps: Vec<String>,
}

impl PhaseStatus {
    #[must_use]
    pub fn not_started() -> Self {
        Self {
            status: PhaseState::NotStarted,
            started_at: None,
            completed_at: None,
            completed_steps: Vec::new(),
        }
    }
}

/// Lifecycle list a goal currently sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GoalStage {
    Potential,
    Selected,
    Completed,
    Archived,
}

impl GoalStage {
    pub const ALL: [GoalStage; 4] = [
        GoalStage::Potential,
        GoalStage::Selected,
        GoalStage::Completed,
        GoalStage::Archived,
    ];
}

/// Four disjoint, ordered goal lists.
///
/// A goal id lives in at most one list. Goals move between lists; none is ever removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalLists {
    #[serde(default)]
    pub potential: Vec<String>,
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub archived: Vec<String>,
}

impl GoalLists {
    #[must_use]
    pub fn list(&self, stage: GoalStage) -> &[String] {
        match stage {
            GoalStage::Potential => &self.potential,
            GoalStage::Selected => &self.selected,
            GoalStage::Completed => &self.completed,
            GoalStage::Archived => &self.archived,
        }
    }

    pub(crate) fn list_mut(&mut self, stage: GoalStage) -> &mut Vec<String> {
        match stage {
            GoalStage::Potential => &mut self.potential,
            GoalStage::Selected => &mut self.selected,
            GoalStage::Completed => &mut self.completed,
            GoalStage::Archived => &mut self.archived,
        }
    }

    #[must_use]
    pub fn stage_of(&self, goal_id: &str) -> Option<GoalStage> {
        GoalStage::ALL
            .into_iter()
            .find(|stage| self.list(*stage).iter().any(|g| g == goal_id))
    }

    #[must_use]
    pub fn contains(&self, goal_id: &str) -> bool {
        self.stage_of(goal_id).is_some()
    }

    /// Every tracked goal id, in list order
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.potential
            .iter()
            .chain(&self.selected)
            .chain(&self.completed)
            .chain(&self.archived)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.potential.len() + self.selected.len() + self.completed.len() + self.archived.len()
    }

    /// First id found in more than one list (or twice in one list)
    #[must_use]
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.all()
            .find(|id| !seen.insert(id.as_str()))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRecord {
    pub used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_handoff: Option<DateTime<Utc>>,
    /// Ordered set: an id appears at most once
    #[serde(default)]
    pub handoff_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocker {
    pub id: String,
    pub description: String,
    pub raised_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Blocker {
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Audit entry appended for every phase transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub from: String,
    pub to: String,
    pub at: DateTime<Utc>,
    pub validation_skipped: bool,
}

/// Removals already reported by reconciliation.
///
/// Goals and integrations are never dropped because a file disappeared; the ledger keeps
/// each such removal from being reported again on the next sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftLedger {
    #[serde(default)]
    pub missing_goals: Vec<String>,
    #[serde(default)]
    pub missing_integrations: Vec<String>,
}

impl WorkflowState {
    /// Fresh state: every phase not started, current phase at the domain's first phase.
    #[must_use]
    pub fn new(project_path: &str, workflow_type: WorkflowType, now: DateTime<Utc>) -> Self {
        let domain = workflow_type.domain();
        let phases = domain
            .phase_names()
            .map(|name| (name.to_string(), PhaseStatus::not_started()))
            .collect();

        Self {
            version: STATE_VERSION.to_string(),
            custom_data: CustomData::for_type(&workflow_type),
            workflow_type,
            name: waypoint_utils::paths::workflow_name(project_path),
            project_path: project_path.to_string(),
            created: now,
            last_updated: now,
            current_phase: domain.first_phase().name.to_string(),
            current_step: None,
            phases,
            goals: GoalLists::default(),
            integrations: BTreeMap::new(),
            active_workflows: Vec::new(),
            blockers: Vec::new(),
            transitions: Vec::new(),
            drift: DriftLedger::default(),
        }
    }

    #[must_use]
    pub fn domain(&self) -> &'static DomainDefinition {
        self.workflow_type.domain()
    }

    #[must_use]
    pub fn phase_state(&self, phase: &str) -> Option<PhaseState> {
        self.phases.get(phase).map(|p| p.status)
    }

    pub fn open_blockers(&self) -> impl Iterator<Item = &Blocker> {
        self.blockers.iter().filter(|b| b.is_open())
    }

    /// Steps of `phase` not yet completed, in domain order
    #[must_use]
    pub fn remaining_steps(&self, phase: &str) -> Vec<&'static str> {
        let Some(definition) = self.domain().phase(phase) else {
            return Vec::new();
        };
        let done = self
            .phases
            .get(phase)
            .map(|p| p.completed_steps.as_slice())
            .unwrap_or_default();
        definition
            .steps
            .iter()
            .copied()
            .filter(|step| !done.iter().any(|d| d == step))
            .collect()
    }

    /// Check internal invariants; the error is a human-readable reason
    pub fn check_invariants(&self) -> Result<(), String> {
        let domain = self.domain();

        if self.custom_data.kind() != domain.kind {
            return Err(format!(
                "customData kind '{}' does not match workflow type '{}'",
                self.custom_data.kind(),
                self.workflow_type
            ));
        }

        if domain.index_of(&self.current_phase).is_none() {
            return Err(format!(
                "current phase '{}' is not defined for workflow type '{}'",
                self.current_phase, self.workflow_type
            ));
        }

        for name in domain.phase_names() {
            if !self.phases.contains_key(name) {
                return Err(format!("phase '{name}' is missing from phases"));
            }
        }
        if let Some(unknown) = self.phases.keys().find(|k| domain.index_of(k).is_none()) {
            return Err(format!("phase '{unknown}' is not defined for this workflow type"));
        }

        if let Some(duplicate) = self.goals.first_duplicate() {
            return Err(format!("goal '{duplicate}' appears in more than one goal list"));
        }

        for (consumer, record) in &self.integrations {
            let mut seen = HashSet::new();
            if let Some(dup) = record.handoff_ids.iter().find(|id| !seen.insert(id.as_str())) {
                return Err(format!(
                    "handoff id '{dup}' is recorded twice for integration '{consumer}'"
                ));
            }
        }

        Ok(())
    }
}
