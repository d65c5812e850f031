//! Workflow types and their phase orderings.
//!
//! A domain is a closed, static description: ordered phases, each with ordered step ids.
//! Adding a domain means adding a `DomainDefinition`, not touching the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator of the domain a workflow follows.
///
/// Persisted as its string name. Names other than the built-in domains follow the
/// generic phase ordering and keep their original spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowType {
    ProjectManagement,
    SpecDriven,
    Generic(String),
}

impl WorkflowType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ProjectManagement => "project-management",
            Self::SpecDriven => "spec-driven",
            Self::Generic(name) => name,
        }
    }

    /// Static phase/step definition for this type
    #[must_use]
    pub fn domain(&self) -> &'static DomainDefinition {
        match self {
            Self::ProjectManagement => &PROJECT_MANAGEMENT,
            Self::SpecDriven => &SPEC_DRIVEN,
            Self::Generic(_) => &GENERIC,
        }
    }
}

impl From<&str> for WorkflowType {
    fn from(name: &str) -> Self {
        match name {
            "project-management" => Self::ProjectManagement,
            "spec-driven" => Self::SpecDriven,
            other => Self::Generic(other.to_string()),
        }
    }
}

impl From<String> for WorkflowType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "project-management" => Self::ProjectManagement,
            "spec-driven" => Self::SpecDriven,
            _ => Self::Generic(name),
        }
    }
}

impl From<WorkflowType> for String {
    fn from(workflow_type: WorkflowType) -> Self {
        match workflow_type {
            WorkflowType::Generic(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct PhaseDefinition {
    pub name: &'static str,
    pub steps: &'static [&'static str],
}

impl PhaseDefinition {
    #[must_use]
    pub fn has_step(&self, step: &str) -> bool {
        self.steps.contains(&step)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DomainDefinition {
    /// Value of `customData.kind` for this domain
    pub kind: &'static str,
    pub phases: &'static [PhaseDefinition],
}

impl DomainDefinition {
    #[must_use]
    pub fn first_phase(&self) -> &'static PhaseDefinition {
        &self.phases[0]
    }

    #[must_use]
    pub fn terminal_phase(&self) -> &'static PhaseDefinition {
        &self.phases[self.phases.len() - 1]
    }

    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&'static PhaseDefinition> {
        self.phases.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name == name)
    }

    /// Phase following `name`, `None` for the terminal phase or an unknown name
    #[must_use]
    pub fn next_phase(&self, name: &str) -> Option<&'static PhaseDefinition> {
        self.index_of(name).and_then(|i| self.phases.get(i + 1))
    }

    pub fn phase_names(&self) -> impl Iterator<Item = &'static str> {
        self.phases.iter().map(|p| p.name)
    }
}

pub static PROJECT_MANAGEMENT: DomainDefinition = DomainDefinition {
    kind: "project-management",
    phases: &[
        PhaseDefinition {
            name: "initialization",
            steps: &["create-structure", "capture-vision"],
        },
        PhaseDefinition {
            name: "goal-development",
            steps: &["brainstorm-goals", "evaluate-goals", "select-goals"],
        },
        PhaseDefinition {
            name: "execution",
            steps: &["handoff-goals", "track-progress"],
        },
        PhaseDefinition {
            name: "completion",
            steps: &["review-outcomes", "archive-project"],
        },
    ],
};

pub static SPEC_DRIVEN: DomainDefinition = DomainDefinition {
    kind: "spec-driven",
    phases: &[
        PhaseDefinition {
            name: "constitution",
            steps: &["principles", "quality-standards", "constraints"],
        },
        PhaseDefinition {
            name: "specification",
            steps: &["user-stories", "acceptance-criteria"],
        },
        PhaseDefinition {
            name: "clarification",
            steps: &["resolve-ambiguities"],
        },
        PhaseDefinition {
            name: "planning",
            steps: &["architecture", "data-model"],
        },
        PhaseDefinition {
            name: "tasks",
            steps: &["task-breakdown"],
        },
        PhaseDefinition {
            name: "implementation",
            steps: &["execute-tasks", "verify"],
        },
    ],
};

pub static GENERIC: DomainDefinition = DomainDefinition {
    kind: "generic",
    phases: &[
        PhaseDefinition {
            name: "initialization",
            steps: &["setup"],
        },
        PhaseDefinition {
            name: "planning",
            steps: &["plan"],
        },
        PhaseDefinition {
            name: "execution",
            steps: &["execute"],
        },
        PhaseDefinition {
            name: "completion",
            steps: &["wrap-up"],
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_types_are_generic_and_keep_their_name() {
        let demo = WorkflowType::from("demo");
        assert_eq!(demo, WorkflowType::Generic("demo".to_string()));
        assert_eq!(demo.domain().first_phase().name, "initialization");
        assert_eq!(String::from(demo), "demo");
    }

    #[test]
    fn test_workflow_type_serializes_as_string() {
        let json = serde_json::to_string(&WorkflowType::SpecDriven).unwrap();
        assert_eq!(json, "\"spec-driven\"");
        let back: WorkflowType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WorkflowType::SpecDriven);
    }

    #[test]
    fn test_phase_ordering() {
        let pm = WorkflowType::ProjectManagement.domain();
        assert_eq!(pm.next_phase("goal-development").map(|p| p.name), Some("execution"));
        assert_eq!(pm.next_phase("completion"), None);
        assert_eq!(pm.terminal_phase().name, "completion");
        assert_eq!(pm.index_of("execution"), Some(2));
        assert!(pm.phase("goal-development").unwrap().has_step("select-goals"));
    }

    #[test]
    fn test_every_domain_has_steps_in_every_phase() {
        for domain in [&PROJECT_MANAGEMENT, &SPEC_DRIVEN, &GENERIC] {
            assert!(!domain.phases.is_empty());
            for phase in domain.phases {
                assert!(!phase.steps.is_empty(), "{} has no steps", phase.name);
            }
        }
    }
}
