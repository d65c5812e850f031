//! Domain-specific payload carried by a workflow state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::WorkflowType;
use crate::ordered_map::OrderedMap;

/// Typed `customData`, tagged by `kind`.
///
/// The tag must agree with the state's `workflowType`; a mismatch is treated as corruption
/// on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CustomData {
    ProjectManagement(ProjectManagementData),
    SpecDriven(SpecDrivenData),
    Generic(GenericData),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManagementData {
    #[serde(default)]
    pub goal_details: OrderedMap<String, GoalDetail>,
}

/// What a downstream consumer needs to know about one goal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDetail {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDrivenData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    /// Collected answers keyed by question id, in the order they were given
    #[serde(default)]
    pub answers: OrderedMap<String, Value>,
    #[serde(default)]
    pub open_clarifications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericData {
    #[serde(default)]
    pub values: OrderedMap<String, Value>,
}

impl CustomData {
    /// Empty payload for a workflow type
    #[must_use]
    pub fn for_type(workflow_type: &WorkflowType) -> Self {
        match workflow_type {
            WorkflowType::ProjectManagement => Self::ProjectManagement(Default::default()),
            WorkflowType::SpecDriven => Self::SpecDriven(Default::default()),
            WorkflowType::Generic(_) => Self::Generic(Default::default()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProjectManagement(_) => "project-management",
            Self::SpecDriven(_) => "spec-driven",
            Self::Generic(_) => "generic",
        }
    }

    #[must_use]
    pub fn goal_detail(&self, goal_id: &str) -> Option<&GoalDetail> {
        match self {
            Self::ProjectManagement(data) => data.goal_details.get(goal_id),
            _ => None,
        }
    }

    /// Returns false when this domain does not carry goal details
    pub fn set_goal_detail(&mut self, goal_id: &str, detail: GoalDetail) -> bool {
        match self {
            Self::ProjectManagement(data) => {
                data.goal_details.insert(goal_id.to_string(), detail);
                true
            }
            _ => false,
        }
    }

    /// Carry a goal's details over to its new id
    pub fn rename_goal(&mut self, from: &str, to: &str) {
        if let Self::ProjectManagement(data) = self {
            data.goal_details.rename_key(from, to.to_string());
        }
    }

    /// Record a free-form value; spec-driven workflows store it as an answer.
    ///
    /// Returns false for domains without a key/value payload.
    pub fn set_value(&mut self, key: &str, value: Value) -> bool {
        match self {
            Self::SpecDriven(data) => {
                data.answers.insert(key.to_string(), value);
                true
            }
            Self::Generic(data) => {
                data.values.insert(key.to_string(), value);
                true
            }
            Self::ProjectManagement(_) => false,
        }
    }

    /// The spec-driven payload, if this is one
    pub fn spec_driven_mut(&mut self) -> Option<&mut SpecDrivenData> {
        match self {
            Self::SpecDriven(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn feature_name(&self) -> Option<&str> {
        match self {
            Self::SpecDriven(data) => data.feature_name.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn open_clarifications(&self) -> &[String] {
        match self {
            Self::SpecDriven(data) => &data.open_clarifications,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_by_kind() {
        let mut data = CustomData::for_type(&WorkflowType::SpecDriven);
        assert!(data.set_value("q-users", json!("developers")));

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["kind"], "spec-driven");
        assert_eq!(value["answers"], json!([["q-users", "developers"]]));

        let back: CustomData = serde_json::from_value(value).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_generic_for_any_other_type() {
        let data = CustomData::for_type(&WorkflowType::from("demo"));
        assert_eq!(data.kind(), "generic");
        assert!(data.open_clarifications().is_empty());
    }

    #[test]
    fn test_goal_details_only_in_project_management() {
        let mut pm = CustomData::for_type(&WorkflowType::ProjectManagement);
        let detail = GoalDetail {
            name: "Faster onboarding".to_string(),
            description: "Cut setup time".to_string(),
            impact: Some("high".to_string()),
            effort: None,
        };
        assert!(pm.set_goal_detail("g1", detail.clone()));
        assert_eq!(pm.goal_detail("g1"), Some(&detail));

        let mut generic = CustomData::for_type(&WorkflowType::from("demo"));
        assert!(!generic.set_goal_detail("g1", detail));
        assert!(!pm.set_value("k", json!(1)));
    }
}
