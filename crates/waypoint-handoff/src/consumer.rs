//! Downstream consumers a workflow can hand work to.

use serde_json::{Map, Value};

use waypoint_utils::error::WaypointError;

use crate::context::{Extractor, HandoffContext, goal_context};

/// A named downstream tool and how to build its call.
///
/// Consumers are plain data; callers may declare their own alongside the built-in ones.
#[derive(Clone, Copy)]
pub struct Consumer {
    /// Key under `integrations` in the workflow state
    pub name: &'static str,
    pub target_tool: &'static str,
    pub extract: Extractor,
    pub params: fn(&HandoffContext) -> Value,
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("name", &self.name)
            .field("target_tool", &self.target_tool)
            .finish()
    }
}

pub const BUILTIN_CONSUMERS: &[Consumer] = &[
    Consumer {
        name: "spec-driven",
        target_tool: "sdd_guide",
        extract: goal_context,
        params: spec_driven_params,
    },
    Consumer {
        name: "task-executor",
        target_tool: "create_workflow",
        extract: goal_context,
        params: task_executor_params,
    },
];

impl Consumer {
    /// Look up a built-in consumer by name
    pub fn builtin(name: &str) -> Result<&'static Consumer, WaypointError> {
        BUILTIN_CONSUMERS
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| WaypointError::UnknownConsumer {
                consumer: name.to_string(),
                known: BUILTIN_CONSUMERS.iter().map(|c| c.name.to_string()).collect(),
            })
    }
}

fn spec_driven_params(context: &HandoffContext) -> Value {
    let mut params = Map::new();
    params.insert("action".to_string(), Value::String("start".to_string()));
    params.insert(
        "projectPath".to_string(),
        Value::String(context.project_path.clone()),
    );
    params.insert("goalContext".to_string(), context.goal.to_json());
    Value::Object(params)
}

fn task_executor_params(context: &HandoffContext) -> Value {
    let mut nested = Map::new();
    nested.insert(
        "projectPath".to_string(),
        Value::String(context.project_path.clone()),
    );
    nested.insert(
        "workflowName".to_string(),
        Value::String(context.workflow_name.clone()),
    );
    nested.insert("goal".to_string(), context.goal.to_json());

    let mut params = Map::new();
    params.insert("name".to_string(), Value::String(context.goal.name.clone()));
    params.insert(
        "goalId".to_string(),
        Value::String(context.goal.goal_id.clone()),
    );
    params.insert("context".to_string(), Value::Object(nested));
    Value::Object(params)
}
