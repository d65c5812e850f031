use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use waypoint_state::WorkflowState;
use waypoint_utils::error::WaypointError;

use crate::consumer::Consumer;
use crate::context::HandoffContext;

/// A downstream call, described but never executed here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedCall {
    pub target_tool: String,
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffResult {
    pub context: HandoffContext,
    pub suggested_call: SuggestedCall,
    pub updated_state: WorkflowState,
    /// The id was already recorded for this consumer; nothing in the state changed
    pub already_handed_off: bool,
}

/// Build the call that hands `id` to `consumer` and record the handoff.
///
/// Repeating a handoff yields the same call and leaves the integration record alone:
/// the id is stored once and `lastHandoff` keeps its first stamp.
pub fn prepare_handoff(
    state: &WorkflowState,
    consumer: &Consumer,
    id: &str,
    now: DateTime<Utc>,
) -> Result<HandoffResult, WaypointError> {
    let context = (consumer.extract)(state, id)?;
    let suggested_call = SuggestedCall {
        target_tool: consumer.target_tool.to_string(),
        params: (consumer.params)(&context),
    };

    let mut updated_state = state.clone();
    let record = updated_state
        .integrations
        .entry(consumer.name.to_string())
        .or_default();

    let already_handed_off = record.handoff_ids.iter().any(|h| h == id);
    if already_handed_off {
        debug!(
            project = %state.project_path,
            consumer = consumer.name,
            id,
            "handoff already recorded"
        );
    } else {
        record.handoff_ids.push(id.to_string());
        record.used = true;
        record.last_handoff = Some(now);
        info!(
            project = %state.project_path,
            consumer = consumer.name,
            id,
            target_tool = consumer.target_tool,
            "handoff recorded"
        );
    }

    Ok(HandoffResult {
        context,
        suggested_call,
        updated_state,
        already_handed_off,
    })
}

/// [`prepare_handoff`] against a built-in consumer looked up by name
pub fn prepare_builtin_handoff(
    state: &WorkflowState,
    consumer_name: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<HandoffResult, WaypointError> {
    prepare_handoff(state, Consumer::builtin(consumer_name)?, id, now)
}
