//! Schema version gate applied to a raw record before it is decoded.

use serde_json::{Map, Value};

use crate::state::STATE_VERSION;

/// Bring a raw record up to [`STATE_VERSION`] in place.
///
/// `version` is the first field consulted. `0.9` stored ordered payloads as JSON objects;
/// they become pair lists in key order. Any other version is rejected with a reason.
pub(crate) fn migrate(record: &mut Value) -> Result<(), String> {
    let version = match record.get("version") {
        Some(Value::String(v)) => v.clone(),
        Some(other) => return Err(format!("version field must be a string, found {other}")),
        None => return Err("record has no version field".to_string()),
    };

    match version.as_str() {
        STATE_VERSION => Ok(()),
        "0.9" => {
            if let Some(custom) = record.get_mut("customData").and_then(Value::as_object_mut) {
                for key in ["answers", "values", "goalDetails"] {
                    if let Some(Value::Object(object)) = custom.get_mut(key) {
                        let pairs = object_to_pairs(std::mem::take(object));
                        custom.insert(key.to_string(), pairs);
                    }
                }
            }
            record["version"] = Value::String(STATE_VERSION.to_string());
            tracing::info!(from = "0.9", to = STATE_VERSION, "migrated workflow state record");
            Ok(())
        }
        other => Err(format!(
            "unsupported state version '{other}' (this release reads {STATE_VERSION} and 0.9)"
        )),
    }
}

fn object_to_pairs(object: Map<String, Value>) -> Value {
    Value::Array(
        object
            .into_iter()
            .map(|(k, v)| Value::Array(vec![Value::String(k), v]))
            .collect(),
    )
}
