use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::IntentType;

/// A single named tool invocation with its arguments. Argument keys
/// beginning with `_` are meta: the Executor reads them for
/// auto-chaining but never forwards them to the tool body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Arguments with meta keys (those starting with `_`) stripped.
    pub fn body_arguments(&self) -> Value {
        match &self.arguments {
            Value::Object(map) => {
                let filtered: serde_json::Map<String, Value> = map
                    .iter()
                    .filter(|(k, _)| !k.starts_with('_'))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Value::Object(filtered)
            }
            other => other.clone(),
        }
    }

    /// Value of a meta argument (a key starting with `_`), if present.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }
}

/// An ordered sequence of `ToolCall`s compiled from a `NormalizedQuery`.
/// Order is significant: it reflects declared prerequisite dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPlan {
    pub intent_type: IntentType,
    pub pivot_time_epoch: i64,
    pub calls: Vec<ToolCall>,
}
