//! The structured call plan an agent requests from the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::repair::{parse_tolerant, ParseOutcome};

/// `{"func_calling": [{"tool_name": ..., "parameter": ...}]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPlan {
    pub func_calling: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub parameter: Value,
}

impl ToolPlan {
    /// Interpret a JSON value as a plan.
    ///
    /// A single call object under `func_calling` is accepted as a one-call
    /// plan. Values without `func_calling` are not plans.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };
        let calls = match map.remove("func_calling")? {
            Value::Array(calls) => calls,
            single @ Value::Object(_) => vec![single],
            _ => return None,
        };
        let func_calling = calls
            .into_iter()
            .map(serde_json::from_value::<ToolCall>)
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        Some(Self { func_calling })
    }

    pub fn is_empty(&self) -> bool {
        self.func_calling.is_empty()
    }
}

/// Tolerantly parse a model reply into a [`ToolPlan`].
pub fn parse_tool_plan(raw: &str) -> ParseOutcome<ToolPlan> {
    parse_tolerant(raw, ToolPlan::from_value)
}

/// Whether text is a bare JSON object carrying `func_calling`.
///
/// Used to catch a synthesis reply that regressed into plan output.
pub fn looks_like_tool_plan(text: &str) -> bool {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return false;
    }
    serde_json::from_str::<Value>(trimmed)
        .map(|v| v.get("func_calling").is_some())
        .unwrap_or(false)
}
