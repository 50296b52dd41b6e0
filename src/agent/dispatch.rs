//! Concurrent execution of a tool-call plan.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::ArcheError;
use crate::plan::ToolCall;
use crate::tools::{bind_arguments, ToolKind, ToolLookup, ToolRegistry, DIRECT_ANSWER_MARKER};
use crate::util::timeout::with_timeout;

/// Result recorded for an `Action` tool that succeeded.
pub const ACTION_COMPLETED: &str = "Action completed.";

/// Tool results keyed by tool name, in plan order.
pub type ToolResults = Map<String, Value>;

/// Run every call of a plan concurrently and collect one entry per name.
///
/// Each call runs in its own task, at most `concurrency` at a time, and is
/// bounded by `tool_timeout`. Failures (including panics and timeouts) become
/// `Failed to get info: <error>.` entries. When a plan repeats a name, the
/// later call's entry wins.
pub async fn dispatch_calls(
    registry: &ToolRegistry,
    calls: &[ToolCall],
    concurrency: usize,
    tool_timeout: Duration,
) -> ToolResults {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let handles = calls.iter().map(|call| {
        let lookup = registry.lookup(&call.tool_name);
        let call = call.clone();
        let semaphore = Arc::clone(&semaphore);
        tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            execute_call(lookup, &call, tool_timeout).await
        })
    });
    let outcomes = future::join_all(handles).await;

    let mut results = ToolResults::new();
    for (call, outcome) in calls.iter().zip(outcomes) {
        let value = outcome.unwrap_or_else(|join_error| {
            warn!(tool = %call.tool_name, error = %join_error, "tool task aborted");
            failure(format!("tool '{}' stopped unexpectedly", call.tool_name))
        });
        results.insert(call.tool_name.clone(), value);
    }
    results
}

async fn execute_call(lookup: ToolLookup, call: &ToolCall, tool_timeout: Duration) -> Value {
    debug!(tool = %call.tool_name, parameter = %call.parameter, "dispatching tool call");

    let tool = match lookup {
        ToolLookup::DirectAnswer => return Value::String(DIRECT_ANSWER_MARKER.to_string()),
        ToolLookup::NotFound => {
            warn!(tool = %call.tool_name, "planned tool is not registered");
            return failure(ArcheError::ToolNotFound(call.tool_name.clone()));
        }
        ToolLookup::Tool(tool) => tool,
    };

    let args = match bind_arguments(tool.descriptor(), &call.parameter) {
        Ok(args) => args,
        Err(e) => {
            warn!(tool = %call.tool_name, error = %e, "could not bind tool arguments");
            return failure(e);
        }
    };

    match with_timeout(tool_timeout, tool.execute(&args)).await {
        Ok(value) => match tool.descriptor().kind() {
            ToolKind::Action => Value::String(ACTION_COMPLETED.to_string()),
            ToolKind::Value => value,
        },
        Err(e) => {
            warn!(tool = %call.tool_name, error = %e, "tool call failed");
            failure(e)
        }
    }
}

fn failure(error: impl std::fmt::Display) -> Value {
    Value::String(format!("Failed to get info: {error}."))
}
