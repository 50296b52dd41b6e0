//! Single-agent task execution: direct answers, tool planning, concurrent
//! tool dispatch and answer synthesis.

#[allow(clippy::module_inception)]
pub mod agent;
pub mod dispatch;
pub mod prompts;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::retry::{duration_millis, RetryPolicy};

pub use agent::Agent;
pub use dispatch::{dispatch_calls, ToolResults};

/// Per-agent execution limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum tool calls running at once.
    pub tool_concurrency: usize,
    #[serde(rename = "model_timeout_ms", with = "duration_millis")]
    pub model_timeout: Duration,
    #[serde(rename = "tool_timeout_ms", with = "duration_millis")]
    pub tool_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            tool_concurrency: 8,
            model_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}
