//! Multi-agent orchestration.

pub mod plan;
pub mod prompts;
#[allow(clippy::module_inception)]
pub mod taskforce;
pub mod types;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::retry::{duration_millis, RetryPolicy};

pub use plan::{Communication, IterationPlan, TASK_COMPLETE};
pub use taskforce::TaskForce;
pub use types::{TaskForceOutcome, TaskRecord, Termination};

/// Coordinator limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskForceSettings {
    /// Upper bound on planning iterations per rollout.
    pub max_iterations: usize,
    #[serde(rename = "model_timeout_ms", with = "duration_millis")]
    pub model_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TaskForceSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            model_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}
