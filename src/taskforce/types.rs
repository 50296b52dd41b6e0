//! Records and outcomes of a task-force rollout.

use serde::{Deserialize, Serialize};

/// One completed delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub agent: String,
    /// Task as the agent executed it, including delivered messages.
    pub task: String,
    pub response: String,
}

/// Why the orchestration loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// The planner answered `TASK COMPLETE`.
    SentinelReached,
    /// The planner selected no agent, or one that is not in the roster.
    NoAgentFound { requested: Option<String> },
    /// The planning reply could not be parsed or the call failed.
    PlanningExhausted,
    IterationBudgetExhausted,
}

/// Result of [`TaskForce::rollout`](super::TaskForce::rollout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskForceOutcome {
    /// Consolidated answer.
    pub response: String,
    pub termination: Termination,
    /// Planning iterations started.
    pub iterations: usize,
    /// Set when the iteration budget ran out.
    pub warning: Option<String>,
}
