//! Convenience re-exports for common use.

pub use crate::agent::{Agent, AgentSettings};
pub use crate::config::ArcheConfig;
pub use crate::error::{ArcheError, Result};
pub use crate::memory::{Memory, MemorySettings};
pub use crate::provider::ModelClient;
pub use crate::taskforce::{TaskForce, TaskForceOutcome, TaskForceSettings, Termination};
pub use crate::tools::{
    FunctionTool, ParamType, ParameterSpec, Tool, ToolArguments, ToolDescriptor, ToolKind,
};
pub use crate::types::{ModelMessage, Role};
