//! Parsing structured plans out of free-form model output.

pub mod repair;
pub mod tool_plan;

pub use repair::{parse_tolerant, ParseOutcome};
pub use tool_plan::{looks_like_tool_plan, parse_tool_plan, ToolCall, ToolPlan};
