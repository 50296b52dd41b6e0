//! The built-in `llm_tool` direct-answer pseudo-tool.
//!
//! It has no implementation: selecting it tells the synthesis step to answer
//! the query from the model's own knowledge.

use serde_json::{json, Value};

/// Name the planner uses for a direct answer.
pub const LLM_TOOL_NAME: &str = "llm_tool";

/// Result recorded for a direct-answer call.
pub const DIRECT_ANSWER_MARKER: &str = "[REPLY QUERY]";

const LLM_TOOL_DESCRIPTION: &str = "A default tool that provides AI-generated text responses. \
It cannot answer real-time queries because of its knowledge cut-off.";

/// Whether `name` refers to the direct-answer pseudo-tool (case-insensitive).
pub fn is_llm_tool(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(LLM_TOOL_NAME)
}

/// Schema listed next to the registered tools in planning prompts.
pub fn llm_tool_schema() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": LLM_TOOL_NAME,
            "description": LLM_TOOL_DESCRIPTION,
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The question to answer directly."}
                },
                "required": ["query"]
            }
        }
    })
}
