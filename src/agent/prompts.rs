//! Prompt text used by the agent state machine.

use serde_json::Value;

use super::dispatch::ToolResults;

/// Returned when a synthesis reply regressed into a tool-call plan.
pub const MALFORMED_SYNTHESIS: &str =
    "It seems there was an issue with the response. Please try again.";

/// Returned when both synthesis attempts fail.
pub const SYNTHESIS_FALLBACK: &str =
    "I gathered information for this task but could not compose an answer. Please try again.";

/// Returned when the planning request itself fails.
pub const PLANNING_FALLBACK: &str =
    "I could not decide how to approach this task. Please try again.";

/// Returned when a direct (tool-less) request fails.
pub const NO_RESPONSE_FALLBACK: &str =
    "I could not get a response for this task. Please try again.";

pub fn persona_prompt(name: &str, description: &str, expected_output: &str) -> String {
    format!(
        "You are {name}, {description}.\n\n\
         ### OUTPUT STYLE:\n{expected_output}\n\n\
         ***If output style not mentioned, generate in markdown format.***"
    )
}

fn render_schemas(schemas: &[Value]) -> String {
    serde_json::to_string_pretty(schemas).unwrap_or_else(|_| format!("{schemas:?}"))
}

pub fn planning_prompt(schemas: &[Value]) -> String {
    format!(
        r#"You are an AI assistant designed to generate JSON responses based on provided tools.

Your task is to understand the tools, their parameters, and use them appropriately.

Available Tools:
{tools}

Instructions:
1. Read the task carefully.
2. Identify the required tool parameters.
3. Respond with a JSON object containing the tool_name and parameter.
4. Only provide the JSON response.
5. Use llm_tool when the task needs no other tool.

JSON Structure:
{{
    "func_calling": [
        {{
            "tool_name": "<tool_name>",
            "parameter": "<tool_params>"
        }}
    ]
}}

Example:
Task: Get the weather for New York
Response:
{{"func_calling": [{{"tool_name": "weather_tool", "parameter": "New York"}}]}}

For tools with no parameters:
{{"func_calling": [{{"tool_name": "time_tool", "parameter": ""}}]}}

For tools with several parameters:
Task: What is the sum of 43675 and 547?
Response:
{{"func_calling": [{{"tool_name": "add", "parameter": {{"a": 43675, "b": 547}}}}]}}
"#,
        tools = render_schemas(schemas)
    )
}

pub fn synthesis_prompt(name: &str, schemas: &[Value], expected_output: &str) -> String {
    format!(
        r#"You are {name}, an AI agent. You are provided with output from the tools in JSON format. Your task is to use this information to give the best possible answer to the query. Reply in a natural language style, only in text, and to the point. Do not reply in JSON.

### TOOLS:
llm_tool - If this tool's result is [REPLY QUERY], you must answer the user's query in the best possible way.
{tools}

### OUTPUT STYLE:
{expected_output}

## Instructions:
- If the output style is not mentioned, just reply in the best possible way in only text form and not JSON.
- You are no longer generating JSON responses. Provide a natural language summary based on the information from the tools."#,
        tools = render_schemas(schemas)
    )
}

pub fn synthesis_input(task: &str, results: &ToolResults) -> String {
    let results = serde_json::to_string(results).unwrap_or_else(|_| "{}".to_string());
    format!("[QUERY]\n{task}\n\n[TOOLS]\n{results}")
}

pub fn fallback_input(task: &str) -> String {
    format!("[QUERY]\n{task}")
}
