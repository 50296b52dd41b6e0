//! Coordinator prompts.

use serde_json::{Map, Value};

use super::types::TaskRecord;
use crate::agent::Agent;

pub const BUDGET_WARNING: &str = "Maximum iterations reached. Task might not be fully complete.";

pub const NO_RESPONSES: &str = "No agent produced a response for this task.";

pub fn coordinator_persona(name: &str, description: &str) -> String {
    format!("You are {name}, {description}.")
}

pub fn format_task_history(history: &[TaskRecord]) -> String {
    if history.is_empty() {
        return "Task History: None".to_string();
    }
    let mut lines = vec!["Task History:".to_string()];
    for (i, record) in history.iter().enumerate() {
        lines.push(format!(
            "- Turn {}: Agent '{}' was given the task '{}' and responded with '{}'",
            i + 1,
            record.agent,
            record.task,
            record.response
        ));
    }
    lines.join("\n")
}

pub fn format_roster(agents: &[Agent]) -> String {
    agents
        .iter()
        .map(|agent| {
            let tools = agent.tool_names();
            let tools = if tools.is_empty() {
                "None".to_string()
            } else {
                tools.join(", ")
            };
            let skills = if agent.skills().is_empty() {
                "Not specified"
            } else {
                agent.skills()
            };
            format!(
                "Name: {}\nDescription: {}\nSkills: {skills}\nTools: {tools}",
                agent.name(),
                agent.description()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_workspace(workspace: &Map<String, Value>) -> String {
    serde_json::to_string_pretty(workspace).unwrap_or_else(|_| "{}".to_string())
}

pub fn planning_prompt(
    current_task: &str,
    workspace: &Map<String, Value>,
    agents: &[Agent],
    history: &[TaskRecord],
) -> String {
    format!(
        r#"You are the TaskForce coordinator. Your goal is to break down tasks, assign them to specialized agents, and manage communication between them.

Current Task: {current_task}
Shared Workspace:
{workspace}
Available Agents:
{roster}
{history}

Instructions:
1. Read the agents' descriptions and find the agent suited for the task. If no agent is suited, use the next most suitable agent.
2. If the current task can be broken down into smaller sub-tasks, do so. This is especially important if multiple sub-tasks can be handled by the same agent.
3. Select the most suitable agent for the current task and describe the NEXT sub-task.
4. Create a communication plan ONLY if additional information needs to be shared between agents. Avoid redundant communication.
5. Use "TASK COMPLETE" as next_task when nothing remains after the selected agent's work.
6. Output a JSON object with this structure:
```json
{{
    "selected_agent": "<Agent Name>" or "None",
    "next_task": "<Task Description>" or "TASK COMPLETE",
    "communication_plan": {{
        "<Recipient Agent Name>": {{
            "message": "<Information to send to this agent>",
            "source_agent": "<Source Agent Name (if applicable)>"
        }}
    }}
}}
```"#,
        workspace = format_workspace(workspace),
        roster = format_roster(agents),
        history = format_task_history(history),
    )
}

pub fn synthesis_prompt(
    name: &str,
    description: &str,
    initial_task: &str,
    workspace: &Map<String, Value>,
    history: &[TaskRecord],
) -> String {
    format!(
        r#"You are {name}, {description}.

Responsible for integrating the work of individual agents to provide a complete and informative answer.

Initial Task: {initial_task}
Shared Workspace: {workspace}
{history}

Instructions:
- Combine and synthesize the information from the shared workspace and task history.
- Provide a concise, well-organized final answer to the initial task.
- Do not simply list the agent responses; aim for a unified and coherent response."#,
        workspace = format_workspace(workspace),
        history = format_task_history(history),
    )
}

/// Used when the synthesis call fails.
pub fn concatenate_responses(history: &[TaskRecord]) -> String {
    if history.is_empty() {
        return NO_RESPONSES.to_string();
    }
    history
        .iter()
        .map(|r| format!("{}:\n{}", r.agent, r.response))
        .collect::<Vec<_>>()
        .join("\n\n")
}
