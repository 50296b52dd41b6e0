//! The per-iteration plan returned by the coordinator model.

use serde::Deserialize;
use serde_json::Value;

use crate::plan::{parse_tolerant, ParseOutcome};

/// Sentinel `next_task` value ending the loop.
pub const TASK_COMPLETE: &str = "TASK COMPLETE";

/// Information the coordinator wants forwarded to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Communication {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source_agent: Option<String>,
}

impl Communication {
    /// Block prepended to the recipient's next task.
    pub fn render(&self) -> String {
        let mut block = format!("New Information From TaskForce:\n{}", self.message);
        if let Some(source) = self.source_agent.as_deref().filter(|s| !s.trim().is_empty()) {
            block.push_str(&format!("\n(Source: {source})"));
        }
        block
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommunicationEntry {
    Detailed(Communication),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationPlan {
    /// `None` when the coordinator selected no agent.
    pub selected_agent: Option<String>,
    pub next_task: String,
    /// Recipient and message, in plan order.
    pub communication_plan: Vec<(String, Communication)>,
}

impl IterationPlan {
    /// Interpret a JSON value as a plan. Both `selected_agent` and
    /// `next_task` must be present.
    pub fn from_value(value: Value) -> Option<Self> {
        let object = value.as_object()?;

        let selected_agent = match object.get("selected_agent")? {
            Value::Null => None,
            Value::String(name) => {
                let name = name.trim();
                (!name.is_empty() && !name.eq_ignore_ascii_case("none")).then(|| name.to_string())
            }
            _ => return None,
        };
        let next_task = object.get("next_task")?.as_str()?.to_string();

        let communication_plan = match object.get("communication_plan") {
            Some(Value::Object(entries)) => entries
                .iter()
                .filter_map(|(recipient, entry)| {
                    match serde_json::from_value::<CommunicationEntry>(entry.clone()) {
                        Ok(CommunicationEntry::Detailed(c)) => Some((recipient.clone(), c)),
                        Ok(CommunicationEntry::Message(message)) => Some((
                            recipient.clone(),
                            Communication {
                                message,
                                source_agent: None,
                            },
                        )),
                        Err(_) => {
                            tracing::warn!(recipient = %recipient, "ignoring malformed communication entry");
                            None
                        }
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Some(Self {
            selected_agent,
            next_task,
            communication_plan,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.next_task.trim().eq_ignore_ascii_case(TASK_COMPLETE)
    }
}

pub fn parse_iteration_plan(raw: &str) -> ParseOutcome<IterationPlan> {
    parse_tolerant(raw, IterationPlan::from_value)
}
