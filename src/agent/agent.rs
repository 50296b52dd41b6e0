//! The Agent: one persona, one model client, an optional tool set and an
//! optional memory.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ArcheConfig;
use crate::error::ArcheError;
use crate::memory::Memory;
use crate::plan::{looks_like_tool_plan, parse_tool_plan, ParseOutcome};
use crate::provider::ModelClient;
use crate::tools::{Tool, ToolRegistry};
use crate::types::Role;
use crate::util::timeout::with_timeout;

use super::dispatch::dispatch_calls;
use super::prompts;
use super::AgentSettings;

const DEFAULT_DESCRIPTION: &str = "A helpful AI agent";
const DEFAULT_EXPECTED_OUTPUT: &str = "Concise and informative text.";
const DEFAULT_TASK: &str = "Ask me a question or give me a task.";

/// An autonomous agent executing one task per rollout.
///
/// Without tools the task goes straight to the model under the agent's
/// persona. With tools the model first produces a call plan, the calls run
/// concurrently, and a second model call turns their results into an answer.
pub struct Agent {
    name: String,
    description: String,
    skills: String,
    expected_output: String,
    task: String,
    inbox: Vec<String>,
    tools: ToolRegistry,
    memory: Option<Memory>,
    settings: AgentSettings,
    client: Arc<dyn ModelClient>,
}

impl Agent {
    pub fn new(name: impl Into<String>, client: Arc<dyn ModelClient>) -> Self {
        Self {
            name: name.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            skills: String::new(),
            expected_output: DEFAULT_EXPECTED_OUTPUT.to_string(),
            task: DEFAULT_TASK.to_string(),
            inbox: Vec::new(),
            tools: ToolRegistry::new(),
            memory: None,
            settings: AgentSettings::default(),
            client,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_skills(mut self, skills: impl Into<String>) -> Self {
        self.skills = skills.into();
        self
    }

    /// Output style the answer should follow.
    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    /// Add a tool. Fails when the name is already taken.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, ArcheError> {
        self.add_tool(tool)?;
        Ok(self)
    }

    pub fn with_memory(mut self, memory: Memory) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Take agent settings from a loaded configuration.
    pub fn with_config(self, config: &ArcheConfig) -> Self {
        self.with_settings(config.agent.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn skills(&self) -> &str {
        &self.skills
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn set_task(&mut self, task: impl Into<String>) {
        self.task = task.into();
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn memory(&self) -> Option<&Memory> {
        self.memory.as_ref()
    }

    pub fn memory_mut(&mut self) -> Option<&mut Memory> {
        self.memory.as_mut()
    }

    pub fn add_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), ArcheError> {
        self.tools.add_tool(tool)
    }

    pub fn remove_tool(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove_tool(name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Queue information to prepend to the next rollout's task.
    pub fn deliver(&mut self, message: impl Into<String>) {
        self.inbox.push(message.into());
    }

    pub fn pending_messages(&self) -> &[String] {
        &self.inbox
    }

    pub(crate) fn clear_inbox(&mut self) {
        self.inbox.clear();
    }

    /// Task the next rollout will execute, including delivered messages.
    pub fn effective_task(&self) -> String {
        if self.inbox.is_empty() {
            return self.task.clone();
        }
        format!("Previous Task:\n{}\n\n{}", self.task, self.inbox.join("\n\n"))
    }

    /// Assign `task` and run it.
    pub async fn run_task(&mut self, task: impl Into<String>) -> String {
        self.set_task(task);
        self.rollout().await
    }

    /// Execute the current task. Never fails: every error path degrades to
    /// an explanatory answer.
    pub async fn rollout(&mut self) -> String {
        let rollout_id = Uuid::new_v4();
        self.task = self.effective_task();
        self.inbox.clear();
        let task = self.task.clone();

        info!(
            rollout_id = %rollout_id,
            agent = %self.name,
            tools = self.tools.len(),
            "agent rollout started"
        );

        let response = if self.has_tools() {
            self.run_with_tools(&task).await
        } else {
            self.run_without_tools(&task).await
        };

        if let Some(memory) = &self.memory {
            memory.record_turn(Role::User, task.as_str(), false);
            memory.record_turn(Role::Assistant, response.as_str(), false);
        }

        info!(rollout_id = %rollout_id, agent = %self.name, "agent rollout finished");
        response
    }

    async fn run_without_tools(&self, task: &str) -> String {
        let persona = prompts::persona_prompt(&self.name, &self.description, &self.expected_output);
        self.initialize(&persona).await;

        let prompt = match &self.memory {
            Some(memory) => memory.augmented_prompt(task),
            None => task.to_string(),
        };

        match self.call_model(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(agent = %self.name, error = %e, "model call failed");
                prompts::NO_RESPONSE_FALLBACK.to_string()
            }
        }
    }

    async fn run_with_tools(&self, task: &str) -> String {
        let schemas = self.tools.schemas();

        self.initialize(&prompts::planning_prompt(&schemas)).await;
        let prompt = match &self.memory {
            Some(memory) => memory.augmented_prompt(task),
            None => task.to_string(),
        };
        let raw = match self.call_model(&prompt).await {
            Ok(raw) => raw.trim().to_string(),
            Err(e) => {
                warn!(agent = %self.name, error = %e, "planning call failed");
                return prompts::PLANNING_FALLBACK.to_string();
            }
        };
        debug!(agent = %self.name, raw = %raw, "planning response");

        let plan = match parse_tool_plan(&raw) {
            ParseOutcome::Parsed(plan) => plan,
            ParseOutcome::Unparsed(raw) => {
                warn!(agent = %self.name, "model output is not a tool plan, returning it as the answer");
                return raw;
            }
        };

        let results = dispatch_calls(
            &self.tools,
            &plan.func_calling,
            self.settings.tool_concurrency,
            self.settings.tool_timeout,
        )
        .await;
        debug!(agent = %self.name, results = ?results, "tool results");

        self.initialize(&prompts::synthesis_prompt(&self.name, &schemas, &self.expected_output))
            .await;
        match self.call_model(&prompts::synthesis_input(task, &results)).await {
            Ok(answer) if looks_like_tool_plan(&answer) => {
                warn!(agent = %self.name, "synthesis returned a tool plan");
                prompts::MALFORMED_SYNTHESIS.to_string()
            }
            Ok(answer) => answer,
            Err(e) => {
                warn!(agent = %self.name, error = %e, "synthesis failed, retrying without tool results");
                match self.call_model(&prompts::fallback_input(task)).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(agent = %self.name, error = %e, "fallback synthesis failed");
                        prompts::SYNTHESIS_FALLBACK.to_string()
                    }
                }
            }
        }
    }

    async fn initialize(&self, system_prompt: &str) {
        if let Err(e) = self.client.initialize(system_prompt, &[]).await {
            warn!(agent = %self.name, error = %e, "failed to initialize model client");
        }
    }

    async fn call_model(&self, prompt: &str) -> Result<String, ArcheError> {
        let timeout = self.settings.model_timeout;
        self.settings
            .retry
            .execute(|| with_timeout(timeout, self.client.run(prompt)))
            .await
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("tools", &self.tools.names())
            .field("memory", &self.memory.is_some())
            .finish()
    }
}
