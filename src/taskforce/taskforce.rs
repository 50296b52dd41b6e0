//! The TaskForce coordinator loop.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::Agent;
use crate::config::ArcheConfig;
use crate::error::ArcheError;
use crate::plan::ParseOutcome;
use crate::provider::ModelClient;
use crate::util::timeout::with_timeout;

use super::plan::{parse_iteration_plan, Communication, IterationPlan};
use super::prompts;
use super::types::{TaskForceOutcome, TaskRecord, Termination};
use super::TaskForceSettings;

/// Coordinates a roster of agents on one task.
///
/// Each iteration the coordinator model picks an agent, names the follow-up
/// task and optionally forwards information between agents. The loop ends on
/// `TASK COMPLETE`, when no agent is selected, when the plan cannot be read,
/// or when the iteration budget runs out. A final model call consolidates
/// every agent response into one answer.
pub struct TaskForce {
    name: String,
    description: String,
    agents: Vec<Agent>,
    client: Arc<dyn ModelClient>,
    settings: TaskForceSettings,
    shared_workspace: Map<String, Value>,
    task_history: Vec<TaskRecord>,
}

impl TaskForce {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        client: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agents: Vec::new(),
            client,
            settings: TaskForceSettings::default(),
            shared_workspace: Map::new(),
            task_history: Vec::new(),
        }
    }

    pub fn with_agent(mut self, agent: Agent) -> Result<Self, ArcheError> {
        self.add_agent(agent)?;
        Ok(self)
    }

    pub fn with_settings(mut self, settings: TaskForceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_config(self, config: &ArcheConfig) -> Self {
        self.with_settings(config.taskforce.clone())
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.settings.max_iterations = max_iterations;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn settings(&self) -> &TaskForceSettings {
        &self.settings
    }

    /// Add an agent. Names must be unique.
    pub fn add_agent(&mut self, agent: Agent) -> Result<(), ArcheError> {
        if self.agent(agent.name()).is_some() {
            return Err(ArcheError::DuplicateAgent(agent.name().to_string()));
        }
        self.agents.push(agent);
        Ok(())
    }

    pub fn remove_agent(&mut self, name: &str) -> Option<Agent> {
        let index = self.agents.iter().position(|a| a.name() == name)?;
        Some(self.agents.remove(index))
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name() == name)
    }

    pub fn agent_mut(&mut self, name: &str) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.name() == name)
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(Agent::name).collect()
    }

    /// Latest response per agent from the current (or last) rollout.
    pub fn shared_workspace(&self) -> &Map<String, Value> {
        &self.shared_workspace
    }

    pub fn task_history(&self) -> &[TaskRecord] {
        &self.task_history
    }

    /// Run `task` to completion. Never fails: planning and synthesis errors
    /// end the loop early or degrade the final answer.
    pub async fn rollout(&mut self, task: &str) -> TaskForceOutcome {
        let rollout_id = Uuid::new_v4();
        let max_iterations = self.settings.max_iterations;
        self.shared_workspace.clear();
        self.task_history.clear();
        for agent in &mut self.agents {
            agent.clear_inbox();
        }

        info!(
            rollout_id = %rollout_id,
            taskforce = %self.name,
            agents = self.agents.len(),
            max_iterations,
            "taskforce rollout started"
        );

        let mut current_task = task.to_string();
        let mut iterations = 0;
        let mut termination = Termination::IterationBudgetExhausted;

        while iterations < max_iterations {
            iterations += 1;
            info!(rollout_id = %rollout_id, iteration = iterations, max_iterations, "planning iteration");

            let Some(plan) = self.plan_iteration(&current_task).await else {
                termination = Termination::PlanningExhausted;
                break;
            };

            let Some(requested) = plan.selected_agent.clone() else {
                info!(rollout_id = %rollout_id, "coordinator selected no agent");
                termination = Termination::NoAgentFound { requested: None };
                break;
            };
            let Some(index) = self.agents.iter().position(|a| a.name() == requested) else {
                warn!(rollout_id = %rollout_id, agent = %requested, "selected agent is not in the roster");
                termination = Termination::NoAgentFound {
                    requested: Some(requested),
                };
                break;
            };

            self.agents[index].set_task(current_task.clone());
            self.deliver_communications(&plan.communication_plan);

            info!(rollout_id = %rollout_id, agent = %requested, "delegating task");
            let agent = &mut self.agents[index];
            let response = agent.rollout().await;
            let record = TaskRecord {
                agent: agent.name().to_string(),
                task: agent.task().to_string(),
                response: response.clone(),
            };
            self.shared_workspace
                .insert(record.agent.clone(), Value::String(response));
            self.task_history.push(record);

            if plan.is_complete() {
                info!(rollout_id = %rollout_id, "coordinator reported task complete");
                termination = Termination::SentinelReached;
                break;
            }
            current_task = plan.next_task;
        }

        let warning = (termination == Termination::IterationBudgetExhausted).then(|| {
            warn!(rollout_id = %rollout_id, max_iterations, "{}", prompts::BUDGET_WARNING);
            prompts::BUDGET_WARNING.to_string()
        });

        let response = self.synthesize(task).await;
        info!(rollout_id = %rollout_id, iterations, termination = ?termination, "taskforce rollout finished");

        TaskForceOutcome {
            response,
            termination,
            iterations,
            warning,
        }
    }

    async fn plan_iteration(&self, current_task: &str) -> Option<IterationPlan> {
        let prompt = prompts::planning_prompt(
            current_task,
            &self.shared_workspace,
            &self.agents,
            &self.task_history,
        );
        let raw = match self.call_model(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "planning call failed");
                return None;
            }
        };
        debug!(raw = %raw, "coordinator planning response");

        match parse_iteration_plan(&raw) {
            ParseOutcome::Parsed(plan) => Some(plan),
            ParseOutcome::Unparsed(_) => {
                warn!("coordinator reply is not a valid plan");
                None
            }
        }
    }

    fn deliver_communications(&mut self, communications: &[(String, Communication)]) {
        for (recipient, communication) in communications {
            match self.agent_mut(recipient) {
                Some(agent) => {
                    debug!(recipient = %recipient, "delivering communication");
                    agent.deliver(communication.render());
                }
                None => warn!(recipient = %recipient, "communication addressed to unknown agent"),
            }
        }
    }

    async fn synthesize(&self, initial_task: &str) -> String {
        let prompt = prompts::synthesis_prompt(
            &self.name,
            &self.description,
            initial_task,
            &self.shared_workspace,
            &self.task_history,
        );
        match self.call_model(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "final synthesis failed, concatenating agent responses");
                prompts::concatenate_responses(&self.task_history)
            }
        }
    }

    /// One coordinator call followed by a client reset.
    ///
    /// The persona is re-established first since agents may share the client.
    async fn call_model(&self, prompt: &str) -> Result<String, ArcheError> {
        let persona = prompts::coordinator_persona(&self.name, &self.description);
        if let Err(e) = self.client.initialize(&persona, &[]).await {
            warn!(error = %e, "failed to initialize coordinator client");
        }
        let timeout = self.settings.model_timeout;
        let result = self
            .settings
            .retry
            .execute(|| with_timeout(timeout, self.client.run(prompt)))
            .await;
        if let Err(e) = self.client.reset().await {
            warn!(error = %e, "failed to reset coordinator client");
        }
        result
    }
}

impl std::fmt::Debug for TaskForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskForce")
            .field("name", &self.name)
            .field("agents", &self.agent_names())
            .field("max_iterations", &self.settings.max_iterations)
            .finish()
    }
}
