//! Client for any OpenAI-compatible Chat Completions API.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::ArcheConfig;
use crate::error::ArcheError;
use crate::types::{ModelMessage, Role};

use super::http::{bearer_headers, shared_client, status_to_error};
use super::ModelClient;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Default)]
struct ConversationState {
    system_prompt: Option<String>,
    messages: Vec<ModelMessage>,
}

/// Stateful chat client speaking the `/chat/completions` protocol.
///
/// Every `run` appends the prompt and the reply to the client's history, so
/// consecutive calls form one conversation until `initialize` or `reset`.
pub struct OpenAiCompatibleClient {
    model: String,
    api_key: String,
    base_url: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    state: Mutex<ConversationState>,
}

impl OpenAiCompatibleClient {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            max_tokens: None,
            state: Mutex::new(ConversationState::default()),
        }
    }

    /// Build a client from the `[provider]` section of the configuration.
    pub fn from_config(config: &ArcheConfig) -> Result<Self, ArcheError> {
        let provider = &config.provider;
        let api_key = provider
            .api_key
            .clone()
            .ok_or_else(|| ArcheError::Authentication("Missing OPENAI_API_KEY".into()))?;
        let model = provider
            .model
            .clone()
            .ok_or_else(|| ArcheError::Configuration("No model configured (ARCHE_MODEL)".into()))?;
        let mut client = Self::new(model, api_key);
        if let Some(base_url) = &provider.base_url {
            client = client.with_base_url(base_url.clone());
        }
        client.temperature = provider.temperature;
        client.max_tokens = provider.max_tokens;
        Ok(client)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(
        &self,
        system_prompt: Option<&str>,
        history: &[ModelMessage],
    ) -> serde_json::Value {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(system) = system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        for message in history {
            messages.push(serde_json::json!({
                "role": role_name(message.role),
                "content": message.content,
            }));
        }

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(temp) = self.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if let Some(max) = self.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
        }
        body
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatibleClient {
    async fn initialize(
        &self,
        system_prompt: &str,
        prior_messages: &[ModelMessage],
    ) -> Result<(), ArcheError> {
        let mut state = self.state.lock().await;
        state.system_prompt = Some(system_prompt.to_string());
        state.messages = prior_messages.to_vec();
        Ok(())
    }

    async fn run(&self, prompt: &str) -> Result<String, ArcheError> {
        let mut state = self.state.lock().await;
        let mut history = state.messages.clone();
        history.push(ModelMessage::user(prompt));

        let body = self.build_request_body(state.system_prompt.as_deref(), &history);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, messages = history.len(), "chat completion request");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: ChatCompletionResponse = resp.json().await?;
        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ArcheError::api(200, "No choices in chat completion response"))?;

        history.push(ModelMessage::assistant(text.clone()));
        state.messages = history;
        Ok(text)
    }

    async fn reset(&self) -> Result<(), ArcheError> {
        self.state.lock().await.messages.clear();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
