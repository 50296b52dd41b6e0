//! Shared test helpers and a scripted mock client.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use arche::error::ArcheError;
use arche::provider::ModelClient;
use arche::tools::{FunctionTool, ParameterSpec, Tool, ToolDescriptor};
use arche::types::ModelMessage;

/// A mock client that replays queued replies and records every call.
#[derive(Default)]
pub struct MockClient {
    replies: Mutex<VecDeque<Result<String, ArcheError>>>,
    prompts: Mutex<Vec<String>>,
    system_prompts: Mutex<Vec<String>>,
    resets: Mutex<usize>,
}

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Client that answers with `replies` in order.
    pub fn scripted(replies: &[&str]) -> Arc<Self> {
        let client = Self::new();
        for reply in replies {
            client.queue_text(reply);
        }
        client
    }

    pub fn queue_text(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
    }

    pub fn queue_error(&self, error: ArcheError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Prompts passed to `run`, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn run_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.system_prompts.lock().unwrap().clone()
    }

    pub fn reset_count(&self) -> usize {
        *self.resets.lock().unwrap()
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for MockClient {
    async fn initialize(
        &self,
        system_prompt: &str,
        _prior_messages: &[ModelMessage],
    ) -> Result<(), ArcheError> {
        self.system_prompts
            .lock()
            .unwrap()
            .push(system_prompt.to_string());
        Ok(())
    }

    async fn run(&self, prompt: &str) -> Result<String, ArcheError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()))
    }

    async fn reset(&self) -> Result<(), ArcheError> {
        *self.resets.lock().unwrap() += 1;
        Ok(())
    }
}

/// `gcd(a, b)` over two integer parameters.
pub fn gcd_tool() -> Arc<dyn Tool> {
    let descriptor = ToolDescriptor::builder("gcd", "Greatest common divisor of two integers")
        .param(
            ParameterSpec::new("a")
                .with_type_alias("int")
                .description("First number"),
        )
        .param(
            ParameterSpec::new("b")
                .with_type_alias("int")
                .description("Second number"),
        )
        .build()
        .unwrap();
    Arc::new(FunctionTool::from_fn(descriptor, |args| {
        let (mut a, mut b) = (args.get_i64("a")?, args.get_i64("b")?);
        while b != 0 {
            (a, b) = (b, a % b);
        }
        Ok(serde_json::json!(a.abs()))
    }))
}

/// Fixed clock; takes no parameters.
pub fn clock_tool() -> Arc<dyn Tool> {
    let descriptor = ToolDescriptor::builder("clock", "Current time")
        .build()
        .unwrap();
    Arc::new(FunctionTool::from_fn(descriptor, |_| {
        Ok(serde_json::json!("12:00"))
    }))
}
