//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::descriptor::ToolDescriptor;
use crate::error::ArcheError;

/// Core tool trait. Implement it to expose a capability to an agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description, parameters and kind.
    fn descriptor(&self) -> &ToolDescriptor;

    /// Tool name (must match what the model calls).
    fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Execute the tool with validated arguments.
    async fn execute(&self, args: &ToolArguments) -> Result<serde_json::Value, ArcheError>;
}

type ToolHandler = dyn Fn(ToolArguments) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ArcheError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FunctionTool {
    descriptor: ToolDescriptor,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    /// Create a tool from an async closure.
    pub fn new<F, Fut>(descriptor: ToolDescriptor, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ArcheError>> + Send + 'static,
    {
        Self {
            descriptor,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    /// Create a tool from a synchronous closure.
    pub fn from_fn<F>(descriptor: ToolDescriptor, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Result<serde_json::Value, ArcheError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Self::new(descriptor, move |args| {
            let handler = Arc::clone(&handler);
            async move { handler(args) }
        })
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, args: &ToolArguments) -> Result<serde_json::Value, ArcheError> {
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.descriptor.name())
            .field("kind", &self.descriptor.kind())
            .finish()
    }
}
