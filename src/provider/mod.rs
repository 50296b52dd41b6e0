//! Language-model client contract and the bundled HTTP client.

pub mod http;

#[cfg(feature = "openai-compatible")]
pub mod openai_compatible;

use async_trait::async_trait;

use crate::error::ArcheError;
use crate::types::ModelMessage;

/// The narrow interface agents, task forces and memory need from a model.
///
/// A client keeps its own conversational state. `initialize` replaces the
/// system instructions (and optionally seeds prior turns), `run` performs one
/// synchronous completion and `reset` drops any accumulated state while
/// keeping the current system instructions.
///
/// Implementations use interior mutability: one client may be shared between
/// an agent and the components it owns, but callers never run two
/// conversations on the same client at once.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Establish (or replace) the system instructions and prior messages.
    async fn initialize(
        &self,
        system_prompt: &str,
        prior_messages: &[ModelMessage],
    ) -> Result<(), ArcheError>;

    /// Run one completion for `prompt` and return the text reply.
    async fn run(&self, prompt: &str) -> Result<String, ArcheError>;

    /// Clear client-side conversational state.
    async fn reset(&self) -> Result<(), ArcheError>;
}
