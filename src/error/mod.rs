//! Error types for Arche.

use thiserror::Error;

/// Primary error type for all Arche operations.
#[derive(Error, Debug)]
pub enum ArcheError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Tool '{tool_name}' failed: {message}")]
    ToolInvocation { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Parameter '{parameter}' of tool '{tool_name}' has type 'enum' but no options list")]
    EnumOptionsMissing { tool_name: String, parameter: String },

    #[error("Parameter '{parameter}' is declared twice on tool '{tool_name}'")]
    DuplicateParameter { tool_name: String, parameter: String },

    #[error("A tool named '{0}' is already registered")]
    DuplicateTool(String),

    #[error("An agent named '{0}' is already part of the task force")]
    DuplicateAgent(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    ToolExecution,
    Model,
    Unknown,
}

impl ArcheError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool invocation error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_)
            | Self::EnumOptionsMissing { .. }
            | Self::DuplicateParameter { .. }
            | Self::DuplicateTool(_)
            | Self::DuplicateAgent(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::ToolNotFound(_) | Self::ToolInvocation { .. } | Self::InvalidArgument(_) => {
                ErrorCategory::ToolExecution
            }
            Self::Model(_) => ErrorCategory::Model,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ArcheError>;
