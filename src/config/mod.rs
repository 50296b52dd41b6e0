//! Configuration system (layered: defaults < TOML file < env < code).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::AgentSettings;
use crate::error::ArcheError;
use crate::memory::MemorySettings;
use crate::taskforce::TaskForceSettings;

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "ARCHE_CONFIG";

/// Connection settings for the bundled OpenAI-compatible client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Layered configuration for Arche.
///
/// Resolution order (later wins):
/// 1. Built-in defaults
/// 2. TOML file (explicit path or `ARCHE_CONFIG`)
/// 3. Environment variables (`.env` is loaded first if present)
/// 4. Explicit `with_*` calls in code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcheConfig {
    pub agent: AgentSettings,
    pub taskforce: TaskForceSettings,
    pub memory: MemorySettings,
    pub provider: ProviderSettings,
}

impl ArcheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().apply_env_from(|key| std::env::var(key).ok())
    }

    /// Parse a TOML document. Missing sections keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ArcheError> {
        toml::from_str(raw).map_err(|e| ArcheError::Configuration(format!("invalid config: {e}")))
    }

    /// Read a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ArcheError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ArcheError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Full layered load: file (explicit, or `ARCHE_CONFIG`) then environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ArcheError> {
        let _ = dotenvy::dotenv();
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        let base = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        Ok(base.apply_env_from(|key| std::env::var(key).ok()))
    }

    /// Overlay values from an environment lookup.
    ///
    /// Unparsable values are ignored with a warning so a typo in one variable
    /// never discards the rest of the configuration.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_env(&lookup, "ARCHE_MAX_ITERATIONS") {
            self.taskforce.max_iterations = v;
        }
        if let Some(v) = parse_env(&lookup, "ARCHE_TOOL_CONCURRENCY") {
            self.agent.tool_concurrency = v;
        }
        if let Some(ms) = parse_env::<u64, _>(&lookup, "ARCHE_MODEL_TIMEOUT_MS") {
            self.agent.model_timeout = Duration::from_millis(ms);
            self.taskforce.model_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_env::<u64, _>(&lookup, "ARCHE_TOOL_TIMEOUT_MS") {
            self.agent.tool_timeout = Duration::from_millis(ms);
        }
        if let Some(dir) = lookup("ARCHE_MEMORY_DIR").filter(|v| !v.trim().is_empty()) {
            self.memory.directory = Some(PathBuf::from(dir));
        }
        if let Some(v) = parse_env(&lookup, "ARCHE_MEMORY_HISTORY_OFFSET") {
            self.memory.history_offset = v;
        }
        if let Some(secs) = parse_env::<u64, _>(&lookup, "ARCHE_MEMORY_SAVE_INTERVAL_SECS") {
            self.memory.save_interval = Duration::from_secs(secs);
        }
        if let Some(model) = lookup("ARCHE_MODEL") {
            self.provider.model = Some(model);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.provider.base_url = Some(url);
        }
        self
    }

    pub fn with_agent(mut self, agent: AgentSettings) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_taskforce(mut self, taskforce: TaskForceSettings) -> Self {
        self.taskforce = taskforce;
        self
    }

    pub fn with_memory(mut self, memory: MemorySettings) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_provider(mut self, provider: ProviderSettings) -> Self {
        self.provider = provider;
        self
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}
