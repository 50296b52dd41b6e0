//! Bounded conversation memory with background summarization.
//!
//! A [`Memory`] keeps the live transcript of un-summarized turns and the
//! distilled summaries produced from earlier turns. Prompts are augmented
//! with both, trimming the transcript to a character budget. A background
//! task periodically folds buffered turns into a new summary.

pub mod store;
pub(crate) mod summarizer;
pub mod transcript;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::provider::ModelClient;
use crate::types::Role;

pub use transcript::{trim_history, Turn};

use summarizer::{lock, Shared, SharedState, Summarizer, SummarizerMessage};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant";
const DEFAULT_HISTORY_OFFSET: usize = 10_250;
const DEFAULT_PROMPT_ALLOWANCE: usize = 10;
const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_SUMMARY_TIMEOUT: Duration = Duration::from_secs(120);
const CHAT_FILE_NAME: &str = "chat.txt";
const MEMORY_FILE_NAME: &str = "memory.txt";
const FALLBACK_DIR: &str = "MEMORIES";

/// Memory configuration.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// When false, prompts pass through and turns are only kept if forced.
    #[builder(default = true)]
    pub enabled: bool,
    /// Preamble placed before the transcript and written at the top of the
    /// chat file.
    #[builder(into, default = DEFAULT_SYSTEM_PROMPT.to_string())]
    pub system_prompt: String,
    /// Character budget for preamble plus transcript.
    #[builder(default = DEFAULT_HISTORY_OFFSET)]
    pub history_offset: usize,
    #[builder(default = DEFAULT_PROMPT_ALLOWANCE)]
    pub prompt_allowance: usize,
    #[builder(default = DEFAULT_SAVE_INTERVAL)]
    #[serde(rename = "save_interval_secs", with = "duration_secs")]
    pub save_interval: Duration,
    #[builder(default = DEFAULT_SUMMARY_TIMEOUT)]
    #[serde(rename = "summary_timeout_secs", with = "duration_secs")]
    pub summary_timeout: Duration,
    /// Mirror turns into the chat file.
    #[builder(default = true)]
    pub update_file: bool,
    /// Directory holding `chat.txt` and `memory.txt`.
    #[builder(into)]
    pub directory: Option<PathBuf>,
    /// Explicit chat file, overriding `directory`.
    #[builder(into)]
    pub chat_file: Option<PathBuf>,
    /// Explicit memory file, overriding `directory`.
    #[builder(into)]
    pub memory_file: Option<PathBuf>,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MemorySettings {
    pub fn chat_path(&self) -> PathBuf {
        self.chat_file
            .clone()
            .unwrap_or_else(|| self.resolved_directory().join(CHAT_FILE_NAME))
    }

    pub fn memory_path(&self) -> PathBuf {
        self.memory_file
            .clone()
            .unwrap_or_else(|| self.resolved_directory().join(MEMORY_FILE_NAME))
    }

    fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(default_directory)
    }
}

/// `<data_dir>/arche/memories`, or `./MEMORIES` without a home directory.
pub fn default_directory() -> PathBuf {
    directories::ProjectDirs::from("", "", "arche")
        .map(|dirs| dirs.data_dir().join("memories"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR))
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

/// Live transcript, summaries and the handle to the summarizer task.
pub struct Memory {
    settings: MemorySettings,
    shared: Shared,
    tx: mpsc::UnboundedSender<SummarizerMessage>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Memory {
    /// Load persisted state and start the summarizer.
    ///
    /// Turns left in the chat file by an earlier process are restored into
    /// the transcript and queued for summarization. File errors are logged
    /// and the memory continues in-process.
    pub async fn open(settings: MemorySettings, client: Arc<dyn ModelClient>) -> Self {
        let chat_path = settings.chat_path();
        let memory_path = settings.memory_path();

        let summaries = store::load_summaries(&memory_path).await.unwrap_or_else(|e| {
            error!(path = %memory_path.display(), error = %e, "failed to load memory file");
            Vec::new()
        });
        let restored = store::load_turns(&chat_path, &settings.system_prompt)
            .await
            .unwrap_or_else(|e| {
                error!(path = %chat_path.display(), error = %e, "failed to load chat file");
                Vec::new()
            });
        if settings.update_file {
            if let Err(e) =
                store::rewrite_transcript(&chat_path, &settings.system_prompt, &restored).await
            {
                error!(path = %chat_path.display(), error = %e, "failed to initialize chat file");
            }
        }
        if !restored.is_empty() {
            tracing::info!(turns = restored.len(), "restored un-summarized turns");
        }

        let shared: Shared = Arc::new(Mutex::new(SharedState {
            turns: restored.clone(),
            summaries,
        }));
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let summarizer = Summarizer {
            client,
            shared: Arc::clone(&shared),
            buffer: restored,
            chat_path,
            memory_path,
            preamble: settings.system_prompt.clone(),
            update_file: settings.update_file,
            save_interval: settings.save_interval,
            summary_timeout: settings.summary_timeout,
        };
        let task = tokio::spawn(summarizer.run(rx, cancel.clone()));

        Self {
            settings,
            shared,
            tx,
            cancel,
            task: Some(task),
        }
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    /// Build the prompt for `task`: preamble, trimmed transcript ending with
    /// the task as a user turn, then any summaries.
    pub fn augmented_prompt(&self, task: &str) -> String {
        if !self.settings.enabled {
            return task.to_string();
        }
        let (history, summaries) = {
            let state = lock(&self.shared);
            (transcript::render(&state.turns), state.summaries.join("\n"))
        };

        let intro = &self.settings.system_prompt;
        let candidate = format!("{history}\n{}: {task}", Role::User);
        let trimmed = trim_history(
            &candidate,
            intro.len(),
            self.settings.history_offset,
            self.settings.prompt_allowance,
        );

        let mut prompt = format!("{intro}\n{trimmed}");
        if !summaries.is_empty() {
            prompt.push_str("\nMemory:\n");
            prompt.push_str(&summaries);
        }
        prompt
    }

    /// Append a turn to the transcript and queue it for summarization.
    ///
    /// Ignored while memory is disabled unless `force` is set.
    pub fn record_turn(&self, role: Role, content: impl Into<String>, force: bool) {
        if !self.settings.enabled && !force {
            return;
        }
        let turn = Turn::new(role, content);
        let mut state = lock(&self.shared);
        state.turns.push(turn.clone());
        if self.tx.send(SummarizerMessage::Record(turn)).is_err() {
            warn!("memory summarizer is not running, turn kept in transcript only");
        }
    }

    pub fn record_user_message(&self, content: impl Into<String>) {
        self.record_turn(Role::User, content, false);
    }

    /// Summarize everything recorded so far and wait for the attempt.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SummarizerMessage::Flush(ack_tx)).is_err() {
            warn!("memory summarizer is not running, nothing to flush");
            return;
        }
        let _ = ack_rx.await;
    }

    /// Stop the summarizer after a final summarization attempt.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "memory summarizer task failed");
            }
        }
    }

    /// Summaries in the order they were produced.
    pub fn summaries(&self) -> Vec<String> {
        lock(&self.shared).summaries.clone()
    }

    /// Turns not yet folded into a summary.
    pub fn transcript(&self) -> Vec<Turn> {
        lock(&self.shared).turns.clone()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.shared);
        f.debug_struct("Memory")
            .field("chat_path", &self.settings.chat_path())
            .field("turns", &state.turns.len())
            .field("summaries", &state.summaries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let built = MemorySettings::builder().history_offset(2_000).build();
        assert_eq!(built.history_offset, 2_000);
        assert_eq!(built.save_interval, DEFAULT_SAVE_INTERVAL);
        assert_eq!(built.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(built.enabled);
    }

    #[test]
    fn explicit_files_override_directory() {
        let settings = MemorySettings::builder()
            .directory("/data/mem")
            .chat_file("/tmp/chat.log")
            .build();
        assert_eq!(settings.chat_path(), PathBuf::from("/tmp/chat.log"));
        assert_eq!(settings.memory_path(), PathBuf::from("/data/mem/memory.txt"));
    }
}
