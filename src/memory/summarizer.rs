//! Background summarizer task.
//!
//! The task owns the pending-turn buffer and every file write. The request
//! path only talks to it through [`SummarizerMessage`]s, so records that
//! arrive while a summary is being generated queue up and are handled after
//! it, never lost.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::store;
use super::transcript::Turn;
use crate::provider::ModelClient;
use crate::util::timeout::with_timeout;

/// State visible to the request path.
#[derive(Debug, Default)]
pub(crate) struct SharedState {
    /// Turns not yet folded into a summary, in arrival order.
    pub turns: Vec<Turn>,
    pub summaries: Vec<String>,
}

pub(crate) type Shared = Arc<Mutex<SharedState>>;

pub(crate) fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, SharedState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub(crate) enum SummarizerMessage {
    Record(Turn),
    Flush(oneshot::Sender<()>),
}

pub(crate) struct Summarizer {
    pub client: Arc<dyn ModelClient>,
    pub shared: Shared,
    pub buffer: Vec<Turn>,
    pub chat_path: PathBuf,
    pub memory_path: PathBuf,
    pub preamble: String,
    pub update_file: bool,
    pub save_interval: Duration,
    pub summary_timeout: Duration,
}

impl Summarizer {
    pub(crate) async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<SummarizerMessage>,
        cancel: CancellationToken,
    ) {
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.save_interval, self.save_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    while let Ok(message) = rx.try_recv() {
                        self.handle(message).await;
                    }
                    self.drain().await;
                    break;
                }
                message = rx.recv() => match message {
                    Some(message) => self.handle(message).await,
                    None => {
                        self.drain().await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.drain().await;
                }
            }
        }
        debug!("memory summarizer stopped");
    }

    async fn handle(&mut self, message: SummarizerMessage) {
        match message {
            SummarizerMessage::Record(turn) => {
                if self.update_file {
                    if let Err(e) = store::append_turn(&self.chat_path, &turn).await {
                        error!(path = %self.chat_path.display(), error = %e, "failed to write chat file");
                    }
                }
                self.buffer.push(turn);
            }
            SummarizerMessage::Flush(ack) => {
                self.drain().await;
                let _ = ack.send(());
            }
        }
    }

    /// Summarize the whole buffer. On failure the buffer is kept for the
    /// next cycle.
    async fn drain(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let drained = self.buffer.len();
        let conversation = self
            .buffer
            .iter()
            .map(Turn::to_line)
            .collect::<Vec<_>>()
            .join("\n");

        let result = with_timeout(
            self.summary_timeout,
            self.client.run(&summary_prompt(&conversation)),
        )
        .await;
        if let Err(e) = self.client.reset().await {
            warn!(error = %e, "failed to reset summarizer client");
        }

        let summary = match result {
            Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            Ok(_) => {
                warn!(turns = drained, "summarizer returned an empty summary, keeping buffer");
                return;
            }
            Err(e) => {
                warn!(turns = drained, error = %e, "summarization failed, keeping buffer");
                return;
            }
        };

        if let Err(e) = store::append_summary(&self.memory_path, &summary).await {
            error!(path = %self.memory_path.display(), error = %e, "failed to write memory file");
        }
        {
            let mut state = lock(&self.shared);
            let n = drained.min(state.turns.len());
            state.turns.drain(..n);
            state.summaries.push(summary);
        }
        self.buffer.clear();

        if self.update_file {
            if let Err(e) = store::rewrite_transcript(&self.chat_path, &self.preamble, &[]).await {
                error!(path = %self.chat_path.display(), error = %e, "failed to clear chat file");
            }
        }
        debug!(turns = drained, "folded turns into memory");
    }
}

pub(crate) fn summary_prompt(conversation: &str) -> String {
    format!(
        "You are a highly advanced AI assistant tasked with summarizing a conversation.\n\
         Given the following conversation, create a concise summary, focusing on user requests \
         or preferences, actions taken, and important information exchanged.\n\
         Limit your summary to 250 words.\n\n\
         Conversation:\n{conversation}\n\n\
         Summary:"
    )
}
