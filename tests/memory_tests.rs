//! Tests for the bounded memory and its background summarizer.

mod common;

use std::path::Path;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use arche::agent::Agent;
use arche::error::ArcheError;
use arche::memory::{Memory, MemorySettings, Turn};
use arche::types::Role;

use common::{gcd_tool, MockClient};

const PREAMBLE: &str = "You are a helpful AI assistant";

fn settings(dir: &Path) -> MemorySettings {
    MemorySettings::builder()
        .directory(dir.to_path_buf())
        .save_interval(Duration::from_secs(3600))
        .build()
}

#[tokio::test]
async fn flush_folds_turns_into_a_summary() {
    let dir = TempDir::new().unwrap();
    let summarizer = MockClient::scripted(&["The user asked what Rust is."]);
    let memory = Memory::open(settings(dir.path()), summarizer.clone()).await;

    memory.record_turn(Role::User, "What is Rust?", false);
    memory.record_turn(Role::Assistant, "A systems programming language.", false);
    assert_eq!(memory.transcript().len(), 2);

    memory.flush().await;

    assert_eq!(memory.summaries(), vec!["The user asked what Rust is.".to_string()]);
    assert!(memory.transcript().is_empty());

    let summary_prompt = &summarizer.prompts()[0];
    assert!(summary_prompt.contains("User: What is Rust?"));
    assert!(summary_prompt.contains("Assistant: A systems programming language."));
    assert_eq!(summarizer.reset_count(), 1);

    let memory_file = std::fs::read_to_string(dir.path().join("memory.txt")).unwrap();
    assert_eq!(memory_file.trim(), "The user asked what Rust is.");
    let chat_file = std::fs::read_to_string(dir.path().join("chat.txt")).unwrap();
    assert_eq!(chat_file, format!("{PREAMBLE}\n"));
}

#[tokio::test]
async fn failed_summary_keeps_turns_for_the_next_cycle() {
    let dir = TempDir::new().unwrap();
    let summarizer = MockClient::new();
    summarizer.queue_error(ArcheError::Timeout(120_000));
    let memory = Memory::open(settings(dir.path()), summarizer.clone()).await;

    memory.record_user_message("Remember that my name is Ada.");
    memory.flush().await;

    assert!(memory.summaries().is_empty());
    assert_eq!(memory.transcript().len(), 1);
    let chat_file = std::fs::read_to_string(dir.path().join("chat.txt")).unwrap();
    assert!(chat_file.contains("User: Remember that my name is Ada."));

    summarizer.queue_text("The user's name is Ada.");
    memory.record_turn(Role::Assistant, "Noted.", false);
    memory.flush().await;

    assert_eq!(memory.summaries(), vec!["The user's name is Ada.".to_string()]);
    assert!(memory.transcript().is_empty());
    let second_prompt = &summarizer.prompts()[1];
    assert!(second_prompt.contains("User: Remember that my name is Ada."));
    assert!(second_prompt.contains("Assistant: Noted."));
}

#[tokio::test]
async fn unsummarized_turns_survive_a_restart() {
    let dir = TempDir::new().unwrap();

    let failing = MockClient::new();
    failing.queue_error(ArcheError::Model("unavailable".into()));
    let mut first = Memory::open(settings(dir.path()), failing).await;
    first.record_turn(Role::User, "line one\nline two", false);
    first.record_turn(Role::Assistant, "ok", false);
    first.shutdown().await;
    assert_eq!(first.transcript().len(), 2);

    let summarizer = MockClient::scripted(&["Two lines were shared."]);
    let second = Memory::open(settings(dir.path()), summarizer.clone()).await;
    assert_eq!(
        second.transcript(),
        vec![
            Turn::new(Role::User, "line one\nline two"),
            Turn::new(Role::Assistant, "ok"),
        ]
    );

    second.flush().await;
    assert_eq!(second.summaries(), vec!["Two lines were shared.".to_string()]);
}

#[tokio::test]
async fn summaries_are_loaded_on_open() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("memory.txt"), "first summary\n\nsecond summary\n").unwrap();

    let memory = Memory::open(settings(dir.path()), MockClient::new()).await;

    assert_eq!(
        memory.summaries(),
        vec!["first summary".to_string(), "second summary".to_string()]
    );
}

#[tokio::test]
async fn augmented_prompt_includes_history_and_memory() {
    let dir = TempDir::new().unwrap();
    let memory = Memory::open(settings(dir.path()), MockClient::scripted(&["Ada likes Rust."])).await;

    memory.record_user_message("I like Rust.");
    memory.flush().await;
    memory.record_turn(Role::User, "Hi again", false);
    memory.record_turn(Role::Assistant, "Welcome back!", false);

    let prompt = memory.augmented_prompt("What do I like?");

    assert_eq!(
        prompt,
        format!(
            "{PREAMBLE}\n\nUser: Hi again\nAssistant: Welcome back!\nUser: What do I like?\nMemory:\nAda likes Rust."
        )
    );
}

#[tokio::test]
async fn long_history_is_trimmed_at_a_user_boundary() {
    let dir = TempDir::new().unwrap();
    let settings = MemorySettings::builder()
        .directory(dir.path().to_path_buf())
        .save_interval(Duration::from_secs(3600))
        .history_offset(PREAMBLE.len() + 120)
        .build();
    let memory = Memory::open(settings, MockClient::new()).await;

    for i in 0..10 {
        memory.record_turn(Role::User, format!("question number {i}"), false);
        memory.record_turn(Role::Assistant, format!("answer number {i}"), false);
    }

    let prompt = memory.augmented_prompt("last question");
    let history = prompt.strip_prefix(&format!("{PREAMBLE}\n")).unwrap();

    assert!(history.starts_with("... \nUser:"));
    assert!(history.ends_with("\nUser: last question"));
    assert!(history.len() <= 120 + memory.settings().prompt_allowance);
    assert!(!history.contains("question number 0"));
}

#[tokio::test]
async fn disabled_memory_passes_prompts_through() {
    let dir = TempDir::new().unwrap();
    let settings = MemorySettings::builder()
        .enabled(false)
        .directory(dir.path().to_path_buf())
        .save_interval(Duration::from_secs(3600))
        .build();
    let memory = Memory::open(settings, MockClient::new()).await;

    memory.record_turn(Role::User, "ignored", false);
    assert!(memory.transcript().is_empty());
    assert_eq!(memory.augmented_prompt("plain task"), "plain task");

    memory.record_turn(Role::User, "kept", true);
    assert_eq!(memory.transcript(), vec![Turn::new(Role::User, "kept")]);
}

#[tokio::test]
async fn shutdown_summarizes_pending_turns() {
    let dir = TempDir::new().unwrap();
    let summarizer = MockClient::scripted(&["A short chat."]);
    let mut memory = Memory::open(settings(dir.path()), summarizer.clone()).await;

    memory.record_turn(Role::User, "hello", false);
    memory.shutdown().await;

    assert_eq!(summarizer.run_count(), 1);
    assert_eq!(memory.summaries(), vec!["A short chat.".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn periodic_tick_summarizes_without_flush() {
    let dir = TempDir::new().unwrap();
    let settings = MemorySettings::builder()
        .directory(dir.path().to_path_buf())
        .save_interval(Duration::from_secs(30))
        .build();
    let summarizer = MockClient::scripted(&["Periodic summary."]);
    let memory = Memory::open(settings, summarizer.clone()).await;

    memory.record_user_message("tick tock");
    tokio::time::sleep(Duration::from_secs(31)).await;
    memory.flush().await;

    assert_eq!(summarizer.run_count(), 1);
    assert_eq!(memory.summaries(), vec!["Periodic summary.".to_string()]);
}

#[tokio::test]
async fn agent_rollout_is_recorded_in_memory() {
    let dir = TempDir::new().unwrap();
    let memory = Memory::open(settings(dir.path()), MockClient::new()).await;
    let model = MockClient::scripted(&["Paris."]);
    let mut agent = Agent::new("Geographer", model.clone()).with_memory(memory);

    let answer = agent.run_task("Capital of France?").await;

    assert_eq!(answer, "Paris.");
    assert_eq!(
        model.prompts()[0],
        format!("{PREAMBLE}\n\nUser: Capital of France?")
    );
    let transcript = agent.memory().unwrap().transcript();
    assert_eq!(
        transcript,
        vec![
            Turn::new(Role::User, "Capital of France?"),
            Turn::new(Role::Assistant, "Paris."),
        ]
    );
}

#[tokio::test]
async fn tool_planning_prompt_carries_memory_context() {
    let dir = TempDir::new().unwrap();
    let memory = Memory::open(settings(dir.path()), MockClient::new()).await;
    memory.record_turn(Role::User, "My name is Zed", false);
    memory.record_turn(Role::Assistant, "Hello Zed", false);

    let model = MockClient::scripted(&[
        r#"{"func_calling": [{"tool_name": "gcd", "parameter": {"a": 48, "b": 12}}]}"#,
        "The gcd is 12, Zed.",
    ]);
    let mut agent = Agent::new("Calculator", model.clone())
        .with_tool(gcd_tool())
        .unwrap()
        .with_memory(memory);

    let answer = agent.run_task("gcd of 48 and 12").await;

    assert_eq!(answer, "The gcd is 12, Zed.");
    let prompts = model.prompts();
    assert_eq!(
        prompts[0],
        format!("{PREAMBLE}\n\nUser: My name is Zed\nAssistant: Hello Zed\nUser: gcd of 48 and 12")
    );
    assert!(prompts[1].starts_with("[QUERY]\ngcd of 48 and 12\n\n[TOOLS]\n"));
    assert_eq!(agent.memory().unwrap().transcript().len(), 4);
}
