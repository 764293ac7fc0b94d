//! Shared fixtures for agent loop tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mindloop_core::error::{MemoryError, ToolError};
use mindloop_core::{
    AgentConfig, AgentObserver, Message, ProviderResponse, TaskStatus, ThinkingConfig, ThinkingRound, Tool,
    ToolCallResult, Turn, TurnStore,
};
use mindloop_memory::InMemoryTurnStore;
use mindloop_workspace::Component;
use serde_json::{Value, json};

#[path = "../../src/test_helpers.rs"]
mod scripted;

pub use scripted::*;

pub fn complete(result: &str) -> ProviderResponse {
    make_tool_call_response("attempt_completion", json!({ "result": result }))
}

/// Agent config with no retry delay.
pub fn agent_config() -> AgentConfig {
    AgentConfig {
        retry_delay_ms: 0,
        ..AgentConfig::default()
    }
}

pub fn no_thinking() -> ThinkingConfig {
    ThinkingConfig {
        enabled: false,
        ..ThinkingConfig::default()
    }
}

/// A component with one working tool (`t1`) and one that always fails
/// (`broken`).
pub struct FilesComponent {
    pub calls: AtomicUsize,
}

impl FilesComponent {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Component for FilesComponent {
    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool::without_parameters("t1", "Read the current file"),
            Tool::without_parameters("broken", "Always fails"),
        ]
    }

    async fn render(&self) -> String {
        format!("Files read: {}", self.calls.load(Ordering::SeqCst))
    }

    async fn handle_tool_call(&self, tool_name: &str, _params: Value) -> Result<Value, ToolError> {
        match tool_name {
            "t1" => {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!("file contents"))
            }
            other => Err(ToolError::ExecutionFailed {
                tool_name: other.to_string(),
                reason: "disk on fire".into(),
            }),
        }
    }
}

/// Records status transitions and terminal events.
#[derive(Default)]
pub struct RecordingObserver {
    pub transitions: Mutex<Vec<(TaskStatus, TaskStatus)>>,
    pub turns: Mutex<Vec<u64>>,
    pub completed: Mutex<Option<String>>,
    pub aborted: Mutex<Option<String>>,
}

impl AgentObserver for RecordingObserver {
    fn on_status_changed(&self, _task_id: &str, from: TaskStatus, to: TaskStatus) {
        self.transitions.lock().unwrap().push((from, to));
    }

    fn on_turn_created(&self, _task_id: &str, turn: u64) {
        self.turns.lock().unwrap().push(turn);
    }

    fn on_task_completed(&self, _task_id: &str, result: &str) {
        *self.completed.lock().unwrap() = Some(result.to_string());
    }

    fn on_task_aborted(&self, _task_id: &str, reason: &str) {
        *self.aborted.lock().unwrap() = Some(reason.to_string());
    }
}

/// An in-memory store whose `complete_turn` always fails.
pub struct FailingCompletionStore {
    inner: InMemoryTurnStore,
}

impl FailingCompletionStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryTurnStore::new(),
        }
    }
}

#[async_trait]
impl TurnStore for FailingCompletionStore {
    async fn start_turn(&self) -> Result<Turn, MemoryError> {
        self.inner.start_turn().await
    }

    async fn append_thinking_round(&self, turn: u64, round: ThinkingRound) -> Result<(), MemoryError> {
        self.inner.append_thinking_round(turn, round).await
    }

    async fn append_message(&self, turn: u64, message: Message) -> Result<(), MemoryError> {
        self.inner.append_message(turn, message).await
    }

    async fn record_tool_call(&self, turn: u64, result: ToolCallResult) -> Result<(), MemoryError> {
        self.inner.record_tool_call(turn, result).await
    }

    async fn complete_turn(&self, _turn: u64, _summary: Option<String>) -> Result<Turn, MemoryError> {
        Err(MemoryError::Storage("disk full".into()))
    }

    async fn get_turn(&self, turn: u64) -> Result<Turn, MemoryError> {
        self.inner.get_turn(turn).await
    }

    async fn turns(&self) -> Vec<Turn> {
        self.inner.turns().await
    }
}
