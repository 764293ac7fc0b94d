//! Turn memory: the ordered, append-only log of reasoning+action cycles.
//!
//! A [`Turn`] is opened by the agent at the start of each cycle, collects
//! thinking rounds, messages and tool-call results while active, and becomes
//! immutable once completed. [`TurnStore`] is the storage contract; the
//! in-memory, observable, and file-backed implementations live in
//! `mindloop-memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::message::Message;
use crate::tool::ToolCallResult;

/// Lifecycle of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Active,
    Completed,
}

/// A snippet of an earlier turn pulled into a thinking round on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalledContext {
    pub turn_number: u64,
    pub content: String,
}

/// One bounded reasoning step within a turn's thinking phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkingRound {
    /// 1-based round number within the phase
    pub round: u32,

    /// Free-text reasoning
    pub content: String,

    /// The model's vote on whether to keep thinking
    pub continue_thinking: bool,

    /// Per-round summary, usually supplied when the model stops
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Estimated token cost of the round
    pub tokens: usize,

    /// Historical contexts recalled for this round
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recalled: Vec<RecalledContext>,
}

/// One reasoning+action cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Sequential, gap-free, 1-based
    pub number: u64,

    pub status: TurnStatus,

    pub thinking_rounds: Vec<ThinkingRound>,

    pub messages: Vec<Message>,

    pub tool_calls: Vec<ToolCallResult>,

    /// Compressed context carried into later prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Turn {
    /// Open a new active turn.
    pub fn new(number: u64) -> Self {
        Self {
            number,
            status: TurnStatus::Active,
            thinking_rounds: Vec::new(),
            messages: Vec::new(),
            tool_calls: Vec::new(),
            summary: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TurnStatus::Completed
    }

    /// Fail with `TurnAlreadyCompleted` if the turn can no longer be mutated.
    pub fn ensure_active(&self) -> Result<(), MemoryError> {
        if self.is_completed() {
            Err(MemoryError::TurnAlreadyCompleted(self.number))
        } else {
            Ok(())
        }
    }

    /// Everything searchable about this turn, in one string.
    pub fn searchable_text(&self) -> String {
        let mut text = String::new();
        if let Some(summary) = &self.summary {
            text.push_str(summary);
            text.push('\n');
        }
        for round in &self.thinking_rounds {
            text.push_str(&round.content);
            text.push('\n');
        }
        text
    }

    /// Short text used when a later round recalls this turn.
    pub fn recall_snippet(&self) -> String {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        self.thinking_rounds
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The turn memory storage contract.
///
/// Mutation methods fail with [`MemoryError::TurnNotFound`] or
/// [`MemoryError::TurnAlreadyCompleted`] when misused; those are programming
/// errors and callers should surface them, not absorb them.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Open the next turn. Fails with `TurnStillActive` if the previous
    /// turn has not been completed.
    async fn start_turn(&self) -> Result<Turn, MemoryError>;

    async fn append_thinking_round(&self, turn: u64, round: ThinkingRound) -> Result<(), MemoryError>;

    async fn append_message(&self, turn: u64, message: Message) -> Result<(), MemoryError>;

    async fn record_tool_call(&self, turn: u64, result: ToolCallResult) -> Result<(), MemoryError>;

    /// Mark a turn completed, storing its summary. Returns the final snapshot.
    async fn complete_turn(&self, turn: u64, summary: Option<String>) -> Result<Turn, MemoryError>;

    async fn get_turn(&self, turn: u64) -> Result<Turn, MemoryError>;

    /// All turns, in order.
    async fn turns(&self) -> Vec<Turn>;

    /// Completed turns' summaries in turn order, one per line as
    /// `Turn N: summary`. In-progress turns are excluded.
    async fn accumulated_summaries(&self) -> String {
        self.turns()
            .await
            .iter()
            .filter(|t| t.is_completed())
            .filter_map(|t| t.summary.as_ref().map(|s| format!("Turn {}: {}", t.number, s)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The active turn, if any.
    async fn current_turn(&self) -> Option<Turn> {
        self.turns().await.into_iter().rev().find(|t| !t.is_completed())
    }

    /// Case-insensitive keyword search over completed turns, most recent first.
    async fn search(&self, query: &str, limit: usize) -> Vec<Turn> {
        let needle = query.to_lowercase();
        if needle.trim().is_empty() {
            return Vec::new();
        }
        self.turns()
            .await
            .into_iter()
            .rev()
            .filter(|t| t.is_completed() && t.searchable_text().to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}
