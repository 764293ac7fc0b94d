//! In-memory turn store: the default store for a single task.

use async_trait::async_trait;
use chrono::Utc;
use mindloop_core::error::MemoryError;
use mindloop_core::{Message, ThinkingRound, ToolCallResult, Turn, TurnStatus, TurnStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Turns kept in a Vec; turn `n` lives at index `n - 1`.
pub struct InMemoryTurnStore {
    turns: Arc<RwLock<Vec<Turn>>>,
}

impl InMemoryTurnStore {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Seed the store with previously completed turns (numbered 1..=n).
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self {
            turns: Arc::new(RwLock::new(turns)),
        }
    }

    fn index(turns: &[Turn], number: u64) -> Result<usize, MemoryError> {
        let index = usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|i| *i < turns.len())
            .ok_or(MemoryError::TurnNotFound(number))?;
        Ok(index)
    }

    /// Run `f` against an active turn.
    async fn mutate<F>(&self, number: u64, f: F) -> Result<(), MemoryError>
    where
        F: FnOnce(&mut Turn) + Send,
    {
        let mut turns = self.turns.write().await;
        let index = Self::index(&turns, number)?;
        let turn = &mut turns[index];
        turn.ensure_active()?;
        f(turn);
        Ok(())
    }
}

impl InMemoryTurnStore {
    /// Complete a turn, committing it only if `persist` accepts the
    /// completed snapshot. On error the turn stays active.
    ///
    /// `persist` runs under the write lock, so no other mutation can slip in
    /// between persisting and committing.
    pub async fn complete_turn_with<F>(&self, turn: u64, summary: Option<String>, persist: F) -> Result<Turn, MemoryError>
    where
        F: FnOnce(&Turn) -> Result<(), MemoryError> + Send,
    {
        let mut turns = self.turns.write().await;
        let index = Self::index(&turns, turn)?;
        turns[index].ensure_active()?;

        let mut completed = turns[index].clone();
        completed.status = TurnStatus::Completed;
        completed.summary = summary.filter(|s| !s.trim().is_empty());
        completed.completed_at = Some(Utc::now());
        persist(&completed)?;

        debug!(
            turn,
            rounds = completed.thinking_rounds.len(),
            tool_calls = completed.tool_calls.len(),
            "Turn completed"
        );
        turns[index] = completed.clone();
        Ok(completed)
    }
}

impl Default for InMemoryTurnStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TurnStore for InMemoryTurnStore {
    async fn start_turn(&self) -> Result<Turn, MemoryError> {
        let mut turns = self.turns.write().await;
        if let Some(last) = turns.last().filter(|t| !t.is_completed()) {
            return Err(MemoryError::TurnStillActive(last.number));
        }
        let turn = Turn::new(turns.len() as u64 + 1);
        debug!(turn = turn.number, "Turn started");
        turns.push(turn.clone());
        Ok(turn)
    }

    async fn append_thinking_round(&self, turn: u64, round: ThinkingRound) -> Result<(), MemoryError> {
        self.mutate(turn, |t| t.thinking_rounds.push(round)).await
    }

    async fn append_message(&self, turn: u64, message: Message) -> Result<(), MemoryError> {
        self.mutate(turn, |t| t.messages.push(message)).await
    }

    async fn record_tool_call(&self, turn: u64, result: ToolCallResult) -> Result<(), MemoryError> {
        self.mutate(turn, |t| t.tool_calls.push(result)).await
    }

    async fn complete_turn(&self, turn: u64, summary: Option<String>) -> Result<Turn, MemoryError> {
        self.complete_turn_with(turn, summary, |_| Ok(())).await
    }

    async fn get_turn(&self, turn: u64) -> Result<Turn, MemoryError> {
        let turns = self.turns.read().await;
        let index = Self::index(&turns, turn)?;
        Ok(turns[index].clone())
    }

    async fn turns(&self) -> Vec<Turn> {
        self.turns.read().await.clone()
    }
}
