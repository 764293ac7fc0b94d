//! Observable turn store: a decorator that reports every successful
//! mutation to registered observers.

use std::sync::Arc;

use async_trait::async_trait;
use mindloop_core::error::MemoryError;
use mindloop_core::{Message, ThinkingRound, ToolCallResult, Turn, TurnObserver, TurnStatus, TurnStore};

/// Wraps any [`TurnStore`]. Observers run after the inner store accepted
/// the change, so a rejected mutation is never reported.
pub struct ObservableTurnStore<S> {
    inner: S,
    observers: Vec<Arc<dyn TurnObserver>>,
}

impl<S: TurnStore> ObservableTurnStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: TurnStore> TurnStore for ObservableTurnStore<S> {
    async fn start_turn(&self) -> Result<Turn, MemoryError> {
        let turn = self.inner.start_turn().await?;
        for observer in &self.observers {
            observer.on_turn_created(&turn);
        }
        Ok(turn)
    }

    async fn append_thinking_round(&self, turn: u64, round: ThinkingRound) -> Result<(), MemoryError> {
        self.inner.append_thinking_round(turn, round.clone()).await?;
        for observer in &self.observers {
            observer.on_thinking_round_appended(turn, &round);
        }
        Ok(())
    }

    async fn append_message(&self, turn: u64, message: Message) -> Result<(), MemoryError> {
        self.inner.append_message(turn, message.clone()).await?;
        for observer in &self.observers {
            observer.on_message_added(turn, &message);
        }
        Ok(())
    }

    async fn record_tool_call(&self, turn: u64, result: ToolCallResult) -> Result<(), MemoryError> {
        self.inner.record_tool_call(turn, result.clone()).await?;
        for observer in &self.observers {
            observer.on_tool_call_recorded(turn, &result);
        }
        Ok(())
    }

    async fn complete_turn(&self, turn: u64, summary: Option<String>) -> Result<Turn, MemoryError> {
        let completed = self.inner.complete_turn(turn, summary).await?;
        for observer in &self.observers {
            observer.on_turn_status_changed(turn, TurnStatus::Completed);
        }
        Ok(completed)
    }

    async fn get_turn(&self, turn: u64) -> Result<Turn, MemoryError> {
        self.inner.get_turn(turn).await
    }

    async fn turns(&self) -> Vec<Turn> {
        self.inner.turns().await
    }

    async fn accumulated_summaries(&self) -> String {
        self.inner.accumulated_summaries().await
    }

    async fn current_turn(&self) -> Option<Turn> {
        self.inner.current_turn().await
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<Turn> {
        self.inner.search(query, limit).await
    }
}
