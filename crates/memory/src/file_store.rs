//! File-backed turn store: completed turns persisted as JSON lines.
//!
//! Each completed turn is appended to the file as one JSON-encoded `Turn`.
//! On open, completed turns are replayed so numbering continues where the
//! previous run stopped. Active turns live only in memory until completed.

use async_trait::async_trait;
use mindloop_core::error::MemoryError;
use mindloop_core::{Message, ThinkingRound, ToolCallResult, Turn, TurnStore};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::InMemoryTurnStore;

pub struct FileTurnStore {
    path: PathBuf,
    inner: InMemoryTurnStore,
}

impl FileTurnStore {
    /// Open the store at `path`, replaying any completed turns already there.
    ///
    /// A missing file starts empty (created on first completion). Corrupted
    /// or out-of-sequence lines are skipped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let turns = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = turns.len(), "Turn history loaded");
        Self {
            path,
            inner: InMemoryTurnStore::from_turns(turns),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Vec<Turn> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        let mut turns: Vec<Turn> = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<Turn>(line) {
                Ok(turn) if turn.is_completed() && turn.number == turns.len() as u64 + 1 => turns.push(turn),
                Ok(turn) => {
                    warn!(turn = turn.number, "Skipping out-of-sequence turn record");
                }
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted turn record");
                }
            }
        }
        turns
    }

    fn append_to_disk(&self, turn: &Turn) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| MemoryError::Storage(format!("Failed to create history directory: {e}")))?;
        }

        let line = serde_json::to_string(turn)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize turn: {e}")))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MemoryError::Storage(format!("Failed to open history file: {e}")))?;
        writeln!(file, "{line}")
            .map_err(|e| MemoryError::Storage(format!("Failed to write history file: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl TurnStore for FileTurnStore {
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

    async fn complete_turn(&self, turn: u64, summary: Option<String>) -> Result<Turn, MemoryError> {
        self.inner
            .complete_turn_with(turn, summary, |completed| self.append_to_disk(completed))
            .await
    }

    async fn get_turn(&self, turn: u64) -> Result<Turn, MemoryError> {
        self.inner.get_turn(turn).await
    }

    async fn turns(&self) -> Vec<Turn> {
        self.inner.turns().await
    }
}
