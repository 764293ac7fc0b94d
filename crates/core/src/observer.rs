//! Observer callbacks for monitoring a run.
//!
//! Every method has a no-op default, so an observer only implements the
//! callbacks it cares about and a missing observer is never an error.
//! Callbacks are invoked synchronously at the corresponding lifecycle point.

use crate::agent::TaskStatus;
use crate::message::Message;
use crate::tool::ToolCallResult;
use crate::turn::{ThinkingRound, Turn, TurnStatus};

/// Callbacks fired by an observable turn store.
pub trait TurnObserver: Send + Sync {
    fn on_turn_created(&self, _turn: &Turn) {}

    fn on_turn_status_changed(&self, _turn: u64, _status: TurnStatus) {}

    fn on_thinking_round_appended(&self, _turn: u64, _round: &ThinkingRound) {}

    fn on_message_added(&self, _turn: u64, _message: &Message) {}

    fn on_tool_call_recorded(&self, _turn: u64, _result: &ToolCallResult) {}
}

/// Callbacks fired by the agent.
pub trait AgentObserver: Send + Sync {
    fn on_status_changed(&self, _task_id: &str, _from: TaskStatus, _to: TaskStatus) {}

    fn on_message_added(&self, _task_id: &str, _message: &Message) {}

    fn on_turn_created(&self, _task_id: &str, _turn: u64) {}

    fn on_tool_call_recorded(&self, _task_id: &str, _result: &ToolCallResult) {}

    fn on_task_completed(&self, _task_id: &str, _result: &str) {}

    fn on_task_aborted(&self, _task_id: &str, _reason: &str) {}

    fn on_error(&self, _task_id: &str, _error: &str) {}
}
