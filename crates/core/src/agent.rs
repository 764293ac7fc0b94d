//! Agent configuration and task state types.

use serde::{Deserialize, Serialize};

/// Configuration for the agent's behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temp")]
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Consecutive mistakes tolerated before the task aborts
    #[serde(default = "default_mistake_limit")]
    pub consecutive_mistake_limit: u32,

    /// Retries after the first failed transport call
    #[serde(default = "default_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Delay between transport retries
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-call transport timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Hard cap on turns per task (safety limit)
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Base capability section of the system prompt
    #[serde(default = "default_capability")]
    pub capability: String,

    /// Base direction section of the system prompt
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_model() -> String {
    "mock-model".into()
}
fn default_temp() -> f32 {
    0.7
}
fn default_mistake_limit() -> u32 {
    5
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_request_timeout() -> u64 {
    60
}
fn default_max_turns() -> u32 {
    25
}
fn default_capability() -> String {
    "You operate inside a virtual workspace. You act only by calling the tools listed \
     in the workspace; every response must contain exactly one tool call."
        .into()
}
fn default_direction() -> String {
    "Work step by step. When the task is finished, call attempt_completion with the final result."
        .into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temp(),
            max_tokens: None,
            consecutive_mistake_limit: default_mistake_limit(),
            max_retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout(),
            max_turns: default_max_turns(),
            capability: default_capability(),
            direction: default_direction(),
        }
    }
}

/// Configuration for the thinking phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingConfig {
    /// Skip the thinking phase entirely when false
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum rounds per thinking phase
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Estimated-token budget per thinking phase
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Request a dedicated summary when no round supplied one
    #[serde(default = "default_true")]
    pub summarize: bool,
}

fn default_true() -> bool {
    true
}
fn default_max_rounds() -> u32 {
    3
}
fn default_token_budget() -> usize {
    4096
}

impl Default for ThinkingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rounds: default_max_rounds(),
            token_budget: default_token_budget(),
            summarize: true,
        }
    }
}

/// Status of a task run by the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Idle,
    Thinking,
    Acting,
    Completed,
    Aborted,
}

impl TaskStatus {
    /// Completed and Aborted are terminal; no further transitions happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Acting => "acting",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
