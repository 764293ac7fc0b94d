//! Error types for the mindloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum. Crates that span several
//! contexts (the agent) define their own wrapper.

use thiserror::Error;

// --- Bounded context errors ---

/// Failures at the model transport boundary. All of these are retryable
/// from the orchestrator's point of view.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Failures raised by a tool handler. These are captured into a structured
/// [`ToolCallResult`](crate::tool::ToolCallResult) by the workspace and never
/// cross the dispatch boundary as errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool is disabled: {0}")]
    Disabled(String),
}

/// Configuration and lookup errors raised by the virtual workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Component key already registered: {0}")]
    DuplicateComponentKey(String),

    #[error("Tool name '{tool}' is already registered by {owner}")]
    DuplicateToolName { tool: String, owner: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error(transparent)]
    Skill(#[from] SkillError),
}

/// Skill catalogue and state-machine errors.
#[derive(Debug, Clone, Error)]
pub enum SkillError {
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Skill already registered: {0}")]
    DuplicateSkill(String),

    #[error("Skill '{skill}' activation hook failed: {reason}")]
    HookFailed { skill: String, reason: String },
}

/// Turn memory invariant violations and storage failures.
#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Turn not found: {0}")]
    TurnNotFound(u64),

    #[error("Turn {0} is already completed")]
    TurnAlreadyCompleted(u64),

    #[error("Turn {0} is still active; complete it before starting another")]
    TurnStillActive(u64),

    #[error("Storage error: {0}")]
    Storage(String),
}
