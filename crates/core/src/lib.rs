//! # mindloop Core
//!
//! Domain types, traits, and error definitions for the mindloop agent
//! orchestration runtime. This crate has **no runtime dependencies**: it
//! defines the model that the workspace, memory, and agent crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here:
//! - [`Provider`]: the model transport boundary
//! - [`ToolHandler`]: one entry in the tool handler table
//! - [`SkillHooks`]: skill lifecycle callbacks
//! - [`TurnStore`]: the turn-based memory store
//! - [`AgentObserver`] / [`TurnObserver`]: monitoring callbacks
//!
//! Implementations live in their respective crates, so tests can swap in
//! scripted providers and stores without touching the orchestration code.

pub mod agent;
pub mod error;
pub mod message;
pub mod observer;
pub mod provider;
pub mod skill;
pub mod tool;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentConfig, TaskStatus, ThinkingConfig};
pub use message::{Message, MessageToolCall, Role};
pub use observer::{AgentObserver, TurnObserver};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use skill::{Skill, SkillHooks, SkillTool};
pub use tool::{Tool, ToolCallResult, ToolHandler, ToolSource};
pub use turn::{RecalledContext, ThinkingRound, Turn, TurnStatus, TurnStore};
