//! The mindloop agent.
//!
//! Every turn runs a bounded **thinking** phase and then an **action**
//! phase with exactly one tool call:
//!
//! 1. **Render** the workspace (skills, active skill tools, components)
//! 2. **Think** for up to `max_rounds` rounds, recalling earlier turns
//! 3. **Act**: send the system prompt and history to the model
//! 4. **Dispatch** the tool call through the workspace and record it
//!
//! The loop ends when `attempt_completion` succeeds, or aborts on the
//! consecutive-mistake limit, transport failure, turn limit, or cancellation.

pub mod agent;
pub mod parse;
pub mod prompt;
pub mod thinking;
pub mod token;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use agent::{Agent, AgentError, TaskOutcome};
pub use parse::{RecallRequest, ThinkingReply, parse_thinking_reply};
pub use prompt::build_system_prompt;
pub use thinking::{ThinkingInput, ThinkingModule, ThinkingOutcome};
pub use token::estimate_tokens;
pub use transport::{RetryPolicy, complete_with_retry};
