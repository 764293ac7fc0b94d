//! The thinking phase: bounded, model-steered reflection before each action.
//!
//! Each round asks the model to reason about the current state and vote on
//! whether another round is worth it. The phase stops when the model says
//! so, when `max_rounds` rounds have run, or when the estimated token spend
//! reaches `token_budget`. Budgets are checked before each round, so a
//! single round may overshoot the token budget.
//!
//! A round may ask to recall earlier turns. The recalled snippets are
//! attached to that round and shown to every later round, including the
//! next turn's. Recall does not change the model's continuation vote.
//!
//! A failed model call never fails the phase: it is recorded as a degraded
//! round and the agent proceeds to act.

use std::sync::Arc;

use mindloop_core::error::MemoryError;
use mindloop_core::{
    AgentConfig, Message, Provider, ProviderRequest, RecalledContext, ThinkingConfig, ThinkingRound,
    ToolCallResult, TurnStore,
};
use tracing::{debug, info, warn};

use crate::parse::{RecallRequest, ThinkingReply, parse_thinking_reply};
use crate::token::estimate_tokens;
use crate::transport::{RetryPolicy, complete_with_retry};

/// Maximum turns returned by a recall keyword search.
const RECALL_SEARCH_LIMIT: usize = 3;

const THINKING_INSTRUCTIONS: &str = "\
# Thinking Phase
You are reflecting before your next action. Do not call any tools now.
Reply with a single JSON object:
{\"thinking\": \"<your reasoning>\", \"continue_thinking\": <true|false>, \"summary\": \"<optional one-paragraph summary>\", \"recall\": {\"turns\": [<turn numbers>], \"query\": \"<optional keywords>\"}}
Set continue_thinking to false once you know what to do next, and include a summary of your plan.
Use recall only when you need details from an earlier turn.";

/// Everything a thinking phase reasons over.
#[derive(Debug, Clone, Copy)]
pub struct ThinkingInput<'a> {
    /// Turn the rounds are recorded into
    pub turn: u64,
    /// Rendered workspace
    pub workspace_context: &'a str,
    /// Currently enabled tools, one per line
    pub tool_catalogue: &'a str,
    /// The task the agent is working on
    pub task_context: Option<&'a str>,
    /// Rounds from the previous turn's thinking phase
    pub previous_rounds: &'a [ThinkingRound],
    /// Results of the previous turn's tool calls
    pub last_tool_results: &'a [ToolCallResult],
}

/// Result of one thinking phase.
#[derive(Debug, Clone, Default)]
pub struct ThinkingOutcome {
    pub rounds: Vec<ThinkingRound>,
    pub tokens_used: usize,
    pub should_proceed_to_action: bool,
    pub summary: Option<String>,
}

pub struct ThinkingModule {
    provider: Arc<dyn Provider>,
    config: ThinkingConfig,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    retry: RetryPolicy,
}

impl ThinkingModule {
    pub fn new(provider: Arc<dyn Provider>, config: ThinkingConfig, agent: &AgentConfig) -> Self {
        Self {
            provider,
            config,
            model: agent.model.clone(),
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
            retry: RetryPolicy::from_config(agent),
        }
    }

    pub fn config(&self) -> &ThinkingConfig {
        &self.config
    }

    /// Run one thinking phase, appending every round to `input.turn`.
    ///
    /// Only turn-store misuse is an error; model failures degrade.
    pub async fn perform_thinking_phase(
        &self,
        store: &dyn TurnStore,
        input: ThinkingInput<'_>,
    ) -> Result<ThinkingOutcome, MemoryError> {
        let mut outcome = ThinkingOutcome {
            should_proceed_to_action: true,
            ..ThinkingOutcome::default()
        };
        if !self.config.enabled {
            debug!(turn = input.turn, "Thinking disabled, proceeding to action");
            return Ok(outcome);
        }

        let accumulated = store.accumulated_summaries().await;
        let system_prompt = format!("{}\n\n{THINKING_INSTRUCTIONS}", input.workspace_context.trim_end());
        let mut continue_thinking = true;

        while continue_thinking
            && (outcome.rounds.len() as u32) < self.config.max_rounds
            && outcome.tokens_used < self.config.token_budget
        {
            let number = outcome.rounds.len() as u32 + 1;
            let prompt = self.round_prompt(number, &accumulated, &input, &outcome.rounds);
            let request = ProviderRequest::new(&self.model, &system_prompt, &[Message::user(prompt)])
                .with_temperature(self.temperature)
                .with_max_tokens(self.max_tokens);

            let round = match complete_with_retry(self.provider.as_ref(), request, &self.retry).await {
                Ok(response) => {
                    let reply = parse_thinking_reply(&response.message.content);
                    let recalled = match &reply.recall {
                        Some(recall) => self.resolve_recall(store, input.turn, recall).await,
                        None => Vec::new(),
                    };
                    build_round(number, reply, recalled, &response.message.content)
                }
                Err(e) => {
                    warn!(turn = input.turn, round = number, error = %e, "Thinking round degraded");
                    ThinkingRound {
                        round: number,
                        content: format!("Thinking unavailable for this round: {e}"),
                        continue_thinking: false,
                        summary: None,
                        tokens: 0,
                        recalled: Vec::new(),
                    }
                }
            };

            debug!(
                turn = input.turn,
                round = number,
                tokens = round.tokens,
                continue_thinking = round.continue_thinking,
                "Thinking round complete"
            );
            store.append_thinking_round(input.turn, round.clone()).await?;
            continue_thinking = round.continue_thinking;
            outcome.tokens_used += round.tokens;
            outcome.rounds.push(round);
        }

        outcome.summary = match outcome.rounds.last().and_then(|r| r.summary.clone()) {
            Some(summary) => Some(summary),
            None if self.config.summarize && outcome.rounds.iter().any(|r| r.tokens > 0) => {
                self.summarize(&system_prompt, &outcome.rounds).await
            }
            None => None,
        };

        info!(
            turn = input.turn,
            rounds = outcome.rounds.len(),
            tokens = outcome.tokens_used,
            has_summary = outcome.summary.is_some(),
            "Thinking phase finished"
        );
        Ok(outcome)
    }

    fn round_prompt(
        &self,
        number: u32,
        accumulated: &str,
        input: &ThinkingInput<'_>,
        this_phase: &[ThinkingRound],
    ) -> String {
        let mut sections = vec![format!("## Thinking Round {number} of {}", self.config.max_rounds)];

        if !accumulated.is_empty() {
            sections.push(format!("## Progress So Far\n{accumulated}"));
        }
        if let Some(task) = input.task_context {
            sections.push(format!("## Task\n{task}"));
        }
        if !this_phase.is_empty() {
            sections.push(format!("## Earlier Rounds This Turn\n{}", format_rounds(this_phase)));
        }
        if !input.previous_rounds.is_empty() {
            sections.push(format!(
                "## Reasoning From The Previous Turn\n{}",
                format_rounds(input.previous_rounds)
            ));
        }
        if !input.last_tool_results.is_empty() {
            let results: Vec<String> = input
                .last_tool_results
                .iter()
                .map(|r| {
                    let status = if r.success { "succeeded" } else { "failed" };
                    format!("- {} {status}: {}", r.tool_name, r.to_observation())
                })
                .collect();
            sections.push(format!("## Last Tool Results\n{}", results.join("\n")));
        }
        sections.push(format!("## Available Tools\n{}", input.tool_catalogue));

        sections.join("\n\n")
    }

    async fn resolve_recall(&self, store: &dyn TurnStore, current: u64, recall: &RecallRequest) -> Vec<RecalledContext> {
        let mut recalled: Vec<RecalledContext> = Vec::new();

        for &number in &recall.turns {
            if number >= current {
                continue;
            }
            match store.get_turn(number).await {
                Ok(turn) if turn.is_completed() => recalled.push(RecalledContext {
                    turn_number: turn.number,
                    content: turn.recall_snippet(),
                }),
                Ok(_) => {}
                Err(e) => debug!(turn = number, error = %e, "Recall skipped"),
            }
        }

        if let Some(query) = recall.query.as_deref().filter(|q| !q.trim().is_empty()) {
            for turn in store.search(query, RECALL_SEARCH_LIMIT).await {
                if recalled.iter().all(|r| r.turn_number != turn.number) {
                    recalled.push(RecalledContext {
                        turn_number: turn.number,
                        content: turn.recall_snippet(),
                    });
                }
            }
        }

        if !recalled.is_empty() {
            debug!(turn = current, recalled = recalled.len(), "Recalled earlier turns");
        }
        recalled
    }

    /// One extra call, not counted against the round or token budget.
    async fn summarize(&self, system_prompt: &str, rounds: &[ThinkingRound]) -> Option<String> {
        let prompt = format!(
            "## Reasoning\n{}\n\nSummarize the reasoning above in one or two sentences, \
             stating the action you will take next. Reply with the summary only.",
            format_rounds(rounds)
        );
        let request = ProviderRequest::new(&self.model, system_prompt, &[Message::user(prompt)])
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        match complete_with_retry(self.provider.as_ref(), request, &self.retry).await {
            Ok(response) => {
                let reply = parse_thinking_reply(&response.message.content);
                reply.summary.or(Some(reply.reasoning)).filter(|s| !s.is_empty())
            }
            Err(e) => {
                warn!(error = %e, "Thinking summary unavailable");
                None
            }
        }
    }
}

fn build_round(number: u32, reply: ThinkingReply, recalled: Vec<RecalledContext>, raw: &str) -> ThinkingRound {
    ThinkingRound {
        round: number,
        content: reply.reasoning,
        continue_thinking: reply.continue_thinking,
        summary: reply.summary,
        tokens: estimate_tokens(raw),
        recalled,
    }
}

fn format_rounds(rounds: &[ThinkingRound]) -> String {
    let mut out = Vec::new();
    for round in rounds {
        out.push(format!("Round {}: {}", round.round, round.content));
        for recalled in &round.recalled {
            out.push(format!("  Recalled turn {}: {}", recalled.turn_number, recalled.content));
        }
    }
    out.join("\n")
}
