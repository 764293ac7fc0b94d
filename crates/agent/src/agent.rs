//! The agent drives one task through think → act turns until it completes
//! or aborts.
//!
//! Each turn:
//!
//! 1. **Start** a turn in the store
//! 2. **Think**: a bounded thinking phase over the rendered workspace
//! 3. **Act**: ask the model for exactly one tool call, with the system
//!    prompt assembled from the workspace and the active skill
//! 4. **Dispatch** the call through the workspace and record the result
//! 5. **Complete** the turn with the phase summary
//!
//! The task completes when `attempt_completion` succeeds. It aborts when the
//! consecutive-mistake limit is exceeded, when the model transport keeps
//! failing after all retries, when `max_turns` is reached, or on
//! cancellation.

use std::future::Future;
use std::sync::Arc;

use mindloop_config::AppConfig;
use mindloop_core::error::{MemoryError, WorkspaceError};
use mindloop_core::{
    AgentConfig, AgentObserver, Message, Provider, ProviderRequest, TaskStatus, ThinkingConfig, ThinkingRound,
    ToolCallResult, TurnStore,
};
use mindloop_memory::InMemoryTurnStore;
use mindloop_workspace::VirtualWorkspace;
use mindloop_workspace::global_tools::ATTEMPT_COMPLETION;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::prompt::build_system_prompt;
use crate::thinking::{ThinkingInput, ThinkingModule};
use crate::token::estimate_tokens;
use crate::transport::{RetryPolicy, complete_with_retry};

const NO_TOOL_FEEDBACK: &str = "[ERROR] You did not use a tool in your previous response. \
Every response must contain exactly one tool call. If the task is finished, call attempt_completion with the result.";

/// Errors that stop the agent without a task outcome.
///
/// Budget, transport, and cancellation endings are not errors: they produce
/// an Aborted [`TaskOutcome`]. A store or workspace failure still leaves the
/// agent Aborted.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Task {task_id} was already started (status: {status})")]
    AlreadyStarted { task_id: String, status: TaskStatus },

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

/// Final state of a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    /// Result passed to `attempt_completion`
    pub result: Option<String>,
    pub abort_reason: Option<String>,
    pub errors: Vec<String>,
    pub turns_completed: u64,
    pub tokens_used: u64,
}

pub struct Agent {
    task_id: String,
    config: AgentConfig,
    provider: Arc<dyn Provider>,
    thinking: ThinkingModule,
    workspace: Arc<VirtualWorkspace>,
    store: Arc<dyn TurnStore>,
    observers: Vec<Arc<dyn AgentObserver>>,
    cancel: CancellationToken,
    retry: RetryPolicy,

    status: TaskStatus,
    consecutive_mistakes: u32,
    tokens_used: u64,
    errors: Vec<String>,
    turns_completed: u64,
}

impl Agent {
    /// Create an agent with a fresh workspace and an in-memory turn store.
    pub fn new(provider: Arc<dyn Provider>, config: AgentConfig, thinking: ThinkingConfig) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            thinking: ThinkingModule::new(provider.clone(), thinking, &config),
            retry: RetryPolicy::from_config(&config),
            config,
            provider,
            workspace: Arc::new(VirtualWorkspace::new()),
            store: Arc::new(InMemoryTurnStore::new()),
            observers: Vec::new(),
            cancel: CancellationToken::new(),
            status: TaskStatus::Idle,
            consecutive_mistakes: 0,
            tokens_used: 0,
            errors: Vec::new(),
            turns_completed: 0,
        }
    }

    /// Create an agent from the `[agent]` and `[thinking]` config sections.
    pub fn from_app_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.agent.clone(), config.thinking.clone())
    }

    /// Act in a shared workspace instead of a fresh one.
    pub fn with_workspace(mut self, workspace: Arc<VirtualWorkspace>) -> Self {
        self.workspace = workspace;
        self
    }

    /// Record turns in this store instead of a fresh in-memory one.
    pub fn with_store(mut self, store: Arc<dyn TurnStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AgentObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Cancel the task through an externally owned token.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn consecutive_mistakes(&self) -> u32 {
        self.consecutive_mistakes
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn workspace(&self) -> &Arc<VirtualWorkspace> {
        &self.workspace
    }

    pub fn store(&self) -> &Arc<dyn TurnStore> {
        &self.store
    }

    /// A handle that cancels this task when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the task to a terminal status.
    ///
    /// Turn store and workspace failures are returned as errors, but the task
    /// still ends Aborted with the failure in [`errors`](Self::errors).
    pub async fn start(&mut self, initial_prompt: &str) -> Result<TaskOutcome, AgentError> {
        if self.status != TaskStatus::Idle {
            return Err(AgentError::AlreadyStarted {
                task_id: self.task_id.clone(),
                status: self.status,
            });
        }

        info!(task_id = %self.task_id, model = %self.config.model, "Task starting");
        match self.run(initial_prompt).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.record_error(e.to_string());
                self.abort(format!("Task failed: {e}"));
                Err(e)
            }
        }
    }

    async fn run(&mut self, initial_prompt: &str) -> Result<TaskOutcome, AgentError> {
        let mut history = vec![Message::user(initial_prompt)];
        let mut previous_rounds: Vec<ThinkingRound> = Vec::new();
        let mut last_tool_results: Vec<ToolCallResult> = Vec::new();
        self.notify_message(&history[0]);

        loop {
            if self.turns_completed >= u64::from(self.config.max_turns) {
                let reason = format!("Turn limit of {} reached without completion", self.config.max_turns);
                return Ok(self.abort(reason));
            }
            if self.cancel.is_cancelled() {
                return Ok(self.abort_cancelled());
            }

            let turn = self.store.start_turn().await?.number;
            debug!(task_id = %self.task_id, turn, "Turn started");
            for observer in &self.observers {
                observer.on_turn_created(&self.task_id, turn);
            }

            // --- Think ---
            self.set_status(TaskStatus::Thinking);
            let workspace_context = self.workspace.render().await;
            let catalogue = self.workspace.render_tool_catalogue().await;
            let input = ThinkingInput {
                turn,
                workspace_context: &workspace_context,
                tool_catalogue: &catalogue,
                task_context: Some(initial_prompt),
                previous_rounds: &previous_rounds,
                last_tool_results: &last_tool_results,
            };
            let phase = self.thinking.perform_thinking_phase(self.store.as_ref(), input);
            let Some(thinking) = cancellable(&self.cancel, phase).await else {
                return Ok(self.abort_cancelled());
            };
            let thinking = thinking?;
            self.tokens_used += thinking.tokens_used as u64;

            // --- Act ---
            self.set_status(TaskStatus::Acting);
            let active_skill = self.workspace.active_skill().await;
            let system_prompt = build_system_prompt(&workspace_context, &self.config, active_skill.as_ref());
            let mut request = ProviderRequest::new(&self.config.model, system_prompt, &history)
                .with_tools(self.workspace.tool_definitions().await)
                .with_temperature(self.config.temperature)
                .with_max_tokens(self.config.max_tokens);
            if let Some(summary) = &thinking.summary {
                request.messages.push(Message::user(format!(
                    "Your reasoning for this turn: {summary}\nNow respond with exactly one tool call."
                )));
            }

            let call = complete_with_retry(self.provider.as_ref(), request, &self.retry);
            let Some(response) = cancellable(&self.cancel, call).await else {
                return Ok(self.abort_cancelled());
            };
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    let reason = format!(
                        "Model transport failed after {} retries: {e}",
                        self.retry.max_retry_attempts
                    );
                    self.record_error(reason.clone());
                    self.store.complete_turn(turn, Some(reason.clone())).await?;
                    self.turns_completed += 1;
                    return Ok(self.abort(reason));
                }
            };
            self.tokens_used += response
                .usage
                .map(|u| u64::from(u.total_tokens))
                .unwrap_or_else(|| estimate_tokens(&response.message.content) as u64);

            let assistant = response.message;
            self.push_message(turn, &mut history, assistant.clone()).await?;

            let fallback_summary;
            match assistant.tool_calls.first() {
                None => {
                    self.count_mistake("Response contained no tool call".to_string());
                    self.push_message(turn, &mut history, Message::user(NO_TOOL_FEEDBACK)).await?;
                    last_tool_results = Vec::new();
                    fallback_summary = "Responded without calling a tool".to_string();
                }
                Some(call) => {
                    if assistant.tool_calls.len() > 1 {
                        warn!(
                            task_id = %self.task_id,
                            ignored = assistant.tool_calls.len() - 1,
                            "Multiple tool calls in one response; only the first is executed"
                        );
                    }

                    let params = call.parsed_arguments();
                    let dispatch = self.workspace.handle_tool_call(&call.name, params.clone());
                    let Some(dispatched) = cancellable(&self.cancel, dispatch).await else {
                        return Ok(self.abort_cancelled());
                    };
                    let result = match dispatched {
                        Ok(result) => result,
                        Err(WorkspaceError::ToolNotFound(name)) => {
                            ToolCallResult::failure(&name, params, format!("Tool not found: {name}"))
                        }
                        Err(other) => return Err(other.into()),
                    };

                    self.store.record_tool_call(turn, result.clone()).await?;
                    for observer in &self.observers {
                        observer.on_tool_call_recorded(&self.task_id, &result);
                    }
                    self.push_message(turn, &mut history, Message::tool_result(&call.id, result.to_observation()))
                        .await?;

                    if result.success {
                        self.consecutive_mistakes = 0;
                        if call.name == ATTEMPT_COMPLETION {
                            let answer = result.to_observation();
                            let summary = thinking.summary.clone().unwrap_or_else(|| "Completed the task".into());
                            self.store.complete_turn(turn, Some(summary)).await?;
                            self.turns_completed += 1;
                            return Ok(self.complete(answer));
                        }
                        fallback_summary = format!("Called {} successfully", call.name);
                    } else {
                        let error = result.error.clone().unwrap_or_default();
                        self.count_mistake(format!("Tool '{}' failed: {error}", call.name));
                        fallback_summary = format!("Called {} and it failed: {error}", call.name);
                    }
                    last_tool_results = vec![result];
                }
            }

            let summary = thinking.summary.clone().unwrap_or(fallback_summary);
            self.store.complete_turn(turn, Some(summary)).await?;
            self.turns_completed += 1;
            previous_rounds = thinking.rounds;

            if self.consecutive_mistakes > self.config.consecutive_mistake_limit {
                let reason = format!(
                    "Exceeded the consecutive mistake limit of {} ({} consecutive mistakes)",
                    self.config.consecutive_mistake_limit, self.consecutive_mistakes
                );
                return Ok(self.abort(reason));
            }
        }
    }

    async fn push_message(&self, turn: u64, history: &mut Vec<Message>, message: Message) -> Result<(), AgentError> {
        self.store.append_message(turn, message.clone()).await?;
        self.notify_message(&message);
        history.push(message);
        Ok(())
    }

    fn notify_message(&self, message: &Message) {
        for observer in &self.observers {
            observer.on_message_added(&self.task_id, message);
        }
    }

    fn set_status(&mut self, to: TaskStatus) {
        let from = self.status;
        if from == to {
            return;
        }
        self.status = to;
        debug!(task_id = %self.task_id, %from, %to, "Status changed");
        for observer in &self.observers {
            observer.on_status_changed(&self.task_id, from, to);
        }
    }

    fn record_error(&mut self, error: String) {
        warn!(task_id = %self.task_id, error = %error, "Task error");
        for observer in &self.observers {
            observer.on_error(&self.task_id, &error);
        }
        self.errors.push(error);
    }

    fn count_mistake(&mut self, error: String) {
        self.consecutive_mistakes += 1;
        self.record_error(error);
    }

    fn complete(&mut self, result: String) -> TaskOutcome {
        self.set_status(TaskStatus::Completed);
        info!(task_id = %self.task_id, turns = self.turns_completed, "Task completed");
        for observer in &self.observers {
            observer.on_task_completed(&self.task_id, &result);
        }
        self.outcome(Some(result), None)
    }

    fn abort(&mut self, reason: String) -> TaskOutcome {
        self.set_status(TaskStatus::Aborted);
        warn!(task_id = %self.task_id, reason = %reason, "Task aborted");
        for observer in &self.observers {
            observer.on_task_aborted(&self.task_id, &reason);
        }
        self.outcome(None, Some(reason))
    }

    fn abort_cancelled(&mut self) -> TaskOutcome {
        self.abort("Task was cancelled".into())
    }

    fn outcome(&self, result: Option<String>, abort_reason: Option<String>) -> TaskOutcome {
        TaskOutcome {
            task_id: self.task_id.clone(),
            status: self.status,
            result,
            abort_reason,
            errors: self.errors.clone(),
            turns_completed: self.turns_completed,
            tokens_used: self.tokens_used,
        }
    }
}

/// Run `future` unless `token` fires first.
async fn cancellable<F: Future>(token: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        output = future => Some(output),
    }
}
