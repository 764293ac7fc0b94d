mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use mindloop_agent::{Agent, AgentError};
use mindloop_core::error::ProviderError;
use mindloop_core::{AgentConfig, Role, Skill, TaskStatus, ThinkingConfig, TurnStatus, TurnStore};
use mindloop_memory::InMemoryTurnStore;
use mindloop_workspace::VirtualWorkspace;
use serde_json::json;
use tokio_util::sync::CancellationToken;

async fn files_workspace() -> Arc<VirtualWorkspace> {
    let workspace = VirtualWorkspace::new();
    workspace
        .register_component("files", Arc::new(FilesComponent::new()), 10)
        .await
        .unwrap();
    workspace
        .register_skill(
            Skill::new("reader", "Read files")
                .with_display_name("File Reader")
                .with_tools(["t1"])
                .with_prompt("You read files carefully.", "Read before you answer."),
        )
        .await
        .unwrap();
    Arc::new(workspace)
}

#[tokio::test]
async fn activates_skill_uses_tool_and_completes() {
    let provider = Arc::new(ScriptedProvider::responses(vec![
        make_tool_call_response("activate_skill", json!({ "name": "reader" })),
        make_tool_call_response("t1", json!({})),
        complete("The file says hello"),
    ]));
    let workspace = files_workspace().await;
    let store = Arc::new(InMemoryTurnStore::new());
    let mut agent = Agent::new(provider.clone(), agent_config(), no_thinking())
        .with_workspace(workspace.clone())
        .with_store(store.clone());

    let outcome = agent.start("Summarize the file").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(outcome.result.as_deref(), Some("The file says hello"));
    assert_eq!(outcome.turns_completed, 3);
    assert!(outcome.errors.is_empty());
    assert_eq!(provider.call_count(), 3);
    assert_eq!(workspace.active_skill().await.unwrap().name, "reader");
    assert!(!workspace.is_tool_available("broken").await);

    // The skill's prompt sections appear once it is active
    let requests = provider.requests();
    let first = requests[0].system_prompt().unwrap();
    assert!(!first.contains("## Skill Capability"));
    let second = requests[1].system_prompt().unwrap();
    assert!(second.contains("## Skill Capability: File Reader"));
    assert!(second.contains("## Skill Direction: File Reader"));
    assert!(second.contains("Active skill: reader"));

    let turns = store.turns().await;
    let numbers: Vec<u64> = turns.iter().map(|t| t.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(turns.iter().all(|t| t.status == TurnStatus::Completed));
    assert_eq!(turns[1].tool_calls[0].tool_name, "t1");
    assert_eq!(store.accumulated_summaries().await.lines().count(), 3);
}

#[tokio::test]
async fn aborts_after_exceeding_mistake_limit() {
    let provider = Arc::new(ScriptedProvider::responses(
        (0..6).map(|_| make_tool_call_response("broken", json!({}))).collect(),
    ));
    let config = AgentConfig {
        consecutive_mistake_limit: 5,
        ..agent_config()
    };
    let mut agent = Agent::new(provider.clone(), config, no_thinking()).with_workspace(files_workspace().await);

    let outcome = agent.start("Break things").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Aborted);
    assert!(outcome.abort_reason.unwrap().contains("consecutive mistake limit of 5"));
    assert_eq!(outcome.errors.len(), 6);
    assert_eq!(outcome.turns_completed, 6);
    assert_eq!(provider.call_count(), 6);
    assert_eq!(agent.consecutive_mistakes(), 6);
}

#[tokio::test]
async fn successful_call_resets_mistake_counter() {
    let mut script: Vec<_> = (0..5).map(|_| make_tool_call_response("broken", json!({}))).collect();
    script.push(make_tool_call_response("t1", json!({})));
    script.extend((0..5).map(|_| make_tool_call_response("broken", json!({}))));
    script.push(complete("done anyway"));
    let provider = Arc::new(ScriptedProvider::responses(script));
    let config = AgentConfig {
        consecutive_mistake_limit: 5,
        ..agent_config()
    };
    let mut agent = Agent::new(provider, config, no_thinking()).with_workspace(files_workspace().await);

    let outcome = agent.start("Keep trying").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(outcome.errors.len(), 10);
    assert_eq!(agent.consecutive_mistakes(), 0);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_aborts_after_all_retries() {
    let provider = Arc::new(ScriptedProvider::always_failing(ProviderError::Network(
        "connection refused".into(),
    )));
    let config = AgentConfig {
        max_retry_attempts: 3,
        retry_delay_ms: 100,
        ..AgentConfig::default()
    };
    let store = Arc::new(InMemoryTurnStore::new());
    let mut agent = Agent::new(provider.clone(), config, no_thinking()).with_store(store.clone());

    let outcome = agent.start("Anything").await.unwrap();

    assert_eq!(provider.call_count(), 4);
    assert_eq!(outcome.status, TaskStatus::Aborted);
    assert!(outcome.abort_reason.unwrap().contains("after 3 retries"));
    assert_eq!(outcome.errors.len(), 1);

    // The failed turn is closed, not left dangling
    let turns = store.turns().await;
    assert_eq!(turns.len(), 1);
    assert!(turns[0].is_completed());
}

#[tokio::test(start_paused = true)]
async fn timeouts_are_retried_exactly_three_times() {
    let provider = Arc::new(ScriptedProvider::hanging());
    let config = AgentConfig {
        max_retry_attempts: 3,
        request_timeout_secs: 1,
        ..agent_config()
    };
    let mut agent = Agent::new(provider.clone(), config, no_thinking());

    let outcome = agent.start("Anything").await.unwrap();

    assert_eq!(provider.call_count(), 4);
    assert_eq!(outcome.status, TaskStatus::Aborted);
    assert!(outcome.abort_reason.unwrap().contains("after 3 retries"));
}

#[tokio::test]
async fn thinking_stops_at_round_limit() {
    let provider = Arc::new(ScriptedProvider::responses(vec![
        make_thinking_response("Still unsure, keep going", true, None),
        complete("ok"),
    ]));
    let thinking_config = ThinkingConfig {
        max_rounds: 1,
        summarize: false,
        ..ThinkingConfig::default()
    };
    let store = Arc::new(InMemoryTurnStore::new());
    let mut agent = Agent::new(provider.clone(), agent_config(), thinking_config).with_store(store.clone());

    let outcome = agent.start("Decide").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(provider.call_count(), 2);
    let turn = store.get_turn(1).await.unwrap();
    assert_eq!(turn.thinking_rounds.len(), 1);
    assert!(turn.thinking_rounds[0].continue_thinking);
}

#[tokio::test]
async fn thinking_summary_steers_the_action_request() {
    let provider = Arc::new(ScriptedProvider::responses(vec![
        make_thinking_response("The answer is known", false, Some("Complete with 42")),
        complete("42"),
    ]));
    let store = Arc::new(InMemoryTurnStore::new());
    let mut agent = Agent::new(provider.clone(), agent_config(), ThinkingConfig::default()).with_store(store.clone());

    let outcome = agent.start("What is six times seven?").await.unwrap();

    assert_eq!(outcome.result.as_deref(), Some("42"));
    let action = &provider.requests()[1];
    let last = action.messages.last().unwrap();
    assert_eq!(last.role, Role::User);
    assert!(last.content.contains("Complete with 42"));
    assert_eq!(store.accumulated_summaries().await, "Turn 1: Complete with 42");
}

#[tokio::test]
async fn response_without_tool_call_is_a_mistake() {
    let provider = Arc::new(ScriptedProvider::responses(vec![
        make_text_response("I think the answer is 4"),
        complete("4"),
    ]));
    let mut agent = Agent::new(provider.clone(), agent_config(), no_thinking());

    let outcome = agent.start("2 + 2?").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(outcome.errors.len(), 1);
    let second = &provider.requests()[1];
    assert!(
        second
            .messages
            .iter()
            .any(|m| m.role == Role::User && m.content.contains("did not use a tool"))
    );
}

#[tokio::test]
async fn unknown_tool_is_fed_back_as_failure() {
    let provider = Arc::new(ScriptedProvider::responses(vec![
        make_tool_call_response("teleport", json!({})),
        complete("fine"),
    ]));
    let mut agent = Agent::new(provider.clone(), agent_config(), no_thinking());

    let outcome = agent.start("Go").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert!(outcome.errors[0].contains("teleport"));
    let second = &provider.requests()[1];
    let tool_message = second.messages.iter().find(|m| m.role == Role::Tool).unwrap();
    assert!(tool_message.content.starts_with("Error: Tool not found"));
}

#[tokio::test]
async fn stops_at_turn_limit() {
    let provider = Arc::new(ScriptedProvider::responses(vec![
        make_tool_call_response("list_skills", json!({})),
        make_tool_call_response("list_skills", json!({})),
    ]));
    let config = AgentConfig {
        max_turns: 2,
        ..agent_config()
    };
    let mut agent = Agent::new(provider.clone(), config, no_thinking());

    let outcome = agent.start("Loop forever").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Aborted);
    assert!(outcome.abort_reason.unwrap().contains("Turn limit of 2"));
    assert_eq!(outcome.turns_completed, 2);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn cancelled_before_start_opens_no_turn() {
    let provider = Arc::new(ScriptedProvider::responses(Vec::new()));
    let store = Arc::new(InMemoryTurnStore::new());
    let token = CancellationToken::new();
    token.cancel();
    let mut agent = Agent::new(provider.clone(), agent_config(), no_thinking())
        .with_store(store.clone())
        .with_cancellation_token(token);

    let outcome = agent.start("Never runs").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Aborted);
    assert!(outcome.abort_reason.unwrap().contains("cancelled"));
    assert_eq!(provider.call_count(), 0);
    assert!(store.turns().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_a_pending_request() {
    let provider = Arc::new(ScriptedProvider::hanging());
    let store = Arc::new(InMemoryTurnStore::new());
    let mut agent = Agent::new(provider, agent_config(), no_thinking()).with_store(store.clone());

    let token = agent.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let outcome = agent.start("Wait").await.unwrap();

    assert_eq!(outcome.status, TaskStatus::Aborted);
    assert_eq!(outcome.turns_completed, 0);
    // The interrupted turn stays open
    let current = store.current_turn().await.unwrap();
    assert_eq!(current.number, 1);
}

#[tokio::test]
async fn observers_see_lifecycle() {
    let provider = Arc::new(ScriptedProvider::responses(vec![complete("done")]));
    let observer = Arc::new(RecordingObserver::default());
    let mut agent = Agent::new(provider, agent_config(), no_thinking()).with_observer(observer.clone());

    agent.start("Finish").await.unwrap();

    let transitions = observer.transitions.lock().unwrap().clone();
    assert_eq!(
        transitions,
        vec![
            (TaskStatus::Idle, TaskStatus::Thinking),
            (TaskStatus::Thinking, TaskStatus::Acting),
            (TaskStatus::Acting, TaskStatus::Completed),
        ]
    );
    assert_eq!(*observer.turns.lock().unwrap(), vec![1]);
    assert_eq!(observer.completed.lock().unwrap().as_deref(), Some("done"));
    assert!(observer.aborted.lock().unwrap().is_none());
}

#[tokio::test]
async fn a_task_runs_only_once() {
    let provider = Arc::new(ScriptedProvider::responses(vec![complete("done")]));
    let mut agent = Agent::new(provider, agent_config(), no_thinking());

    agent.start("Finish").await.unwrap();
    let err = agent.start("Again").await.unwrap_err();

    assert!(matches!(
        err,
        AgentError::AlreadyStarted {
            status: TaskStatus::Completed,
            ..
        }
    ));
}

#[tokio::test]
async fn store_failure_aborts_and_is_recorded() {
    let provider = Arc::new(ScriptedProvider::responses(vec![make_tool_call_response(
        "list_skills",
        json!({}),
    )]));
    let observer = Arc::new(RecordingObserver::default());
    let mut agent = Agent::new(provider, agent_config(), no_thinking())
        .with_store(Arc::new(FailingCompletionStore::new()))
        .with_observer(observer.clone());

    let err = agent.start("List skills").await.unwrap_err();

    assert!(matches!(err, AgentError::Memory(_)));
    assert_eq!(agent.status(), TaskStatus::Aborted);
    assert_eq!(agent.errors().len(), 1);
    assert!(agent.errors()[0].contains("disk full"));
    assert!(observer.aborted.lock().unwrap().as_deref().unwrap().contains("disk full"));
}
