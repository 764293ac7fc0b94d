//! Scripted provider and response builders shared by unit and integration tests.

use mindloop_core::error::ProviderError;
use mindloop_core::{Message, MessageToolCall, Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the provider does once its script runs out.
enum WhenExhausted {
    Panic,
    Fail(ProviderError),
    Hang,
}

/// A mock provider that replays a script of responses and errors.
///
/// Each call to `complete` consumes the next entry and records the request.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    when_exhausted: WhenExhausted,
    calls: AtomicUsize,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            when_exhausted: WhenExhausted::Panic,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that replays these responses in order.
    pub fn responses(responses: Vec<ProviderResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    /// Every call fails with `error`.
    pub fn always_failing(error: ProviderError) -> Self {
        Self {
            when_exhausted: WhenExhausted::Fail(error),
            ..Self::new(Vec::new())
        }
    }

    /// Every call hangs forever (use with a timeout).
    pub fn hanging() -> Self {
        Self {
            when_exhausted: WhenExhausted::Hang,
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let next = self.script.lock().unwrap().pop_front();
        if let Some(next) = next {
            return next;
        }
        match &self.when_exhausted {
            WhenExhausted::Panic => panic!("ScriptedProvider: no more responses (call #{call})"),
            WhenExhausted::Fail(e) => Err(e.clone()),
            WhenExhausted::Hang => std::future::pending().await,
        }
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with one tool call.
pub fn make_tool_call_response(name: &str, args: serde_json::Value) -> ProviderResponse {
    let mut response = make_text_response("");
    response.message.tool_calls = vec![make_tool_call(name, args)];
    response
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}

/// A thinking-round reply in the structured format.
pub fn make_thinking_response(thinking: &str, continue_thinking: bool, summary: Option<&str>) -> ProviderResponse {
    let mut body = serde_json::json!({
        "thinking": thinking,
        "continue_thinking": continue_thinking,
    });
    if let Some(summary) = summary {
        body["summary"] = serde_json::json!(summary);
    }
    make_text_response(&body.to_string())
}
