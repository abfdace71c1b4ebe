//! Mock upstream for integration tests
//!
//! Serves the chat-completions and Responses endpoints with canned bodies
//! and records every payload it receives.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Upstream that answers every request with predictable content
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

/// A payload as the mock received it
#[derive(Debug, Clone)]
pub struct Received {
    pub path: &'static str,
    pub body: Value,
}

struct MockState {
    received: Mutex<Vec<Received>>,
    /// Requests left to fail with 500 before succeeding
    fail_count: AtomicU32,
    text: String,
}

impl MockUpstream {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, "Hello from mock upstream").await
    }

    /// Start a mock server that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, "Hello from mock upstream").await
    }

    /// Start a mock server that answers with `text`
    pub async fn start_with_text(text: &str) -> anyhow::Result<Self> {
        Self::start_inner(0, text).await
    }

    async fn start_inner(fail_count: u32, text: &str) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            received: Mutex::new(Vec::new()),
            fail_count: AtomicU32::new(fail_count),
            text: text.to_owned(),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/responses", routing::post(handle_responses))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Every payload received so far, oldest first
    pub fn received(&self) -> Vec<Received> {
        self.state.received.lock().unwrap().clone()
    }

    /// The most recent payload
    pub fn last_body(&self) -> Value {
        self.received().pop().map(|r| r.body).unwrap_or(Value::Null)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl MockState {
    /// Record the payload; returns an error response while failures remain
    fn accept(&self, path: &'static str, body: &Value) -> Option<Response> {
        self.received.lock().unwrap().push(Received {
            path,
            body: body.clone(),
        });

        let remaining = self.fail_count.load(Ordering::Relaxed);
        if remaining == 0 {
            return None;
        }
        self.fail_count.fetch_sub(1, Ordering::Relaxed);

        let error = json!({"error": {"message": "mock upstream intentional failure", "type": "server_error"}});
        Some((StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response())
    }
}

fn wants_stream(body: &Value) -> bool {
    body["stream"].as_bool().unwrap_or(false)
}

fn has_tools(body: &Value) -> bool {
    body["tools"].as_array().is_some_and(|tools| !tools.is_empty())
}

fn sse(events: &[Value]) -> Response {
    let mut body = String::new();
    for event in events {
        body.push_str(&format!("data: {event}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");

    (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

// -- Chat completions --

async fn handle_chat_completions(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.accept("/chat/completions", &body) {
        return failure;
    }

    let model = body["model"].clone();
    let tools = has_tools(&body);

    if wants_stream(&body) {
        return sse(&chat_stream(&model, &state.text, tools));
    }

    let message = if tools {
        json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_test_123",
                "type": "function",
                "function": {"name": "get_weather", "arguments": "{\"location\":\"San Francisco\"}"}
            }]
        })
    } else {
        json!({"role": "assistant", "content": state.text})
    };

    Json(json!({
        "id": "chatcmpl-test-123",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": if tools { "tool_calls" } else { "stop" }
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
    .into_response()
}

fn chat_chunk(model: &Value, delta: Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    })
}

fn chat_stream(model: &Value, text: &str, tools: bool) -> Vec<Value> {
    let mut events = vec![chat_chunk(model, json!({"role": "assistant", "content": ""}), None)];

    if tools {
        events.push(chat_chunk(
            model,
            json!({"tool_calls": [{
                "index": 0,
                "id": "call_test_stream",
                "type": "function",
                "function": {"name": "get_weather", "arguments": ""}
            }]}),
            None,
        ));
        for fragment in ["{\"location\":", "\"San Francisco\"}"] {
            events.push(chat_chunk(
                model,
                json!({"tool_calls": [{"index": 0, "function": {"arguments": fragment}}]}),
                None,
            ));
        }
        events.push(chat_chunk(model, json!({}), Some("tool_calls")));
    } else {
        for word in text.split_whitespace() {
            events.push(chat_chunk(model, json!({"content": format!("{word} ")}), None));
        }
        events.push(chat_chunk(model, json!({}), Some("stop")));
    }

    events
}

// -- Responses --

async fn handle_responses(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.accept("/responses", &body) {
        return failure;
    }

    let model = body["model"].clone();
    let tools = has_tools(&body);

    if wants_stream(&body) {
        return sse(&responses_stream(&state.text, tools));
    }

    let output = if tools {
        json!([{
            "type": "function_call",
            "id": "fc_test_1",
            "call_id": "call_test_123",
            "name": "get_weather",
            "arguments": "{\"location\":\"San Francisco\"}"
        }])
    } else {
        json!([
            {"type": "reasoning", "id": "rs_1", "summary": [{"type": "summary_text", "text": "Greeting the user"}]},
            {
                "type": "message",
                "id": "msg_1",
                "role": "assistant",
                "content": [{"type": "output_text", "text": state.text, "annotations": []}]
            }
        ])
    };

    Json(json!({
        "id": "resp_test_123",
        "object": "response",
        "created_at": 1_700_000_000,
        "status": "completed",
        "model": model,
        "output": output,
        "usage": {"input_tokens": 10, "output_tokens": 5, "total_tokens": 15}
    }))
    .into_response()
}

fn responses_stream(text: &str, tools: bool) -> Vec<Value> {
    let mut events = vec![json!({"type": "response.created", "response": {"id": "resp_test_stream"}})];

    if tools {
        events.push(json!({
            "type": "response.output_item.added",
            "output_index": 0,
            "item": {"type": "function_call", "id": "fc_1", "call_id": "call_test_stream", "name": "get_weather", "arguments": ""}
        }));
        for fragment in ["{\"location\":", "\"San Francisco\"}"] {
            events.push(json!({
                "type": "response.function_call_arguments.delta",
                "output_index": 0,
                "item_id": "fc_1",
                "delta": fragment
            }));
        }
    } else {
        for word in text.split_whitespace() {
            events.push(json!({"type": "response.output_text.delta", "output_index": 0, "delta": format!("{word} ")}));
        }
    }

    events.push(json!({
        "type": "response.completed",
        "response": {
            "status": "completed",
            "output": [],
            "usage": {"input_tokens": 10, "output_tokens": 5, "total_tokens": 15}
        }
    }));
    events
}
