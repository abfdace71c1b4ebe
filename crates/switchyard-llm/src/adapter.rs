//! Request adaptation
//!
//! Produces the upstream payload for a resolved route: route parameters
//! are merged into a copy of the caller's request, a short list of
//! compatibility rewrites is applied, and the result is serialized in the
//! route's dialect.

use serde::Serialize;
use serde_json::Value;
use switchyard_config::AdapterConfig;

use crate::error::ConversionError;
use crate::protocol::chat::ChatRequest;
use crate::protocol::responses::ResponsesRequest;
use crate::routing::{Dialect, ModelRoute};
use crate::types::{CanonicalRequest, Content, Message, Role};

/// Text of a one-token connectivity probe
const PROBE_TEXT: &str = "test";

/// Budget given to rewritten probes so non-Anthropic models can answer
const PROBE_TOKEN_BUDGET: u32 = 100;

const PROBE_INSTRUCTION: &str =
    "The intention of this request is to test connectivity. Please respond with a single word: OK";

const SINGLE_TOOL_INSTRUCTION: &str = "IMPORTANT: When using tools, call AT MOST one tool per response. Never \
    attempt multiple tool calls in a single response. The client does not support multiple tool calls in a single \
    response. If multiple tools are needed, choose the next best single tool, return exactly one tool call, and wait \
    for the next turn.";

/// Upstream payload in the route's dialect
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DialectPayload {
    /// Chat-completions request
    Chat(ChatRequest),
    /// Responses API request
    SingleInput(ResponsesRequest),
}

impl DialectPayload {
    pub const fn dialect(&self) -> Dialect {
        match self {
            Self::Chat(_) => Dialect::Chat,
            Self::SingleInput(_) => Dialect::SingleInput,
        }
    }

    /// JSON body as sent to the upstream
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Malformed` if the payload cannot be
    /// represented as JSON
    pub fn to_value(&self) -> Result<Value, ConversionError> {
        serde_json::to_value(self).map_err(|e| ConversionError::malformed(format!("{} payload", self.dialect()), e))
    }
}

/// Route plus the payload prepared for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptedRequest {
    pub route: ModelRoute,
    pub payload: DialectPayload,
}

/// Applies compatibility rewrites and dialect serialization
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    probe_rewrite: bool,
    enforce_single_tool_call: bool,
}

impl RequestAdapter {
    pub const fn new(config: &AdapterConfig) -> Self {
        Self {
            probe_rewrite: config.probe_rewrite,
            enforce_single_tool_call: config.enforce_single_tool_call,
        }
    }

    /// Adapt a request for a resolved route
    ///
    /// The caller's request is never modified.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::MissingField` when the single-input
    /// dialect needs a field the request does not carry
    pub fn adapt(
        &self,
        request: &CanonicalRequest,
        route: &ModelRoute,
        stream: bool,
    ) -> Result<AdaptedRequest, ConversionError> {
        let mut adapted = request.clone();
        adapted.model = route.model_name().to_owned();
        merge_route_params(&mut adapted, route);
        adapted.params.stream = Some(stream);

        let probe_rewritten = self.probe_rewrite && rewrite_probe(&mut adapted, route);
        if !probe_rewritten && self.enforce_single_tool_call {
            guard_single_tool_call(&mut adapted, route);
        }

        let payload = match route.dialect() {
            Dialect::Chat => DialectPayload::Chat(ChatRequest::from(&adapted)),
            Dialect::SingleInput => DialectPayload::SingleInput(ResponsesRequest::try_from(&adapted)?),
        };

        tracing::debug!(
            target_model = %route.target_model(),
            dialect = %route.dialect(),
            messages = adapted.messages.len(),
            probe_rewritten,
            "adapted request"
        );

        Ok(AdaptedRequest {
            route: route.clone(),
            payload,
        })
    }
}

fn merge_route_params(request: &mut CanonicalRequest, route: &ModelRoute) {
    for (key, value) in route.extra_params() {
        match (key.as_str(), value) {
            ("reasoning_effort", Value::String(effort)) => request.params.reasoning_effort = Some(effort.clone()),
            _ => {
                request.params.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Turn a one-token "test" probe into an answerable connectivity check
fn rewrite_probe(request: &mut CanonicalRequest, route: &ModelRoute) -> bool {
    if route.provider().is_anthropic() {
        return false;
    }

    let params = &request.params;
    if params.max_tokens != Some(1) && params.max_completion_tokens != Some(1) {
        return false;
    }

    let [message] = request.messages.as_mut_slice() else {
        return false;
    };
    if message.role != Role::User || message.text_content().as_deref() != Some(PROBE_TEXT) {
        return false;
    }

    message.role = Role::System;
    message.content = Some(Content::Text(PROBE_INSTRUCTION.to_owned()));

    if request.params.max_completion_tokens.is_some() {
        request.params.max_completion_tokens = Some(PROBE_TOKEN_BUDGET);
    }
    if request.params.max_tokens.is_some() {
        request.params.max_tokens = Some(PROBE_TOKEN_BUDGET);
    }

    tracing::debug!(target_model = %route.target_model(), "rewrote connectivity probe");
    true
}

fn guard_single_tool_call(request: &mut CanonicalRequest, route: &ModelRoute) {
    if route.provider().supports_parallel_tool_calls() || request.params.tool_count() < 2 {
        return;
    }

    let already_guarded = request.messages.last().is_some_and(|last| {
        last.role == Role::System && last.text_content().as_deref() == Some(SINGLE_TOOL_INSTRUCTION)
    });
    if already_guarded {
        return;
    }

    request.messages.push(Message::text(Role::System, SINGLE_TOOL_INSTRUCTION));
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchyard_config::{RemapRule, RoutingConfig};

    use super::*;
    use crate::routing::ModelRouter;

    fn route(alias: &str) -> ModelRoute {
        let config = RoutingConfig {
            remap: vec![RemapRule::new("haiku", "gpt-5-mini-reason-minimal")],
            ..RoutingConfig::default()
        };
        ModelRouter::new(&config).unwrap().resolve(alias).unwrap()
    }

    fn adapter() -> RequestAdapter {
        RequestAdapter::new(&AdapterConfig::default())
    }

    fn request(value: Value) -> CanonicalRequest {
        CanonicalRequest::from_value(value).unwrap()
    }

    fn payload(adapted: &AdaptedRequest) -> Value {
        adapted.payload.to_value().unwrap()
    }

    fn two_tools() -> Value {
        json!([
            {"type": "function", "function": {"name": "read_file"}},
            {"type": "function", "function": {"name": "write_file"}}
        ])
    }

    #[test]
    fn reasoning_alias_sets_effort_and_bare_model() {
        let original = request(json!({
            "model": "gpt-5-mini-reason-high",
            "messages": [{"role": "user", "content": "hi"}]
        }));

        let adapted = adapter().adapt(&original, &route("gpt-5-mini-reason-high"), true).unwrap();
        let wire = payload(&adapted);

        assert_eq!(wire["model"], json!("gpt-5-mini"));
        assert_eq!(wire["reasoning_effort"], json!("high"));
        assert_eq!(wire["stream"], json!(true));
        assert_eq!(original.model, "gpt-5-mini-reason-high");
        assert_eq!(original.params.stream, None);
    }

    #[test]
    fn connectivity_probe_is_rewritten() {
        let original = request(json!({
            "model": "claude-3-5-haiku-20241022",
            "messages": [{"role": "user", "content": "test"}],
            "max_tokens": 1,
            "tools": two_tools()
        }));
        let route = route("claude-3-5-haiku-20241022");

        let adapted = adapter().adapt(&original, &route, false).unwrap();
        let wire = payload(&adapted);

        assert_eq!(route.target_model(), "openai/gpt-5-mini");
        assert_eq!(
            wire["messages"],
            json!([{"role": "system", "content": PROBE_INSTRUCTION}])
        );
        assert_eq!(wire["max_tokens"], json!(100));
        assert_eq!(wire["reasoning_effort"], json!("minimal"));
        assert_eq!(original.messages[0].role, Role::User);
    }

    #[test]
    fn probe_with_completion_budget_is_rewritten() {
        let original = request(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "test"}],
            "max_completion_tokens": 1
        }));

        let wire = payload(&adapter().adapt(&original, &route("gpt-4o"), false).unwrap());

        assert_eq!(wire["max_completion_tokens"], json!(100));
        assert!(wire.get("max_tokens").is_none());
    }

    #[test]
    fn probe_is_left_alone_for_anthropic() {
        let original = request(json!({
            "model": "claude-sonnet-4-5",
            "messages": [{"role": "user", "content": "test"}],
            "max_tokens": 1
        }));

        let wire = payload(&adapter().adapt(&original, &route("claude-sonnet-4-5"), false).unwrap());

        assert_eq!(wire["messages"], json!([{"role": "user", "content": "test"}]));
        assert_eq!(wire["max_tokens"], json!(1));
    }

    #[test]
    fn probe_rewrite_can_be_disabled() {
        let adapter = RequestAdapter::new(&AdapterConfig {
            probe_rewrite: false,
            ..AdapterConfig::default()
        });
        let original = request(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "test"}],
            "max_tokens": 1
        }));

        let wire = payload(&adapter.adapt(&original, &route("gpt-4o"), false).unwrap());

        assert_eq!(wire["max_tokens"], json!(1));
    }

    #[test]
    fn single_tool_guard_appends_instruction_once() {
        let original = request(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "refactor this"}],
            "tools": two_tools()
        }));
        let route = route("gpt-4o");

        let first = adapter().adapt(&original, &route, false).unwrap();
        let DialectPayload::Chat(chat) = &first.payload else {
            panic!("expected chat payload");
        };
        let last = chat.messages.last().unwrap();
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(last.role, "system");

        // Feeding the adapted conversation back in must not add a second copy
        let mut again = original.clone();
        again.messages.push(Message::text(Role::System, SINGLE_TOOL_INSTRUCTION));
        let second = adapter().adapt(&again, &route, false).unwrap();
        let DialectPayload::Chat(chat) = &second.payload else {
            panic!("expected chat payload");
        };
        assert_eq!(chat.messages.len(), 2);
    }

    #[test]
    fn single_tool_guard_counts_legacy_functions() {
        let original = request(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "go"}],
            "tools": [{"type": "function", "function": {"name": "a"}}],
            "functions": [{"name": "b"}]
        }));

        let wire = payload(&adapter().adapt(&original, &route("gpt-4o"), false).unwrap());

        assert_eq!(wire["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn single_tool_guard_skips_parallel_capable_providers_and_single_tools() {
        let anthropic = request(json!({
            "model": "claude-sonnet-4-5",
            "messages": [{"role": "user", "content": "go"}],
            "tools": two_tools()
        }));
        let wire = payload(&adapter().adapt(&anthropic, &route("claude-sonnet-4-5"), false).unwrap());
        assert_eq!(wire["messages"].as_array().unwrap().len(), 1);

        let one_tool = request(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "go"}],
            "tools": [{"type": "function", "function": {"name": "a"}}]
        }));
        let wire = payload(&adapter().adapt(&one_tool, &route("gpt-4o"), false).unwrap());
        assert_eq!(wire["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn single_input_route_serializes_input_items() {
        let original = request(json!({
            "model": "codex-mini-latest",
            "messages": [
                {"role": "user", "content": "list files"},
                {"role": "assistant", "tool_calls": [
                    {"id": "call_1", "type": "function", "function": {"name": "ls", "arguments": "{}"}}
                ]},
                {"role": "tool", "tool_call_id": "call_1", "content": "a.rs"}
            ],
            "temperature": 0.2,
            "max_tokens": 500
        }));
        let route = route("codex-mini-latest");

        let adapted = adapter().adapt(&original, &route, true).unwrap();
        let wire = payload(&adapted);

        assert_eq!(adapted.payload.dialect(), Dialect::SingleInput);
        assert_eq!(wire["model"], json!("codex-mini-latest"));
        assert_eq!(wire["max_output_tokens"], json!(500));
        assert_eq!(wire["stream"], json!(true));
        assert!(wire.get("temperature").is_none());
        assert!(wire.get("messages").is_none());
        assert_eq!(wire["input"][1]["type"], json!("function_call"));
        assert_eq!(wire["input"][2]["type"], json!("function_call_output"));
    }

    #[test]
    fn single_input_route_reports_missing_call_id() {
        let original = request(json!({
            "model": "codex-mini-latest",
            "messages": [{"role": "tool", "content": "orphan"}]
        }));

        let err = adapter()
            .adapt(&original, &route("codex-mini-latest"), false)
            .unwrap_err();

        assert!(matches!(err, ConversionError::MissingField { field: "tool_call_id", .. }));
    }
}
