//! Streaming normalization
//!
//! Each upstream event is turned into exactly one [`StreamingChunk`].
//! Events are decoded by one adapter per wire shape; the normalizer owns
//! the adapter, tracks whether a terminal event has been seen, and keeps
//! the tool-call fragments seen so far.

pub mod accumulator;
pub mod anthropic;
pub mod chat;
pub mod generic;
pub mod responses;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

pub use accumulator::{ToolCallAccumulator, ToolCallState};
pub use anthropic::AnthropicEventAdapter;
pub use chat::ChatEventAdapter;
pub use generic::GenericEventAdapter;
pub use responses::ResponsesEventAdapter;

use crate::diagnostics::DiagnosticSink;
use crate::error::NormalizationWarning;
use crate::types::StreamingChunk;

/// Wire shape of upstream stream events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventShape {
    /// Chat-completions chunks
    Chat,
    /// Responses API typed events
    Responses,
    /// Anthropic Messages events
    Anthropic,
    /// Loosely structured chunks already close to the canonical shape
    Generic,
}

/// Decodes one wire shape into canonical chunks
///
/// Adapters may keep state across events (tool-call ordinals, usage seen
/// earlier in the stream).
pub trait EventAdapter: Send {
    /// Translate one event
    ///
    /// # Errors
    ///
    /// Returns the decoding error when the event does not match the shape
    fn adapt(&mut self, event: &Value) -> Result<StreamingChunk, serde_json::Error>;
}

/// Adapter for a shape, with fresh state
pub fn adapter_for(shape: EventShape) -> Box<dyn EventAdapter> {
    match shape {
        EventShape::Chat => Box::new(ChatEventAdapter::default()),
        EventShape::Responses => Box::new(ResponsesEventAdapter::default()),
        EventShape::Anthropic => Box::new(AnthropicEventAdapter::default()),
        EventShape::Generic => Box::new(GenericEventAdapter::default()),
    }
}

/// Lifecycle of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Events are still expected
    Open,
    /// A terminal event was seen or the upstream ended
    Closed,
}

/// Normalizes the events of a single stream
pub struct StreamNormalizer {
    shape: EventShape,
    adapter: Box<dyn EventAdapter>,
    diagnostics: Arc<dyn DiagnosticSink>,
    accumulator: ToolCallAccumulator,
    state: StreamState,
}

impl StreamNormalizer {
    pub fn new(shape: EventShape, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            shape,
            adapter: adapter_for(shape),
            diagnostics,
            accumulator: ToolCallAccumulator::default(),
            state: StreamState::Open,
        }
    }

    pub const fn shape(&self) -> EventShape {
        self.shape
    }

    pub const fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Tool calls assembled from the fragments seen so far
    pub const fn tool_calls(&self) -> &ToolCallAccumulator {
        &self.accumulator
    }

    /// Normalize one event
    ///
    /// Never fails: an event that cannot be decoded yields an empty chunk
    /// and a warning on the diagnostic sink.
    pub fn normalize(&mut self, event: &Value) -> StreamingChunk {
        let chunk = match self.adapter.adapt(event) {
            Ok(chunk) => chunk,
            Err(e) => {
                self.diagnostics
                    .report(&NormalizationWarning::new(self.shape, e.to_string()));
                return StreamingChunk::default();
            }
        };

        if self.is_closed() {
            tracing::debug!(shape = %self.shape, "event received after stream closed");
        }

        if let Some(calls) = &chunk.tool_use {
            self.accumulator.apply(calls);
        }

        if chunk.is_finished {
            self.close();
        }

        chunk
    }

    /// Mark the stream closed because the upstream ended
    pub fn close(&mut self) {
        if self.state == StreamState::Open {
            self.state = StreamState::Closed;
            self.accumulator.complete();
        }
    }
}

impl std::fmt::Debug for StreamNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamNormalizer")
            .field("shape", &self.shape)
            .field("state", &self.state)
            .field("accumulator", &self.accumulator)
            .finish_non_exhaustive()
    }
}

/// Insert `value` under `key` unless it is null or an empty list
pub(crate) fn insert_rare_field(chunk: &mut StreamingChunk, key: &str, value: Option<Value>) {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) if items.is_empty() => {}
        Some(value) => chunk.insert_provider_field(key, value),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diagnostics::testing::CollectingDiagnostics;

    fn normalizer(shape: EventShape) -> (StreamNormalizer, Arc<CollectingDiagnostics>) {
        let diagnostics = Arc::new(CollectingDiagnostics::default());
        (StreamNormalizer::new(shape, diagnostics.clone()), diagnostics)
    }

    #[test]
    fn argument_fragments_concatenate_to_valid_json() {
        let (mut normalizer, _) = normalizer(EventShape::Chat);

        let events = [
            json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                {"index": 0, "id": "call_1", "type": "function", "function": {"name": "weather", "arguments": "{\"ci"}}
            ]}}]}),
            json!({"choices": [{"index": 0, "delta": {"tool_calls": [{"index": 0, "function": {"arguments": "ty\":\"Os"}}]}}]}),
            json!({"choices": [{"index": 0, "delta": {"tool_calls": [{"function": {"arguments": "lo\"}"}}]}}]}),
            json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "tool_calls"}]}),
        ];

        let chunks = events.iter().map(|e| normalizer.normalize(e)).collect::<Vec<_>>();

        assert_eq!(chunks.len(), events.len());
        assert!(chunks.last().unwrap().is_finished);
        assert!(normalizer.is_closed());

        let calls = normalizer.tool_calls().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(normalizer.tool_calls().state(0), ToolCallState::Complete);

        let arguments: Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(arguments, json!({"city": "Oslo"}));
    }

    #[test]
    fn malformed_event_yields_empty_chunk_and_warning() {
        let (mut normalizer, diagnostics) = normalizer(EventShape::Anthropic);

        let chunk = normalizer.normalize(&json!({"type": "content_block_delta", "index": "zero"}));

        assert!(chunk.is_empty());
        assert!(!chunk.is_finished);
        let warnings = diagnostics.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].shape, EventShape::Anthropic);
        assert!(normalizer.state() == StreamState::Open);
    }

    #[test]
    fn non_json_payload_is_reported() {
        let (mut normalizer, diagnostics) = normalizer(EventShape::Responses);

        let chunk = normalizer.normalize(&Value::String("keep-alive".to_owned()));

        assert!(chunk.is_empty());
        assert_eq!(diagnostics.warnings().len(), 1);
    }

    #[test]
    fn events_after_close_are_still_normalized() {
        let (mut normalizer, diagnostics) = normalizer(EventShape::Chat);

        normalizer.normalize(&json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]}));
        let late = normalizer.normalize(&json!({"choices": [], "usage": {"prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6}}));

        assert!(normalizer.is_closed());
        assert_eq!(late.usage.map(|u| u.total_tokens), Some(6));
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn close_completes_pending_tool_calls() {
        let (mut normalizer, _) = normalizer(EventShape::Generic);

        normalizer.normalize(&json!({"tool_use": {"id": "t1", "function": {"name": "f", "arguments": "{}"}}}));
        assert_eq!(normalizer.tool_calls().state(0), ToolCallState::Accumulating);

        normalizer.close();
        assert_eq!(normalizer.tool_calls().state(0), ToolCallState::Complete);
    }

    #[test]
    fn shape_names_are_snake_case() {
        assert_eq!(EventShape::Responses.to_string(), "responses");
        assert_eq!("generic".parse::<EventShape>().unwrap(), EventShape::Generic);
    }
}
