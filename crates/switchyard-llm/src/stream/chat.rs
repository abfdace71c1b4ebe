//! Chat-completions chunk decoding

use serde::Deserialize;
use serde_json::Value;

use super::{EventAdapter, insert_rare_field};
use crate::convert::chat::{legacy_function_call, tool_call_from_wire};
use crate::protocol::chat::ChatStreamChunk;
use crate::types::StreamingChunk;

/// Decodes `chat.completion.chunk` events
///
/// Only the first choice is read; multi-choice streams are not split.
#[derive(Debug, Default)]
pub struct ChatEventAdapter;

impl EventAdapter for ChatEventAdapter {
    fn adapt(&mut self, event: &Value) -> Result<StreamingChunk, serde_json::Error> {
        let wire = ChatStreamChunk::deserialize(event)?;

        let mut chunk = StreamingChunk {
            usage: wire.usage.map(Into::into),
            ..StreamingChunk::default()
        };
        insert_rare_field(&mut chunk, "error", wire.error);
        insert_rare_field(&mut chunk, "citations", wire.citations);
        for (key, value) in wire.provider_specific_fields.unwrap_or_default() {
            insert_rare_field(&mut chunk, &key, Some(value));
        }

        let Some(choice) = wire.choices.into_iter().next() else {
            return Ok(chunk);
        };
        let delta = choice.delta;

        chunk.index = choice.index;
        chunk.text = delta.content.unwrap_or_default();
        chunk.tool_use = match (delta.tool_calls, delta.function_call) {
            (Some(calls), _) => Some(calls.into_iter().map(|call| tool_call_from_wire(call, 0)).collect()),
            (None, Some(function_call)) => Some(vec![legacy_function_call(function_call)]),
            (None, None) => None,
        };

        if let Some(reason) = choice.finish_reason.filter(|reason| !reason.is_empty()) {
            chunk.is_finished = true;
            chunk.finish_reason = reason;
        }

        insert_rare_field(&mut chunk, "logprobs", choice.logprobs);
        insert_rare_field(&mut chunk, "refusal", delta.refusal.map(Value::String));
        for (key, value) in delta.extra {
            insert_rare_field(&mut chunk, &key, Some(value));
        }

        Ok(chunk)
    }
}
