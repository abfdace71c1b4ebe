//! Decoding of loosely structured chunks
//!
//! Some upstreams emit events that are already close to the canonical
//! chunk: optional text, a tool-use object or list, an optional finish
//! flag. Everything else on the event is treated as a rare field.

use serde::Deserialize;
use serde_json::Value;

use super::{EventAdapter, insert_rare_field};
use crate::convert::chat::legacy_function_call;
use crate::protocol::chat::{ChatFunctionCall, ChatUsage};
use crate::types::{JsonMap, StreamingChunk, ToolCall};

#[derive(Debug, Deserialize)]
struct GenericEvent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    tool_use: Option<ToolUse>,
    #[serde(default)]
    function_call: Option<ChatFunctionCall>,
    #[serde(default)]
    is_finished: bool,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    index: u32,
    #[serde(default)]
    provider_specific_fields: Option<JsonMap>,
    #[serde(flatten)]
    rest: JsonMap,
}

/// One structured tool invocation or an incremental list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolUse {
    Many(Vec<ToolCall>),
    One(ToolCall),
}

/// Decodes generic chunks
#[derive(Debug, Default)]
pub struct GenericEventAdapter;

impl EventAdapter for GenericEventAdapter {
    fn adapt(&mut self, event: &Value) -> Result<StreamingChunk, serde_json::Error> {
        let event = GenericEvent::deserialize(event)?;

        let tool_use = match (event.tool_use, event.function_call) {
            (Some(ToolUse::Many(calls)), _) => Some(calls),
            (Some(ToolUse::One(call)), _) => Some(vec![call]),
            (None, Some(function_call)) => Some(vec![legacy_function_call(function_call)]),
            (None, None) => None,
        };
        let finish_reason = event.finish_reason.unwrap_or_default();

        let mut chunk = StreamingChunk {
            text: event.text.unwrap_or_default(),
            tool_use,
            is_finished: event.is_finished || !finish_reason.is_empty(),
            finish_reason,
            usage: event.usage.map(Into::into),
            index: event.index,
            provider_specific_fields: event.provider_specific_fields,
        };

        for (key, value) in event.rest {
            insert_rare_field(&mut chunk, &key, Some(value));
        }

        Ok(chunk)
    }
}
