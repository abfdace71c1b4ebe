//! Anthropic Messages event decoding

use serde::Deserialize;
use serde_json::Value;

use super::{EventAdapter, insert_rare_field};
use crate::convert::anthropic::map_stop_reason;
use crate::protocol::anthropic::{AnthropicStreamContentBlock, AnthropicStreamDelta, AnthropicStreamEvent};
use crate::types::{StreamingChunk, ToolCall, Usage};

/// Decodes Anthropic SSE events
#[derive(Debug, Default)]
pub struct AnthropicEventAdapter {
    /// Content block indices are shared by text and tool blocks, so tool
    /// calls get their own sequential ordinal
    current_tool: Option<u32>,
    next_tool: u32,
    /// Input tokens reported by `message_start`
    input_tokens: u32,
}

impl EventAdapter for AnthropicEventAdapter {
    fn adapt(&mut self, event: &Value) -> Result<StreamingChunk, serde_json::Error> {
        let event = AnthropicStreamEvent::deserialize(event)?;
        let mut chunk = StreamingChunk::default();

        match event {
            AnthropicStreamEvent::MessageStart { message } => {
                if let Some(usage) = message.usage {
                    self.input_tokens = usage.input_tokens;
                }
            }

            AnthropicStreamEvent::ContentBlockStart { content_block, .. } => match content_block {
                AnthropicStreamContentBlock::Text { text } => chunk.text = text,
                AnthropicStreamContentBlock::ToolUse { id, name } => {
                    let ordinal = self.next_tool;
                    self.next_tool += 1;
                    self.current_tool = Some(ordinal);
                    chunk.tool_use = Some(vec![ToolCall::function(ordinal, id, name, "")]);
                }
                AnthropicStreamContentBlock::Thinking | AnthropicStreamContentBlock::Other => {}
            },

            AnthropicStreamEvent::ContentBlockDelta { delta, .. } => match delta {
                AnthropicStreamDelta::TextDelta { text } => chunk.text = text,
                AnthropicStreamDelta::InputJsonDelta { partial_json } => {
                    let ordinal = self.current_tool.unwrap_or(0);
                    chunk.tool_use = Some(vec![ToolCall::fragment(ordinal, partial_json)]);
                }
                AnthropicStreamDelta::ThinkingDelta { thinking } => {
                    chunk.insert_provider_field("thinking", Value::String(thinking));
                }
                AnthropicStreamDelta::SignatureDelta { signature } => {
                    chunk.insert_provider_field("signature", Value::String(signature));
                }
                AnthropicStreamDelta::CitationsDelta { citation } => {
                    chunk.insert_provider_field("citation", citation);
                }
            },

            AnthropicStreamEvent::ContentBlockStop { .. } => self.current_tool = None,

            AnthropicStreamEvent::MessageDelta { delta, usage } => {
                if let Some(reason) = delta.stop_reason {
                    chunk.is_finished = true;
                    chunk.finish_reason = map_stop_reason(&reason);
                }
                chunk.usage = usage.map(|usage| {
                    Usage::new(self.input_tokens.max(usage.input_tokens), usage.output_tokens)
                });
                insert_rare_field(&mut chunk, "stop_sequence", delta.stop_sequence.map(Value::String));
            }

            AnthropicStreamEvent::MessageStop => chunk.is_finished = true,

            AnthropicStreamEvent::Ping => {}

            AnthropicStreamEvent::Error { error } => chunk.insert_provider_field("error", error),
        }

        Ok(chunk)
    }
}
