//! Conversion from the Anthropic Messages response format

use serde_json::Value;

use crate::error::ConversionError;
use crate::protocol::anthropic::{AnthropicResponse, AnthropicResponseBlock, AnthropicUsage};
use crate::types::{CanonicalResponse, Choice, ChoiceMessage, JsonMap, ToolCall, Usage};

impl TryFrom<AnthropicResponse> for CanonicalResponse {
    type Error = ConversionError;

    fn try_from(resp: AnthropicResponse) -> Result<Self, Self::Error> {
        let id = resp
            .id
            .ok_or_else(|| ConversionError::missing("id", "anthropic response"))?;

        let mut text = String::new();
        let mut thinking = String::new();
        let mut citations = Vec::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block {
                AnthropicResponseBlock::Text {
                    text: fragment,
                    citations: block_citations,
                } => {
                    text.push_str(&fragment);
                    if let Some(Value::Array(found)) = block_citations {
                        citations.extend(found);
                    }
                }
                AnthropicResponseBlock::ToolUse { id, name, input } => {
                    let index = u32::try_from(tool_calls.len()).unwrap_or(u32::MAX);
                    tool_calls.push(ToolCall::function(index, id, name, input.to_string()));
                }
                AnthropicResponseBlock::Thinking { thinking: fragment } => thinking.push_str(&fragment),
                AnthropicResponseBlock::Other => {}
            }
        }

        let mut provider_specific_fields = JsonMap::new();
        if !thinking.is_empty() {
            provider_specific_fields.insert("thinking".to_owned(), Value::String(thinking));
        }
        if !citations.is_empty() {
            provider_specific_fields.insert("citations".to_owned(), Value::Array(citations));
        }
        if let Some(sequence) = resp.stop_sequence {
            provider_specific_fields.insert("stop_sequence".to_owned(), Value::String(sequence));
        }

        Ok(Self {
            id,
            model: resp.model.unwrap_or_default(),
            choices: vec![Choice {
                index: 0,
                message: ChoiceMessage::assistant(text, tool_calls),
                finish_reason: resp.stop_reason.as_deref().map(map_stop_reason),
            }],
            usage: resp.usage.map(Into::into),
            provider_specific_fields,
        })
    }
}

impl From<AnthropicUsage> for Usage {
    fn from(usage: AnthropicUsage) -> Self {
        Self::new(usage.input_tokens, usage.output_tokens)
    }
}

/// Map an Anthropic stop reason onto the chat finish-reason vocabulary
pub(crate) fn map_stop_reason(reason: &str) -> String {
    match reason {
        "end_turn" | "stop_sequence" => "stop",
        "max_tokens" => "length",
        "tool_use" => "tool_calls",
        "refusal" => "content_filter",
        other => other,
    }
    .to_owned()
}
