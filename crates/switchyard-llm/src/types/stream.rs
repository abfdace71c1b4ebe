use serde::{Deserialize, Serialize};

use super::JsonMap;
use super::response::Usage;
use super::tool::ToolCall;

/// One normalized streaming chunk
///
/// Produced exactly once per upstream event. `text` and `finish_reason`
/// are empty strings rather than absent so consumers never see nulls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamingChunk {
    /// Incremental text
    #[serde(default)]
    pub text: String,
    /// Incremental tool call deltas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use: Option<Vec<ToolCall>>,
    /// Whether the event carried a terminal signal
    #[serde(default)]
    pub is_finished: bool,
    /// Why generation stopped, in chat-completions vocabulary
    #[serde(default)]
    pub finish_reason: String,
    /// Token usage, usually on the final event only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Rare or provider-specific fields carried by the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_specific_fields: Option<JsonMap>,
}

impl StreamingChunk {
    /// Chunk carrying only text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Terminal chunk with the given finish reason
    pub fn finished(finish_reason: impl Into<String>) -> Self {
        Self {
            is_finished: true,
            finish_reason: finish_reason.into(),
            ..Self::default()
        }
    }

    /// Add one provider-specific field, creating the map on first use
    pub fn insert_provider_field(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.provider_specific_fields
            .get_or_insert_with(JsonMap::new)
            .insert(key.into(), value);
    }

    /// Whether the chunk carries no content or signal at all
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.tool_use.is_none()
            && !self.is_finished
            && self.finish_reason.is_empty()
            && self.usage.is_none()
            && self.provider_specific_fields.is_none()
    }
}
