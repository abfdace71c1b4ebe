use serde::{Deserialize, Serialize};

use super::JsonMap;
use super::tool::ToolCall;

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion)
    pub total_tokens: u32,
}

impl Usage {
    /// Usage with the total computed from its parts
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// A single completion choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice
    pub index: u32,
    /// Generated message
    pub message: ChoiceMessage,
    /// Why generation stopped, in chat-completions vocabulary
    pub finish_reason: Option<String>,
}

/// Message content within a response choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Author role, normally "assistant"
    pub role: String,
    /// Text content
    pub content: Option<String>,
    /// Tool calls requested by the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChoiceMessage {
    /// Assistant message from collected text and tool calls
    ///
    /// Empty text becomes `None` when tool calls are present.
    pub fn assistant(text: String, tool_calls: Vec<ToolCall>) -> Self {
        if tool_calls.is_empty() {
            return Self {
                role: "assistant".to_owned(),
                content: Some(text),
                tool_calls: None,
            };
        }

        Self {
            role: "assistant".to_owned(),
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls: Some(tool_calls),
        }
    }
}

/// Canonical, dialect-independent completion response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    /// Upstream response identifier
    pub id: String,
    /// Model that produced the response
    pub model: String,
    /// Generated choices in order
    pub choices: Vec<Choice>,
    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Top-level upstream fields with no canonical counterpart
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub provider_specific_fields: JsonMap,
}

impl CanonicalResponse {
    /// Text of the first choice, if any
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }
}
