use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JsonMap;
use super::message::Message;
use super::tool::{FunctionDefinition, ToolChoice, ToolDefinition};
use crate::error::ConversionError;

/// Parameters controlling generation
///
/// Typed fields cover what the adapter inspects or renames; everything else
/// lands in `extra` and is forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Maximum completion tokens, the newer spelling of `max_tokens`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequences>,
    /// Presence penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Frequency penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Random seed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Number of choices to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Legacy function definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDefinition>>,
    /// How the model should select tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Allow several tool calls in one response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    /// Structured output format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    /// Reasoning depth hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    /// End-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Caller metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
    /// Stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl RequestParams {
    /// Number of tool and legacy function definitions
    pub fn tool_count(&self) -> usize {
        self.tools.as_ref().map_or(0, Vec::len) + self.functions.as_ref().map_or(0, Vec::len)
    }

    /// Token budget from either spelling, preferring `max_completion_tokens`
    pub const fn token_budget(&self) -> Option<u32> {
        match self.max_completion_tokens {
            Some(budget) => Some(budget),
            None => self.max_tokens,
        }
    }
}

/// One stop sequence or several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    /// Single sequence
    One(String),
    /// Several sequences
    Many(Vec<String>),
}

/// Canonical chat request
///
/// On the wire the parameters sit beside `model` and `messages`, the way
/// chat-completions clients send them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    /// Requested model alias
    pub model: String,
    /// Conversation messages in order
    pub messages: Vec<Message>,
    /// Generation parameters
    #[serde(flatten)]
    pub params: RequestParams,
}

impl CanonicalRequest {
    /// Request with default parameters
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            params: RequestParams::default(),
        }
    }

    /// Parse a raw inbound request
    ///
    /// Parameters may also be nested under a `params` object; top-level
    /// values win when both are present.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::MissingField` when `model`, `messages` or a
    /// message `role` is absent, and `ConversionError::Malformed` when the
    /// payload does not match the canonical schema
    pub fn from_value(value: Value) -> Result<Self, ConversionError> {
        let Value::Object(mut object) = value else {
            return Err(ConversionError::malformed(
                "request",
                serde::de::Error::custom("request must be a JSON object"),
            ));
        };

        if let Some(Value::Object(nested)) = object.remove("params") {
            for (key, value) in nested {
                object.entry(key).or_insert(value);
            }
        }

        if !object.contains_key("model") {
            return Err(ConversionError::missing("model", "request"));
        }

        match object.get("messages") {
            None => return Err(ConversionError::missing("messages", "request")),
            Some(Value::Array(messages)) => {
                for (position, message) in messages.iter().enumerate() {
                    if message.get("role").is_none_or(Value::is_null) {
                        return Err(ConversionError::missing("role", format!("messages[{position}]")));
                    }
                }
            }
            Some(_) => {}
        }

        serde_json::from_value(Value::Object(object)).map_err(|e| ConversionError::malformed("request", e))
    }

    /// Parse a raw inbound request from JSON text
    ///
    /// # Errors
    ///
    /// Same as [`CanonicalRequest::from_value`], plus `Malformed` for invalid JSON
    pub fn from_json(raw: &str) -> Result<Self, ConversionError> {
        let value = serde_json::from_str(raw).map_err(|e| ConversionError::malformed("request", e))?;
        Self::from_value(value)
    }
}
