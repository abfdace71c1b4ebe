//! Responses API (single-input dialect) wire format types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::JsonMap;

// -- Request types --

/// Responses API request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Bare model name
    pub model: String,
    /// Flattened conversation items
    pub input: Vec<InputItem>,
    /// Maximum tokens to generate, reasoning included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Reasoning configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,
    /// Function tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ResponsesTool>>,
    /// Tool choice configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    /// Allow parallel tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    /// Output text configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextConfig>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// End-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Caller metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Provider-specific parameters forwarded verbatim
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// One item of the flattened input list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    /// Conversation message
    Message {
        /// Author role
        role: String,
        /// Content parts
        content: Vec<InputContent>,
    },
    /// Function call previously made by the assistant
    FunctionCall {
        /// Call identifier
        call_id: String,
        /// Function name
        name: String,
        /// JSON-encoded arguments
        arguments: String,
    },
    /// Result of a previous function call
    FunctionCallOutput {
        /// Call identifier this output answers
        call_id: String,
        /// Tool output
        output: String,
    },
}

/// Content part within an input message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputContent {
    /// Text written by the user, system or developer
    InputText {
        /// The text string
        text: String,
    },
    /// Text previously produced by the assistant
    OutputText {
        /// The text string
        text: String,
    },
    /// Image reference
    InputImage {
        /// Image URL or base64 data URI
        image_url: String,
        /// Detail level
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

/// Reasoning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Reasoning effort level
    pub effort: String,
}

/// Output text configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    /// Structured output format
    pub format: Value,
}

/// Flat function tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesTool {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Strict schema adherence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

// -- Response types --

/// Responses API response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesResponse {
    /// Response identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Model used
    #[serde(default)]
    pub model: Option<String>,
    /// Lifecycle status (completed, incomplete, failed, ...)
    #[serde(default)]
    pub status: Option<String>,
    /// Output items
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<ResponsesUsage>,
    /// Why the response is incomplete
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    /// Remaining top-level fields
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Output item within a response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Assistant message
    Message {
        /// Content parts
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    /// Function call requested by the model
    FunctionCall {
        /// Item identifier
        #[serde(default)]
        id: Option<String>,
        /// Call identifier
        #[serde(default)]
        call_id: Option<String>,
        /// Function name
        #[serde(default)]
        name: Option<String>,
        /// JSON-encoded arguments
        #[serde(default)]
        arguments: String,
    },
    /// Reasoning trace
    Reasoning {
        /// Summary parts
        #[serde(default)]
        summary: Vec<ReasoningSummary>,
    },
    /// Any item type not modelled above
    #[serde(other)]
    Other,
}

/// Content part within an output message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    /// Generated text
    OutputText {
        /// The text string
        text: String,
    },
    /// Model refusal
    Refusal {
        /// Refusal explanation
        refusal: String,
    },
    /// Any part type not modelled above
    #[serde(other)]
    Other,
}

/// Reasoning summary part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningSummary {
    /// Summary text
    #[serde(default)]
    pub text: String,
}

/// Token usage in a Responses API response
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResponsesUsage {
    /// Prompt tokens
    #[serde(default)]
    pub input_tokens: u32,
    /// Generated tokens
    #[serde(default)]
    pub output_tokens: u32,
    /// Total tokens
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Reason a response stopped early
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncompleteDetails {
    /// `max_output_tokens`, `content_filter`, ...
    #[serde(default)]
    pub reason: Option<String>,
}

// -- Stream types --

/// Responses API stream event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponsesStreamEvent {
    /// Response object created
    #[serde(rename = "response.created")]
    Created,
    /// Response is being generated
    #[serde(rename = "response.in_progress")]
    InProgress,
    /// New output item started
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        /// Position in the output list
        output_index: u32,
        /// The item as first announced
        item: StreamOutputItem,
    },
    /// Output item finished
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        /// Position in the output list
        output_index: u32,
    },
    /// Content part started
    #[serde(rename = "response.content_part.added")]
    ContentPartAdded,
    /// Content part finished
    #[serde(rename = "response.content_part.done")]
    ContentPartDone,
    /// Text fragment
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        /// Text fragment
        delta: String,
        /// Token log probabilities
        #[serde(default)]
        logprobs: Option<Value>,
    },
    /// Text part finished
    #[serde(rename = "response.output_text.done")]
    OutputTextDone,
    /// Citation or other annotation attached to the text
    #[serde(rename = "response.output_text.annotation.added")]
    OutputTextAnnotationAdded {
        /// The annotation
        annotation: Value,
    },
    /// Refusal fragment
    #[serde(rename = "response.refusal.delta")]
    RefusalDelta {
        /// Refusal fragment
        delta: String,
    },
    /// Function argument fragment
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        /// Position in the output list
        output_index: u32,
        /// Item identifier
        #[serde(default)]
        item_id: Option<String>,
        /// Argument fragment
        delta: String,
    },
    /// Function arguments finished
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone,
    /// Reasoning summary fragment
    #[serde(rename = "response.reasoning_summary_text.delta")]
    ReasoningSummaryTextDelta {
        /// Summary fragment
        delta: String,
    },
    /// Reasoning summary part started
    #[serde(rename = "response.reasoning_summary_part.added")]
    ReasoningSummaryPartAdded,
    /// Reasoning summary part finished
    #[serde(rename = "response.reasoning_summary_part.done")]
    ReasoningSummaryPartDone,
    /// Reasoning summary text finished
    #[serde(rename = "response.reasoning_summary_text.done")]
    ReasoningSummaryTextDone,
    /// Response finished normally
    #[serde(rename = "response.completed")]
    Completed {
        /// Final response object
        response: StreamResponseSummary,
    },
    /// Response stopped early
    #[serde(rename = "response.incomplete")]
    Incomplete {
        /// Final response object
        response: StreamResponseSummary,
    },
    /// Response failed upstream
    #[serde(rename = "response.failed")]
    Failed {
        /// Final response object
        response: StreamResponseSummary,
    },
    /// Stream-level error
    #[serde(rename = "error")]
    Error {
        /// Error code
        #[serde(default)]
        code: Option<String>,
        /// Error message
        #[serde(default)]
        message: Option<String>,
    },
}

/// Output item as announced in `response.output_item.added`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOutputItem {
    /// Item type
    #[serde(rename = "type")]
    pub item_type: String,
    /// Item identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Call identifier, for function calls
    #[serde(default)]
    pub call_id: Option<String>,
    /// Function name, for function calls
    #[serde(default)]
    pub name: Option<String>,
    /// Initial arguments, usually empty
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Final response object carried by terminal stream events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamResponseSummary {
    /// Lifecycle status
    #[serde(default)]
    pub status: Option<String>,
    /// Output items, used to tell whether any function was called
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<ResponsesUsage>,
    /// Why the response is incomplete
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    /// Upstream error payload
    #[serde(default)]
    pub error: Option<Value>,
}
