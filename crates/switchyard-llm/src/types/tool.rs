use serde::{Deserialize, Serialize};

use super::JsonMap;

/// Definition of a tool the model can call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool type (normally "function")
    #[serde(rename = "type", default = "default_tool_type")]
    pub tool_type: String,
    /// Function specification
    pub function: FunctionDefinition,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Specification of a callable function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the function parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
    /// Strict schema adherence flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// How the model should select tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// Simple mode such as "none", "auto" or "required"
    Mode(String),
    /// Force a specific function
    Function(ToolChoiceFunction),
    /// Any other provider-specific form, forwarded as-is
    Other(serde_json::Value),
}

/// Force the model to call a specific function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoiceFunction {
    /// Normally "function"
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function to call
    pub function: ToolChoiceFunctionName,
}

/// Function name reference within a forced tool choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoiceFunctionName {
    /// Name of the function to call
    pub name: String,
}

/// A tool call, complete or partial
///
/// The same shape carries assistant tool calls in requests, tool calls in
/// responses, and incremental deltas in streams. `index` correlates the
/// fragments of one call across stream chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Position of this call within its message or stream
    #[serde(default)]
    pub index: u32,
    /// Provider-assigned call identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Call type (normally "function")
    #[serde(rename = "type", default = "default_tool_type")]
    pub call_type: String,
    /// Function name and arguments
    #[serde(default, deserialize_with = "crate::protocol::null_as_default")]
    pub function: ToolCallFunction,
}

impl ToolCall {
    /// Build a complete function call
    pub fn function(index: u32, id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            index,
            id: Some(id.into()),
            call_type: default_tool_type(),
            function: ToolCallFunction {
                name: Some(name.into()),
                arguments: arguments.into(),
            },
        }
    }

    /// Build an argument fragment for an already announced call
    pub fn fragment(index: u32, arguments: impl Into<String>) -> Self {
        Self {
            index,
            id: None,
            call_type: default_tool_type(),
            function: ToolCallFunction {
                name: None,
                arguments: arguments.into(),
            },
        }
    }
}

/// Function portion of a tool call
///
/// `arguments` is always the raw string the provider produced, never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Function name (absent on continuation fragments)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// JSON-encoded arguments or a fragment of them
    #[serde(default, deserialize_with = "crate::protocol::null_as_default")]
    pub arguments: String,
}

pub(crate) fn default_tool_type() -> String {
    "function".to_owned()
}
