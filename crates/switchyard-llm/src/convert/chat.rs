//! Conversion between canonical types and the chat-completions wire format

use serde_json::{Value, json};

use crate::error::ConversionError;
use crate::protocol::chat::{
    ChatChoice, ChatContent, ChatContentPart, ChatFunction, ChatFunctionCall, ChatImageUrl, ChatMessage, ChatRequest,
    ChatResponse, ChatTool, ChatToolCall, ChatUsage,
};
use crate::types::{
    CanonicalRequest, CanonicalResponse, Choice, ChoiceMessage, Content, ContentPart, FunctionCall,
    FunctionDefinition, Message, StopSequences, ToolCall, ToolCallFunction, ToolChoice, ToolDefinition, Usage,
};

/// Chat response fields that carry no information once translated
const CONSUMED_RESPONSE_FIELDS: &[&str] = &["object", "created"];

// -- Outbound: canonical request -> chat wire request --

impl From<&CanonicalRequest> for ChatRequest {
    fn from(req: &CanonicalRequest) -> Self {
        let params = &req.params;

        Self {
            model: req.model.clone(),
            messages: req.messages.iter().map(Into::into).collect(),
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            max_completion_tokens: params.max_completion_tokens,
            stop: params.stop.as_ref().map(stop_to_value),
            presence_penalty: params.presence_penalty,
            frequency_penalty: params.frequency_penalty,
            seed: params.seed,
            n: params.n,
            tools: params.tools.as_ref().map(|tools| tools.iter().map(Into::into).collect()),
            functions: params
                .functions
                .as_ref()
                .map(|functions| functions.iter().map(Into::into).collect()),
            tool_choice: params.tool_choice.as_ref().map(tool_choice_to_value),
            parallel_tool_calls: params.parallel_tool_calls,
            response_format: params.response_format.clone(),
            reasoning_effort: params.reasoning_effort.clone(),
            user: params.user.clone(),
            metadata: params.metadata.clone(),
            stream: params.stream,
            extra: params.extra.clone(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.as_ref().map(Into::into),
            name: msg.name.clone(),
            tool_calls: msg
                .tool_calls
                .as_ref()
                .map(|calls| calls.iter().map(Into::into).collect()),
            tool_call_id: msg.tool_call_id.clone(),
            function_call: msg.function_call.clone().map(Into::into),
            extra: msg.extra.clone(),
        }
    }
}

impl From<&Content> for ChatContent {
    fn from(content: &Content) -> Self {
        match content {
            Content::Text(text) => Self::Text(text.clone()),
            Content::Parts(parts) => Self::Parts(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => ChatContentPart::Text { text: text.clone() },
                        ContentPart::ImageUrl { image_url } => ChatContentPart::ImageUrl {
                            image_url: ChatImageUrl {
                                url: image_url.url.clone(),
                                detail: image_url.detail.clone(),
                            },
                        },
                    })
                    .collect(),
            ),
        }
    }
}

/// Request-side tool calls drop the stream correlation index
impl From<&ToolCall> for ChatToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            index: None,
            id: call.id.clone(),
            tool_type: Some(call.call_type.clone()),
            function: ChatFunctionCall {
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            },
        }
    }
}

impl From<&ToolDefinition> for ChatTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: tool.tool_type.clone(),
            function: (&tool.function).into(),
            extra: tool.extra.clone(),
        }
    }
}

impl From<&FunctionDefinition> for ChatFunction {
    fn from(function: &FunctionDefinition) -> Self {
        Self {
            name: function.name.clone(),
            description: function.description.clone(),
            parameters: function.parameters.clone(),
            strict: function.strict,
        }
    }
}

fn stop_to_value(stop: &StopSequences) -> Value {
    match stop {
        StopSequences::One(sequence) => Value::String(sequence.clone()),
        StopSequences::Many(sequences) => Value::Array(sequences.iter().cloned().map(Value::String).collect()),
    }
}

pub(crate) fn tool_choice_to_value(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Mode(mode) => Value::String(mode.clone()),
        ToolChoice::Function(function) => json!({
            "type": function.tool_type,
            "function": {"name": function.function.name},
        }),
        ToolChoice::Other(value) => value.clone(),
    }
}

// -- Inbound: chat wire response -> canonical response --

impl TryFrom<ChatResponse> for CanonicalResponse {
    type Error = ConversionError;

    fn try_from(resp: ChatResponse) -> Result<Self, Self::Error> {
        let id = resp
            .id
            .ok_or_else(|| ConversionError::missing("id", "chat completion response"))?;

        let mut provider_specific_fields = resp.extra;
        for field in CONSUMED_RESPONSE_FIELDS {
            provider_specific_fields.remove(*field);
        }

        Ok(Self {
            id,
            model: resp.model.unwrap_or_default(),
            choices: resp.choices.into_iter().map(Into::into).collect(),
            usage: resp.usage.map(Into::into),
            provider_specific_fields,
        })
    }
}

impl From<ChatChoice> for Choice {
    fn from(choice: ChatChoice) -> Self {
        let message = choice.message;

        // A legacy function call becomes the only tool call
        let tool_calls = match (message.tool_calls, message.function_call) {
            (Some(calls), _) => Some(
                calls
                    .into_iter()
                    .zip(0..)
                    .map(|(call, position)| tool_call_from_wire(call, position))
                    .collect(),
            ),
            (None, Some(function_call)) => Some(vec![legacy_function_call(function_call)]),
            (None, None) => None,
        };

        Self {
            index: choice.index,
            message: ChoiceMessage {
                role: message.role.unwrap_or_else(|| "assistant".to_owned()),
                content: message.content,
                tool_calls,
            },
            finish_reason: choice.finish_reason,
        }
    }
}

impl From<ChatUsage> for Usage {
    fn from(usage: ChatUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Wire tool call to canonical, using `position` when no index was sent
pub(crate) fn tool_call_from_wire(call: ChatToolCall, position: u32) -> ToolCall {
    ToolCall {
        index: call.index.unwrap_or(position),
        id: call.id,
        call_type: call.tool_type.unwrap_or_else(crate::types::tool::default_tool_type),
        function: ToolCallFunction {
            name: call.function.name,
            arguments: call.function.arguments,
        },
    }
}

/// Legacy `function_call` wrapped as a tool call at index 0
pub(crate) fn legacy_function_call(call: ChatFunctionCall) -> ToolCall {
    ToolCall {
        index: 0,
        id: None,
        call_type: crate::types::tool::default_tool_type(),
        function: ToolCallFunction {
            name: call.name,
            arguments: call.arguments,
        },
    }
}

impl From<FunctionCall> for ChatFunctionCall {
    fn from(call: FunctionCall) -> Self {
        Self {
            name: call.name,
            arguments: call.arguments,
        }
    }
}
