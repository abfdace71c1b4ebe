//! Conversion between canonical types and the Responses (single-input) wire format

use serde_json::{Value, json};

use super::chat::tool_choice_to_value;
use crate::error::ConversionError;
use crate::protocol::responses::{
    IncompleteDetails, InputContent, InputItem, OutputContent, OutputItem, ReasoningConfig, ResponsesRequest,
    ResponsesResponse, ResponsesTool, ResponsesUsage, TextConfig,
};
use crate::types::{
    CanonicalRequest, CanonicalResponse, Choice, ChoiceMessage, Content, ContentPart, FunctionDefinition, JsonMap,
    Message, Role, ToolCall, ToolChoice, Usage,
};

// -- Outbound: canonical request -> Responses wire request --

impl TryFrom<&CanonicalRequest> for ResponsesRequest {
    type Error = ConversionError;

    fn try_from(req: &CanonicalRequest) -> Result<Self, Self::Error> {
        let params = &req.params;

        let mut input = Vec::with_capacity(req.messages.len());
        for (position, message) in req.messages.iter().enumerate() {
            push_input_items(&mut input, message, position)?;
        }

        let dropped = dropped_params(req);
        if !dropped.is_empty() {
            tracing::debug!(
                model = %req.model,
                dropped = ?dropped,
                "dropping parameters the single-input dialect does not accept"
            );
        }

        let tools = params
            .tools
            .iter()
            .flatten()
            .map(|tool| &tool.function)
            .chain(params.functions.iter().flatten())
            .map(Into::into)
            .collect::<Vec<ResponsesTool>>();

        Ok(Self {
            model: req.model.clone(),
            input,
            max_output_tokens: params.token_budget(),
            reasoning: params
                .reasoning_effort
                .as_ref()
                .map(|effort| ReasoningConfig { effort: effort.clone() }),
            tools: if tools.is_empty() { None } else { Some(tools) },
            tool_choice: params.tool_choice.as_ref().map(flat_tool_choice),
            parallel_tool_calls: params.parallel_tool_calls,
            text: params.response_format.as_ref().map(|format| TextConfig {
                format: flat_response_format(format),
            }),
            top_p: params.top_p,
            user: params.user.clone(),
            metadata: params.metadata.clone(),
            stream: params.stream,
            extra: params.extra.clone(),
        })
    }
}

fn push_input_items(input: &mut Vec<InputItem>, message: &Message, position: usize) -> Result<(), ConversionError> {
    let context = || format!("messages[{position}]");

    match message.role {
        Role::Tool => {
            let call_id = message
                .tool_call_id
                .clone()
                .ok_or_else(|| ConversionError::missing("tool_call_id", context()))?;
            input.push(InputItem::FunctionCallOutput {
                call_id,
                output: message.text_content().unwrap_or_default(),
            });
        }
        Role::Function => {
            let name = message
                .name
                .clone()
                .ok_or_else(|| ConversionError::missing("name", context()))?;
            input.push(InputItem::FunctionCallOutput {
                call_id: name,
                output: message.text_content().unwrap_or_default(),
            });
        }
        Role::Assistant => {
            let content = message_content(message, true);
            if !content.is_empty() {
                input.push(InputItem::Message {
                    role: Role::Assistant.to_string(),
                    content,
                });
            }

            for (call_position, call) in message.tool_calls.iter().flatten().enumerate() {
                let call_context = || format!("messages[{position}].tool_calls[{call_position}]");
                let call_id = call
                    .id
                    .clone()
                    .ok_or_else(|| ConversionError::missing("id", call_context()))?;
                let name = call
                    .function
                    .name
                    .clone()
                    .ok_or_else(|| ConversionError::missing("function.name", call_context()))?;
                input.push(InputItem::FunctionCall {
                    call_id,
                    name,
                    arguments: call.function.arguments.clone(),
                });
            }

            if let Some(function_call) = &message.function_call {
                let name = function_call
                    .name
                    .clone()
                    .ok_or_else(|| ConversionError::missing("function_call.name", context()))?;
                input.push(InputItem::FunctionCall {
                    call_id: name.clone(),
                    name,
                    arguments: function_call.arguments.clone(),
                });
            }
        }
        Role::System | Role::Developer | Role::User => {
            let content = message_content(message, false);
            if !content.is_empty() {
                input.push(InputItem::Message {
                    role: message.role.to_string(),
                    content,
                });
            }
        }
    }

    Ok(())
}

fn message_content(message: &Message, from_assistant: bool) -> Vec<InputContent> {
    let text_part = |text: &str| {
        if from_assistant {
            InputContent::OutputText { text: text.to_owned() }
        } else {
            InputContent::InputText { text: text.to_owned() }
        }
    };

    match &message.content {
        None => Vec::new(),
        Some(Content::Text(text)) if text.is_empty() => Vec::new(),
        Some(Content::Text(text)) => vec![text_part(text)],
        Some(Content::Parts(parts)) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => text_part(text),
                ContentPart::ImageUrl { image_url } => InputContent::InputImage {
                    image_url: image_url.url.clone(),
                    detail: image_url.detail.clone(),
                },
            })
            .collect(),
    }
}

fn dropped_params(req: &CanonicalRequest) -> Vec<&'static str> {
    let params = &req.params;
    [
        ("temperature", params.temperature.is_some()),
        ("presence_penalty", params.presence_penalty.is_some()),
        ("frequency_penalty", params.frequency_penalty.is_some()),
        ("seed", params.seed.is_some()),
        ("stop", params.stop.is_some()),
        ("n", params.n.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect()
}

impl From<&FunctionDefinition> for ResponsesTool {
    fn from(function: &FunctionDefinition) -> Self {
        Self {
            tool_type: "function".to_owned(),
            name: function.name.clone(),
            description: function.description.clone(),
            parameters: function.parameters.clone(),
            strict: function.strict,
        }
    }
}

/// Forced function choices name the function at the top level
fn flat_tool_choice(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Function(function) => json!({"type": "function", "name": function.function.name}),
        other => tool_choice_to_value(other),
    }
}

/// Chat `json_schema` formats nest the schema one level deeper
fn flat_response_format(format: &Value) -> Value {
    let Some(object) = format.as_object() else {
        return format.clone();
    };

    match object.get("json_schema").and_then(Value::as_object) {
        Some(schema) if object.get("type").and_then(Value::as_str) == Some("json_schema") => {
            let mut flat = JsonMap::new();
            flat.insert("type".to_owned(), Value::String("json_schema".to_owned()));
            flat.extend(schema.iter().map(|(key, value)| (key.clone(), value.clone())));
            Value::Object(flat)
        }
        _ => format.clone(),
    }
}

// -- Inbound: Responses wire response -> canonical response --

impl TryFrom<ResponsesResponse> for CanonicalResponse {
    type Error = ConversionError;

    fn try_from(resp: ResponsesResponse) -> Result<Self, Self::Error> {
        let id = resp.id.ok_or_else(|| ConversionError::missing("id", "responses response"))?;

        let mut text = String::new();
        let mut refusal = String::new();
        let mut reasoning_summary = Vec::new();
        let mut tool_calls = Vec::new();

        for item in resp.output {
            match item {
                OutputItem::Message { content } => {
                    for part in content {
                        match part {
                            OutputContent::OutputText { text: fragment } => text.push_str(&fragment),
                            OutputContent::Refusal { refusal: fragment } => refusal.push_str(&fragment),
                            OutputContent::Other => {}
                        }
                    }
                }
                OutputItem::FunctionCall {
                    id,
                    call_id,
                    name,
                    arguments,
                } => {
                    let index = u32::try_from(tool_calls.len()).unwrap_or(u32::MAX);
                    let mut call = ToolCall::fragment(index, arguments);
                    call.id = call_id.or(id);
                    call.function.name = name;
                    tool_calls.push(call);
                }
                OutputItem::Reasoning { summary } => {
                    reasoning_summary.extend(summary.into_iter().map(|part| part.text));
                }
                OutputItem::Other => {}
            }
        }

        let finish_reason = finish_reason(
            resp.status.as_deref(),
            resp.incomplete_details.as_ref(),
            !tool_calls.is_empty(),
        );

        let mut provider_specific_fields = JsonMap::new();
        if !reasoning_summary.is_empty() {
            provider_specific_fields.insert(
                "reasoning_summary".to_owned(),
                Value::String(reasoning_summary.join("\n")),
            );
        }
        if !refusal.is_empty() {
            provider_specific_fields.insert("refusal".to_owned(), Value::String(refusal));
        }

        Ok(Self {
            id,
            model: resp.model.unwrap_or_default(),
            choices: vec![Choice {
                index: 0,
                message: ChoiceMessage::assistant(text, tool_calls),
                finish_reason,
            }],
            usage: resp.usage.map(Into::into),
            provider_specific_fields,
        })
    }
}

impl From<ResponsesUsage> for Usage {
    fn from(usage: ResponsesUsage) -> Self {
        let mut converted = Self::new(usage.input_tokens, usage.output_tokens);
        if let Some(total) = usage.total_tokens {
            converted.total_tokens = total;
        }
        converted
    }
}

/// Map a response status onto the chat finish-reason vocabulary
pub(crate) fn finish_reason(
    status: Option<&str>,
    incomplete: Option<&IncompleteDetails>,
    has_function_calls: bool,
) -> Option<String> {
    if has_function_calls && status != Some("incomplete") {
        return Some("tool_calls".to_owned());
    }

    let reason = match status? {
        "completed" => "stop",
        "incomplete" => match incomplete.and_then(|details| details.reason.as_deref()) {
            Some("content_filter") => "content_filter",
            _ => "length",
        },
        "failed" | "cancelled" => "error",
        _ => return None,
    };

    Some(reason.to_owned())
}
