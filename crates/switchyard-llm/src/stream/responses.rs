//! Responses API event decoding

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Value, json};

use super::{EventAdapter, insert_rare_field};
use crate::convert::responses::finish_reason;
use crate::protocol::responses::{OutputItem, ResponsesStreamEvent, StreamResponseSummary};
use crate::types::{StreamingChunk, ToolCall, ToolCallFunction};

/// Decodes typed `response.*` events
#[derive(Debug, Default)]
pub struct ResponsesEventAdapter {
    /// Tool ordinal per output index
    by_output: HashMap<u32, u32>,
    /// Tool ordinal per item id
    by_item: HashMap<String, u32>,
    next_tool: u32,
}

impl ResponsesEventAdapter {
    fn assign(&mut self, output_index: u32, item_id: Option<&str>) -> u32 {
        let ordinal = self.next_tool;
        self.next_tool += 1;
        self.by_output.insert(output_index, ordinal);
        if let Some(id) = item_id {
            self.by_item.insert(id.to_owned(), ordinal);
        }
        ordinal
    }

    fn ordinal(&mut self, output_index: u32, item_id: Option<&str>) -> u32 {
        let known = item_id
            .and_then(|id| self.by_item.get(id))
            .or_else(|| self.by_output.get(&output_index))
            .copied();
        known.unwrap_or_else(|| self.assign(output_index, item_id))
    }

    fn finish(&self, chunk: &mut StreamingChunk, response: StreamResponseSummary) {
        let called_function = self.next_tool > 0
            || response
                .output
                .iter()
                .any(|item| matches!(item, OutputItem::FunctionCall { .. }));

        chunk.is_finished = true;
        chunk.finish_reason = finish_reason(
            response.status.as_deref(),
            response.incomplete_details.as_ref(),
            called_function,
        )
        .unwrap_or_default();
        chunk.usage = response.usage.map(Into::into);
        insert_rare_field(chunk, "error", response.error);
    }
}

impl EventAdapter for ResponsesEventAdapter {
    fn adapt(&mut self, event: &Value) -> Result<StreamingChunk, serde_json::Error> {
        let event = ResponsesStreamEvent::deserialize(event)?;
        let mut chunk = StreamingChunk::default();

        match event {
            ResponsesStreamEvent::OutputItemAdded { output_index, item } if item.item_type == "function_call" => {
                let ordinal = self.ordinal(output_index, item.id.as_deref());
                chunk.tool_use = Some(vec![ToolCall {
                    id: item.call_id.or(item.id),
                    function: ToolCallFunction {
                        name: item.name,
                        arguments: item.arguments.unwrap_or_default(),
                    },
                    ..ToolCall::fragment(ordinal, "")
                }]);
            }

            ResponsesStreamEvent::FunctionCallArgumentsDelta {
                output_index,
                item_id,
                delta,
            } => {
                let ordinal = self.ordinal(output_index, item_id.as_deref());
                chunk.tool_use = Some(vec![ToolCall::fragment(ordinal, delta)]);
            }

            ResponsesStreamEvent::OutputTextDelta { delta, logprobs } => {
                chunk.text = delta;
                insert_rare_field(&mut chunk, "logprobs", logprobs);
            }

            ResponsesStreamEvent::OutputTextAnnotationAdded { annotation } => {
                chunk.insert_provider_field("annotation", annotation);
            }

            ResponsesStreamEvent::RefusalDelta { delta } => {
                chunk.insert_provider_field("refusal", Value::String(delta));
            }

            ResponsesStreamEvent::ReasoningSummaryTextDelta { delta } => {
                chunk.insert_provider_field("reasoning_summary", Value::String(delta));
            }

            ResponsesStreamEvent::Completed { response }
            | ResponsesStreamEvent::Incomplete { response }
            | ResponsesStreamEvent::Failed { response } => self.finish(&mut chunk, response),

            ResponsesStreamEvent::Error { code, message } => {
                chunk.insert_provider_field("error", json!({"code": code, "message": message}));
            }

            ResponsesStreamEvent::Created
            | ResponsesStreamEvent::InProgress
            | ResponsesStreamEvent::OutputItemAdded { .. }
            | ResponsesStreamEvent::OutputItemDone { .. }
            | ResponsesStreamEvent::ContentPartAdded
            | ResponsesStreamEvent::ContentPartDone
            | ResponsesStreamEvent::OutputTextDone
            | ResponsesStreamEvent::FunctionCallArgumentsDone
            | ResponsesStreamEvent::ReasoningSummaryPartAdded
            | ResponsesStreamEvent::ReasoningSummaryPartDone
            | ResponsesStreamEvent::ReasoningSummaryTextDone => {}
        }

        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Usage;

    fn run(events: &[Value]) -> Vec<StreamingChunk> {
        let mut adapter = ResponsesEventAdapter::default();
        events.iter().map(|event| adapter.adapt(event).unwrap()).collect()
    }

    #[test]
    fn text_stream_finishes_with_stop() {
        let chunks = run(&[
            json!({"type": "response.created", "response": {"id": "resp_1", "status": "in_progress"}}),
            json!({"type": "response.output_text.delta", "item_id": "msg_1", "output_index": 0, "content_index": 0, "delta": "Hi"}),
            json!({"type": "response.output_text.done", "item_id": "msg_1", "text": "Hi"}),
            json!({"type": "response.completed", "response": {
                "id": "resp_1",
                "status": "completed",
                "output": [{"type": "message", "content": [{"type": "output_text", "text": "Hi"}]}],
                "usage": {"input_tokens": 5, "output_tokens": 1, "total_tokens": 6}
            }}),
        ]);

        assert!(chunks[0].is_empty());
        assert_eq!(chunks[1].text, "Hi");
        assert!(chunks[2].is_empty());
        assert!(chunks[3].is_finished);
        assert_eq!(chunks[3].finish_reason, "stop");
        assert_eq!(chunks[3].usage, Some(Usage::new(5, 1)));
    }

    #[test]
    fn function_calls_get_sequential_ordinals() {
        let chunks = run(&[
            json!({"type": "response.output_item.added", "output_index": 0, "item": {"type": "reasoning", "id": "rs_1"}}),
            json!({"type": "response.output_item.added", "output_index": 1, "item": {
                "type": "function_call", "id": "fc_1", "call_id": "call_1", "name": "ls", "arguments": ""
            }}),
            json!({"type": "response.function_call_arguments.delta", "output_index": 1, "item_id": "fc_1", "delta": "{\"path\":"}),
            json!({"type": "response.output_item.added", "output_index": 2, "item": {
                "type": "function_call", "id": "fc_2", "call_id": "call_2", "name": "cat", "arguments": ""
            }}),
            json!({"type": "response.function_call_arguments.delta", "output_index": 2, "item_id": "fc_2", "delta": "{}"}),
            json!({"type": "response.function_call_arguments.delta", "output_index": 1, "delta": "\".\"}"}),
            json!({"type": "response.completed", "response": {"status": "completed", "output": []}}),
        ]);

        assert!(chunks[0].is_empty());
        assert_eq!(chunks[1].tool_use, Some(vec![ToolCall::function(0, "call_1", "ls", "")]));
        assert_eq!(chunks[2].tool_use, Some(vec![ToolCall::fragment(0, "{\"path\":")]));
        assert_eq!(chunks[3].tool_use, Some(vec![ToolCall::function(1, "call_2", "cat", "")]));
        assert_eq!(chunks[4].tool_use, Some(vec![ToolCall::fragment(1, "{}")]));
        assert_eq!(chunks[5].tool_use, Some(vec![ToolCall::fragment(0, "\".\"}")]));
        assert_eq!(chunks[6].finish_reason, "tool_calls");
    }

    #[test]
    fn early_argument_delta_shares_the_announced_ordinal() {
        let chunks = run(&[
            json!({"type": "response.function_call_arguments.delta", "output_index": 0, "item_id": "fc_1", "delta": "{}"}),
            json!({"type": "response.output_item.added", "output_index": 0, "item": {
                "type": "function_call", "id": "fc_1", "call_id": "call_1", "name": "ls", "arguments": ""
            }}),
            json!({"type": "response.output_item.added", "output_index": 1, "item": {
                "type": "function_call", "id": "fc_2", "call_id": "call_2", "name": "cat", "arguments": ""
            }}),
        ]);

        assert_eq!(chunks[0].tool_use, Some(vec![ToolCall::fragment(0, "{}")]));
        assert_eq!(chunks[1].tool_use, Some(vec![ToolCall::function(0, "call_1", "ls", "")]));
        assert_eq!(chunks[2].tool_use, Some(vec![ToolCall::function(1, "call_2", "cat", "")]));
    }

    #[test]
    fn empty_logprobs_are_not_copied() {
        let chunks = run(&[
            json!({"type": "response.output_text.delta", "item_id": "msg_1", "output_index": 0, "delta": "Hi", "logprobs": []}),
            json!({"type": "response.output_text.delta", "item_id": "msg_1", "output_index": 0, "delta": "!",
                "logprobs": [{"token": "!", "logprob": -0.5}]}),
        ]);

        assert_eq!(chunks[0].text, "Hi");
        assert!(chunks[0].provider_specific_fields.is_none());
        assert_eq!(
            chunks[1].provider_specific_fields.as_ref().unwrap()["logprobs"],
            json!([{"token": "!", "logprob": -0.5}])
        );
    }

    #[test]
    fn incomplete_maps_to_length() {
        let chunks = run(&[json!({"type": "response.incomplete", "response": {
            "status": "incomplete",
            "incomplete_details": {"reason": "max_output_tokens"}
        }})]);

        assert!(chunks[0].is_finished);
        assert_eq!(chunks[0].finish_reason, "length");
    }

    #[test]
    fn rare_events_go_to_provider_fields() {
        let chunks = run(&[
            json!({"type": "response.reasoning_summary_text.delta", "item_id": "rs_1", "delta": "Considering"}),
            json!({"type": "response.refusal.delta", "delta": "I can't"}),
            json!({"type": "error", "code": "rate_limit_exceeded", "message": "slow down"}),
        ]);

        assert_eq!(
            chunks[0].provider_specific_fields.as_ref().unwrap()["reasoning_summary"],
            json!("Considering")
        );
        assert_eq!(chunks[1].provider_specific_fields.as_ref().unwrap()["refusal"], json!("I can't"));
        assert_eq!(
            chunks[2].provider_specific_fields.as_ref().unwrap()["error"],
            json!({"code": "rate_limit_exceeded", "message": "slow down"})
        );
        assert!(chunks.iter().all(|chunk| !chunk.is_finished));
    }

    #[test]
    fn unknown_event_type_is_an_error() {
        let mut adapter = ResponsesEventAdapter::default();
        assert!(adapter.adapt(&json!({"type": "response.teleported"})).is_err());
    }
}
