//! Non-streaming response translation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::error::ConversionError;
use crate::protocol::anthropic::AnthropicResponse;
use crate::protocol::chat::ChatResponse;
use crate::protocol::responses::ResponsesResponse;
use crate::types::CanonicalResponse;

/// Wire shape of a complete upstream response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseShape {
    /// Chat-completions response object
    Chat,
    /// Responses API response object
    Responses,
    /// Anthropic Messages response object
    Anthropic,
}

/// Translate a complete upstream response body into canonical form
///
/// # Errors
///
/// Returns `ConversionError::Malformed` when the body does not parse as the
/// given shape and `ConversionError::MissingField` when `id` is absent
pub fn translate_response(shape: ResponseShape, body: &Value) -> Result<CanonicalResponse, ConversionError> {
    let context = || format!("{shape} response");

    match shape {
        ResponseShape::Chat => {
            let wire = ChatResponse::deserialize(body).map_err(|e| ConversionError::malformed(context(), e))?;
            CanonicalResponse::try_from(wire)
        }
        ResponseShape::Responses => {
            let wire = ResponsesResponse::deserialize(body).map_err(|e| ConversionError::malformed(context(), e))?;
            CanonicalResponse::try_from(wire)
        }
        ResponseShape::Anthropic => {
            let wire = AnthropicResponse::deserialize(body).map_err(|e| ConversionError::malformed(context(), e))?;
            CanonicalResponse::try_from(wire)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::protocol::chat::ChatRequest;
    use crate::types::{CanonicalRequest, Message, Role};

    /// Echo a chat request back as the upstream would, choosing the last
    /// user message as the answer
    fn echo(request: &ChatRequest) -> Value {
        let answer = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .and_then(|m| serde_json::to_value(&m.content).ok())
            .unwrap_or(Value::Null);

        json!({
            "id": "chatcmpl-echo",
            "object": "chat.completion",
            "model": request.model,
            "choices": [{"index": 0, "message": {"role": "assistant", "content": answer}, "finish_reason": "stop"}]
        })
    }

    #[test]
    fn echo_round_trip_preserves_text() {
        let request = CanonicalRequest::new(
            "gpt-4o",
            vec![
                Message::text(Role::System, "repeat after me"),
                Message::text(Role::User, "the quick brown fox"),
            ],
        );

        let body = echo(&ChatRequest::from(&request));
        let response = translate_response(ResponseShape::Chat, &body).unwrap();

        assert_eq!(response.first_text(), Some("the quick brown fox"));
        assert_eq!(response.model, "gpt-4o");
        assert!(response.provider_specific_fields.is_empty());
    }

    #[test]
    fn every_shape_is_dispatched() {
        let responses = translate_response(
            ResponseShape::Responses,
            &json!({
                "id": "resp_1",
                "status": "incomplete",
                "incomplete_details": {"reason": "max_output_tokens"},
                "output": [{"type": "message", "content": [{"type": "output_text", "text": "partial"}]}]
            }),
        )
        .unwrap();
        assert_eq!(responses.first_text(), Some("partial"));
        assert_eq!(responses.choices[0].finish_reason.as_deref(), Some("length"));

        let anthropic = translate_response(
            ResponseShape::Anthropic,
            &json!({"id": "msg_1", "content": [{"type": "text", "text": "hi"}], "stop_reason": "max_tokens"}),
        )
        .unwrap();
        assert_eq!(anthropic.first_text(), Some("hi"));
        assert_eq!(anthropic.choices[0].finish_reason.as_deref(), Some("length"));
    }

    #[test]
    fn unparseable_body_is_malformed() {
        let err = translate_response(ResponseShape::Chat, &json!({"id": "x", "choices": "nope"})).unwrap_err();
        assert!(matches!(err, ConversionError::Malformed { ref context, .. } if context == "chat response"));
    }

    #[test]
    fn missing_id_is_reported_for_each_shape() {
        for shape in [ResponseShape::Chat, ResponseShape::Responses, ResponseShape::Anthropic] {
            let err = translate_response(shape, &json!({})).unwrap_err();
            assert!(
                matches!(err, ConversionError::MissingField { field: "id", .. }),
                "{shape} should require id"
            );
        }
    }

    #[test]
    fn shape_parses_from_snake_case() {
        assert_eq!("responses".parse::<ResponseShape>().unwrap(), ResponseShape::Responses);
        assert_eq!(ResponseShape::Anthropic.as_ref(), "anthropic");
    }
}
