//! Canonical, dialect-independent types
//!
//! Every wire format converts to and from these. Each canonical entity has
//! an explicit schema plus one flattened bag for fields it does not model,
//! so unknown provider fields survive a round trip.

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{Content, ContentPart, FunctionCall, ImageUrl, Message, Role};
pub use request::{CanonicalRequest, RequestParams, StopSequences};
pub use response::{CanonicalResponse, Choice, ChoiceMessage, Usage};
pub use stream::StreamingChunk;
pub use tool::{FunctionDefinition, ToolCall, ToolCallFunction, ToolChoice, ToolChoiceFunction, ToolDefinition};

/// Arbitrary JSON object, used for unknown-field bags
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
