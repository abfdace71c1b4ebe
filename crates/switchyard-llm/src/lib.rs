//! Model routing and request/response translation core for Switchyard
//!
//! Resolves model aliases to provider targets, adapts canonical chat
//! requests to the chat-completions or single-input (Responses) dialect,
//! and normalizes complete and streamed upstream responses back into one
//! canonical shape.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod adapter;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod routing;
pub mod stream;
pub mod trace;
pub mod translate;
pub mod transport;
pub mod types;

pub use adapter::{AdaptedRequest, DialectPayload, RequestAdapter};
pub use diagnostics::{DiagnosticSink, TracingDiagnostics};
pub use error::{ConversionError, LlmError, NormalizationWarning, RoutingError, TransportError};
pub use pipeline::{ChunkStream, Pipeline, RoutedRequest};
pub use routing::{Dialect, ModelRoute, ModelRouter, Provider};
pub use stream::{EventShape, StreamNormalizer, ToolCallAccumulator};
pub use trace::{MarkdownTraceSink, TraceSink};
pub use translate::{ResponseShape, translate_response};
pub use transport::{HttpTransport, Transport, UpstreamResponse, UpstreamStream};
pub use types::{CanonicalRequest, CanonicalResponse, Message, RequestParams, StreamingChunk, ToolCall};
