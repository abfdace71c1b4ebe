//! Upstream calls
//!
//! The pipeline only needs a JSON body back, tagged with its wire shape;
//! how it is fetched is up to the [`Transport`] implementation.

mod http;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde_json::Value;

pub use self::http::HttpTransport;
use crate::adapter::DialectPayload;
use crate::routing::{Dialect, ModelRoute};
use crate::stream::EventShape;
use crate::translate::ResponseShape;

/// Complete upstream response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub shape: ResponseShape,
    pub body: Value,
}

/// Streamed upstream events, one JSON value per event
///
/// Event data that is not JSON is passed through as a string value.
pub struct UpstreamStream {
    pub shape: EventShape,
    pub events: Pin<Box<dyn Stream<Item = anyhow::Result<Value>> + Send>>,
}

impl std::fmt::Debug for UpstreamStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamStream")
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Sends adapted payloads to providers
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for the complete response
    async fn send(&self, route: &ModelRoute, payload: &DialectPayload) -> anyhow::Result<UpstreamResponse>;

    /// Send a request and return its event stream
    async fn send_stream(&self, route: &ModelRoute, payload: &DialectPayload) -> anyhow::Result<UpstreamStream>;
}

/// Shapes spoken by OpenAI-compatible endpoints for a dialect
pub const fn shapes_for(dialect: Dialect) -> (ResponseShape, EventShape) {
    match dialect {
        Dialect::Chat => (ResponseShape::Chat, EventShape::Chat),
        Dialect::SingleInput => (ResponseShape::Responses, EventShape::Responses),
    }
}
