//! End-to-end request handling
//!
//! alias → route → adapted payload → transport → canonical response or
//! canonical chunk stream.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt, stream};
use jiff::Timestamp;

use crate::adapter::{AdaptedRequest, RequestAdapter};
use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::error::{LlmError, TransportError};
use crate::routing::{ModelRoute, ModelRouter};
use crate::stream::StreamNormalizer;
use crate::trace::TraceSink;
use crate::transport::{Transport, UpstreamStream};
use crate::translate::translate_response;
use crate::types::{CanonicalRequest, CanonicalResponse, StreamingChunk};

/// Canonical chunks of one streamed completion
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamingChunk, LlmError>> + Send>>;

/// A request after routing and adaptation, before it is sent
#[derive(Debug, Clone)]
pub struct RoutedRequest {
    /// Names the trace files of this call
    pub timestamp: Timestamp,
    /// Calling method, e.g. `completion` or `astreaming`
    pub method: String,
    /// The request as the caller sent it
    pub original: CanonicalRequest,
    pub adapted: AdaptedRequest,
}

impl RoutedRequest {
    pub const fn route(&self) -> &ModelRoute {
        &self.adapted.route
    }
}

/// Routes, adapts, sends and normalizes requests
pub struct Pipeline {
    router: Arc<ModelRouter>,
    adapter: RequestAdapter,
    transport: Arc<dyn Transport>,
    trace: Option<Arc<dyn TraceSink>>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Pipeline {
    pub fn new(router: Arc<ModelRouter>, adapter: RequestAdapter, transport: Arc<dyn Transport>) -> Self {
        Self {
            router,
            adapter,
            transport,
            trace: None,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Record every request, response and stream through `sink`
    #[must_use]
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    /// Report stream normalization warnings to `sink` instead of the log
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Resolve and adapt a request without sending it
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Routing` when the alias cannot be resolved and
    /// `LlmError::Conversion` when the request cannot be adapted
    pub fn prepare(&self, method: &str, request: CanonicalRequest, stream: bool) -> Result<RoutedRequest, LlmError> {
        let timestamp = Timestamp::now();
        let route = self.router.resolve(&request.model)?;
        let adapted = self.adapter.adapt(&request, &route, stream)?;

        if let Some(trace) = &self.trace
            && let Err(e) = trace.write_request(timestamp, method, &request, &adapted)
        {
            tracing::warn!(error = %e, "failed to write request trace");
        }

        Ok(RoutedRequest {
            timestamp,
            method: method.to_owned(),
            original: request,
            adapted,
        })
    }

    /// Complete a request and translate the response
    ///
    /// # Errors
    ///
    /// Returns any routing, conversion or transport failure
    pub async fn complete(&self, method: &str, request: CanonicalRequest) -> Result<CanonicalResponse, LlmError> {
        let routed = self.prepare(method, request, false)?;
        let route = routed.route();

        let upstream = self
            .transport
            .send(route, &routed.adapted.payload)
            .await
            .map_err(|source| transport_error(route, source))?;
        let response = translate_response(upstream.shape, &upstream.body)?;

        tracing::info!(
            target_model = %route.target_model(),
            response_id = %response.id,
            choices = response.choices.len(),
            "completed request"
        );

        if let Some(trace) = &self.trace
            && let Err(e) = trace.write_response(routed.timestamp, &routed.method, &response)
        {
            tracing::warn!(error = %e, "failed to write response trace");
        }

        Ok(response)
    }

    /// Start a streamed completion
    ///
    /// The returned stream yields one chunk per upstream event. A transport
    /// failure mid-stream is yielded as an error item; the stream can still
    /// be polled afterwards.
    ///
    /// # Errors
    ///
    /// Returns any routing or conversion failure, or a transport failure
    /// while opening the stream
    pub async fn complete_stream(&self, method: &str, request: CanonicalRequest) -> Result<ChunkStream, LlmError> {
        let routed = self.prepare(method, request, true)?;
        let route = routed.route().clone();

        let UpstreamStream { shape, events } = self
            .transport
            .send_stream(&route, &routed.adapted.payload)
            .await
            .map_err(|source| transport_error(&route, source))?;

        tracing::debug!(target_model = %route.target_model(), shape = %shape, "stream opened");

        let state = StreamContext {
            events,
            normalizer: StreamNormalizer::new(shape, Arc::clone(&self.diagnostics)),
            route,
            recorded: Vec::new(),
            trace: self.trace.clone(),
            timestamp: routed.timestamp,
            method: routed.method,
        };

        Ok(Box::pin(stream::unfold(state, StreamContext::advance)))
    }
}

struct StreamContext {
    events: Pin<Box<dyn Stream<Item = anyhow::Result<serde_json::Value>> + Send>>,
    normalizer: StreamNormalizer,
    route: ModelRoute,
    /// Chunks kept for the stream trace; empty when tracing is off
    recorded: Vec<StreamingChunk>,
    trace: Option<Arc<dyn TraceSink>>,
    timestamp: Timestamp,
    method: String,
}

impl StreamContext {
    async fn advance(mut self) -> Option<(Result<StreamingChunk, LlmError>, Self)> {
        match self.events.next().await {
            Some(Ok(event)) => {
                let chunk = self.normalizer.normalize(&event);
                if self.trace.is_some() {
                    self.recorded.push(chunk.clone());
                }
                Some((Ok(chunk), self))
            }
            Some(Err(source)) => {
                let err = transport_error(&self.route, source);
                Some((Err(err.into()), self))
            }
            None => {
                self.finish();
                None
            }
        }
    }

    fn finish(&mut self) {
        self.normalizer.close();

        tracing::info!(
            target_model = %self.route.target_model(),
            tool_calls = self.normalizer.tool_calls().calls().len(),
            "stream finished"
        );

        if let Some(trace) = &self.trace
            && let Err(e) = trace.write_stream_chunks(self.timestamp, &self.method, &self.recorded)
        {
            tracing::warn!(error = %e, "failed to write stream trace");
        }
    }
}

fn transport_error(route: &ModelRoute, source: anyhow::Error) -> TransportError {
    tracing::warn!(target_model = %route.target_model(), error = %source, "upstream call failed");
    TransportError {
        target_model: route.target_model().to_owned(),
        dialect: route.dialect(),
        source,
    }
}
