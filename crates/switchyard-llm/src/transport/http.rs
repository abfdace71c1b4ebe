//! OpenAI-compatible HTTP transport

use std::collections::HashMap;
use std::future;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use indexmap::IndexMap;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use switchyard_config::ProviderConfig;
use url::Url;

use super::{Transport, UpstreamResponse, UpstreamStream, shapes_for};
use crate::adapter::DialectPayload;
use crate::routing::{Dialect, ModelRoute};

/// End-of-stream marker sent as SSE data
const DONE_MARKER: &str = "[DONE]";

struct Endpoint {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl Endpoint {
    fn url(&self, dialect: Dialect) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        match dialect {
            Dialect::Chat => format!("{base}/chat/completions"),
            Dialect::SingleInput => format!("{base}/responses"),
        }
    }
}

/// Posts payloads to OpenAI-compatible endpoints, one per provider name
///
/// Every provider, Anthropic included, is expected to expose the
/// OpenAI-compatible `/chat/completions` and `/responses` paths.
pub struct HttpTransport {
    endpoints: HashMap<String, Endpoint>,
}

impl HttpTransport {
    /// Build one HTTP client per configured provider
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed
    pub fn from_config(providers: &IndexMap<String, ProviderConfig>) -> anyhow::Result<Self> {
        let mut endpoints = HashMap::with_capacity(providers.len());

        for (name, config) in providers {
            let mut builder = Client::builder();
            if let Some(secs) = config.timeout_secs {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            let client = builder
                .build()
                .with_context(|| format!("failed to build HTTP client for provider '{name}'"))?;

            endpoints.insert(
                name.to_ascii_lowercase(),
                Endpoint {
                    client,
                    base_url: config.base_url.clone(),
                    api_key: config.api_key.clone(),
                },
            );
        }

        Ok(Self { endpoints })
    }

    fn endpoint(&self, route: &ModelRoute) -> anyhow::Result<&Endpoint> {
        let provider = route.provider().as_str();
        self.endpoints
            .get(&provider.to_ascii_lowercase())
            .with_context(|| format!("no endpoint configured for provider '{provider}'"))
    }

    async fn post(&self, route: &ModelRoute, payload: &DialectPayload) -> anyhow::Result<Response> {
        let endpoint = self.endpoint(route)?;
        let url = endpoint.url(payload.dialect());

        let mut builder = endpoint.client.post(&url).json(payload);
        if let Some(key) = &endpoint.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(target_model = %route.target_model(), error = %e, "upstream request failed");
            anyhow::Error::new(e).context(format!("request to {url} failed"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(target_model = %route.target_model(), status = %status, "upstream returned error");
            bail!("provider returned {status}: {body}");
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, route: &ModelRoute, payload: &DialectPayload) -> anyhow::Result<UpstreamResponse> {
        let response = self.post(route, payload).await?;
        let body = response
            .json::<Value>()
            .await
            .context("failed to read upstream response body")?;

        let (shape, _) = shapes_for(payload.dialect());
        Ok(UpstreamResponse { shape, body })
    }

    async fn send_stream(&self, route: &ModelRoute, payload: &DialectPayload) -> anyhow::Result<UpstreamStream> {
        let response = self.post(route, payload).await?;

        let events = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| future::ready(!matches!(event, Ok(event) if event.data.trim() == DONE_MARKER)))
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(Ok(parse_event_data(event.data.trim()))),
                    Err(e) => Some(Err(anyhow::Error::new(e).context("upstream event stream failed"))),
                })
            });

        let (_, shape) = shapes_for(payload.dialect());
        Ok(UpstreamStream {
            shape,
            events: Box::pin(events),
        })
    }
}

fn parse_event_data(data: &str) -> Value {
    serde_json::from_str(data).unwrap_or_else(|_| Value::String(data.to_owned()))
}
