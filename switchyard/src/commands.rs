use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use futures_util::StreamExt;
use serde_json::Value;
use switchyard_config::Config;
use switchyard_llm::{
    CanonicalRequest, EventShape, HttpTransport, MarkdownTraceSink, ModelRouter, Pipeline, RequestAdapter,
    ResponseShape, StreamNormalizer, TracingDiagnostics, translate_response,
};
use tokio::io::AsyncReadExt;

use crate::args::Command;

/// Execute one subcommand, printing JSON to stdout
pub async fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Route { alias } => route(config, &alias),
        Command::Adapt { input, stream } => adapt(config, &read_input(&input).await?, stream),
        Command::Translate { shape, input } => translate(shape, &read_input(&input).await?),
        Command::Normalize { shape, input } => {
            normalize(shape, &read_input(&input).await?);
            Ok(())
        }
        Command::Complete { input, stream } => complete(config, &read_input(&input).await?, stream).await,
    }
}

fn route(config: &Config, alias: &str) -> anyhow::Result<()> {
    let route = ModelRouter::new(&config.routing)?.resolve(alias)?;
    print_json(&route)
}

fn adapt(config: &Config, raw: &str, stream: bool) -> anyhow::Result<()> {
    let request = CanonicalRequest::from_json(raw)?;
    let route = ModelRouter::new(&config.routing)?.resolve(&request.model)?;
    let adapted = RequestAdapter::new(&config.adapter).adapt(&request, &route, stream)?;

    print_json(&adapted)
}

fn translate(shape: ResponseShape, raw: &str) -> anyhow::Result<()> {
    let body: Value = serde_json::from_str(raw).context("response body is not valid JSON")?;
    let response = translate_response(shape, &body)?;

    print_json(&response)
}

fn normalize(shape: EventShape, raw: &str) {
    let mut normalizer = StreamNormalizer::new(shape, Arc::new(TracingDiagnostics));

    for event in raw.lines().filter_map(parse_event_line) {
        let chunk = normalizer.normalize(&event);
        if let Ok(line) = serde_json::to_string(&chunk) {
            println!("{line}");
        }
    }

    normalizer.close();
    let calls = normalizer.tool_calls().calls();
    if !calls.is_empty() {
        tracing::info!(tool_calls = calls.len(), "assembled tool calls");
        if let Ok(line) = serde_json::to_string(&serde_json::json!({ "tool_calls": calls })) {
            println!("{line}");
        }
    }
}

async fn complete(config: &Config, raw: &str, stream: bool) -> anyhow::Result<()> {
    let request = CanonicalRequest::from_json(raw)?;

    let router = Arc::new(ModelRouter::new(&config.routing)?);
    let transport = Arc::new(HttpTransport::from_config(&config.providers)?);
    let mut pipeline = Pipeline::new(router, RequestAdapter::new(&config.adapter), transport);
    if config.trace.enabled {
        pipeline = pipeline.with_trace_sink(Arc::new(MarkdownTraceSink::new(config.trace.directory.clone())));
    }

    if !stream {
        let response = pipeline.complete("completion", request).await?;
        return print_json(&response);
    }

    let mut chunks = pipeline.complete_stream("streaming", request).await?;
    let mut failures = 0_usize;
    while let Some(item) = chunks.next().await {
        match item {
            Ok(chunk) => println!("{}", serde_json::to_string(&chunk)?),
            Err(e) => {
                failures += 1;
                tracing::error!(error = %e, "stream event failed");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("stream finished with {failures} failed events");
    }

    Ok(())
}

async fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("failed to read stdin")?;
        return Ok(raw);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// One event per line; SSE framing is tolerated
///
/// Returns `None` for blank lines, SSE comments and non-data fields, and
/// the `[DONE]` marker. Data that is not JSON is kept as a string.
fn parse_event_line(line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') || line.starts_with("event:") || line.starts_with("id:") {
        return None;
    }

    let data = line.strip_prefix("data:").map_or(line, str::trim_start);
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    Some(serde_json::from_str(data).unwrap_or_else(|_| Value::String(data.to_owned())))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
