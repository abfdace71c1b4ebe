//! Request and response traces
//!
//! Each routed request gets a UTC timestamp that names its trace files, so
//! the request, response and stream records of one call sort together.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use jiff::Timestamp;
use serde::Serialize;
use serde_json::Value;

use crate::adapter::{AdaptedRequest, DialectPayload};
use crate::types::{CanonicalRequest, CanonicalResponse, StreamingChunk};

/// Destination for per-request trace records
///
/// Failures are reported to the caller, which logs them; a trace failure
/// never changes what the pipeline returns.
pub trait TraceSink: Send + Sync {
    fn write_request(
        &self,
        timestamp: Timestamp,
        method: &str,
        original: &CanonicalRequest,
        adapted: &AdaptedRequest,
    ) -> anyhow::Result<()>;

    fn write_response(
        &self,
        timestamp: Timestamp,
        method: &str,
        response: &CanonicalResponse,
    ) -> anyhow::Result<()>;

    fn write_stream_chunks(
        &self,
        timestamp: Timestamp,
        method: &str,
        chunks: &[StreamingChunk],
    ) -> anyhow::Result<()>;
}

/// File name prefix for a trace timestamp: `YYYYmmdd_HHMMSS_mmm_uuu` in UTC
pub fn trace_stem(timestamp: Timestamp) -> String {
    let micros = timestamp.subsec_microsecond();
    format!(
        "{}_{:03}_{:03}",
        timestamp.strftime("%Y%m%d_%H%M%S"),
        micros / 1000,
        micros % 1000
    )
}

/// Writes one markdown file per record into a directory
#[derive(Debug, Clone)]
pub struct MarkdownTraceSink {
    directory: PathBuf,
}

impl MarkdownTraceSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create `<stem>_<suffix>.md`, refusing to overwrite an existing trace
    fn create(&self, timestamp: Timestamp, suffix: &str, contents: &str) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)
            .with_context(|| format!("failed to create trace directory {}", self.directory.display()))?;

        let path = self.directory.join(format!("{}_{suffix}.md", trace_stem(timestamp)));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("failed to create trace file {}", path.display()))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("failed to write trace file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "wrote trace");
        Ok(path)
    }
}

impl TraceSink for MarkdownTraceSink {
    fn write_request(
        &self,
        timestamp: Timestamp,
        method: &str,
        original: &CanonicalRequest,
        adapted: &AdaptedRequest,
    ) -> anyhow::Result<()> {
        let mut original_params = serde_json::to_value(&original.params)?;
        let original_messages = serde_json::to_value(&original.messages)?;
        if let Value::Object(params) = &mut original_params {
            params.insert("model".to_owned(), Value::String(original.model.clone()));
        }

        let (heading, messages_key) = match adapted.payload {
            DialectPayload::Chat(_) => ("ChatCompletions API", "messages"),
            DialectPayload::SingleInput(_) => ("Responses API", "input"),
        };
        let mut adapted_params = adapted.payload.to_value()?;
        let adapted_messages = adapted_params
            .as_object_mut()
            .and_then(|params| params.remove(messages_key))
            .unwrap_or(Value::Null);

        let mut doc = format!("# {}\n\n## Request Messages\n\n", method.to_uppercase());
        if original_messages != adapted_messages {
            push_json_section(&mut doc, "Original", &original_messages)?;
        }
        push_json_section(&mut doc, heading, &adapted_messages)?;

        doc.push_str("## Request Params\n\n");
        push_json_section(&mut doc, "Original", &original_params)?;
        push_json_section(&mut doc, heading, &adapted_params)?;

        writeln!(doc, "## Route\n")?;
        push_json_section(&mut doc, "Resolved", &adapted.route)?;

        self.create(timestamp, "REQUEST", &doc)?;
        Ok(())
    }

    fn write_response(&self, timestamp: Timestamp, method: &str, response: &CanonicalResponse) -> anyhow::Result<()> {
        let mut doc = format!("# {}\n\n## Response\n\n", method.to_uppercase());
        push_json_section(&mut doc, "Canonical", response)?;

        self.create(timestamp, "RESPONSE", &doc)?;
        Ok(())
    }

    fn write_stream_chunks(
        &self,
        timestamp: Timestamp,
        method: &str,
        chunks: &[StreamingChunk],
    ) -> anyhow::Result<()> {
        let mut doc = format!("# {}\n\n", method.to_uppercase());
        for (position, chunk) in chunks.iter().enumerate() {
            writeln!(doc, "## Response Chunk #{position}\n")?;
            push_json_section(&mut doc, "Canonical", chunk)?;
        }

        self.create(timestamp, "RESPONSE_STREAM", &doc)?;
        Ok(())
    }
}

fn push_json_section(doc: &mut String, heading: &str, value: &impl Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(doc, "### {heading}:\n```json\n{json}\n```\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use switchyard_config::{AdapterConfig, RoutingConfig};

    use super::*;
    use crate::adapter::RequestAdapter;
    use crate::routing::ModelRouter;

    fn timestamp() -> Timestamp {
        "2025-10-05T14:06:42.180342Z".parse().unwrap()
    }

    fn adapted(alias: &str, request: &CanonicalRequest) -> AdaptedRequest {
        let route = ModelRouter::new(&RoutingConfig::default())
            .unwrap()
            .resolve(alias)
            .unwrap();
        RequestAdapter::new(&AdapterConfig::default())
            .adapt(request, &route, false)
            .unwrap()
    }

    #[test]
    fn stem_separates_millis_and_micros() {
        assert_eq!(trace_stem(timestamp()), "20251005_140642_180_342");
    }

    #[test]
    fn request_trace_shows_original_and_adapted() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownTraceSink::new(dir.path().join("traces"));
        let request = CanonicalRequest::from_value(json!({
            "model": "codex-mini-latest",
            "messages": [{"role": "user", "content": "hello"}],
            "temperature": 0.5
        }))
        .unwrap();

        sink.write_request(timestamp(), "acompletion", &request, &adapted("codex-mini-latest", &request))
            .unwrap();

        let written =
            std::fs::read_to_string(dir.path().join("traces/20251005_140642_180_342_REQUEST.md")).unwrap();
        assert!(written.starts_with("# ACOMPLETION\n\n## Request Messages\n\n### Original:\n```json\n"));
        assert!(written.contains("### Responses API:\n```json\n"));
        assert!(written.contains("\"input_text\""));
        assert!(written.contains("## Request Params"));
        assert!(written.contains("\"target_model\": \"openai/codex-mini-latest\""));
    }

    #[test]
    fn unchanged_messages_skip_original_section() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownTraceSink::new(dir.path());
        let request = CanonicalRequest::from_value(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "hello"}]
        }))
        .unwrap();

        sink.write_request(timestamp(), "completion", &request, &adapted("gpt-4o", &request))
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("20251005_140642_180_342_REQUEST.md")).unwrap();
        let messages_section = written.split("## Request Params").next().unwrap();
        assert!(!messages_section.contains("### Original:"));
        assert!(messages_section.contains("### ChatCompletions API:"));
    }

    #[test]
    fn stream_trace_numbers_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownTraceSink::new(dir.path());
        let chunks = [StreamingChunk::text("Hel"), StreamingChunk::finished("stop")];

        sink.write_stream_chunks(timestamp(), "astreaming", &chunks).unwrap();

        let written =
            std::fs::read_to_string(dir.path().join("20251005_140642_180_342_RESPONSE_STREAM.md")).unwrap();
        assert!(written.starts_with("# ASTREAMING\n\n## Response Chunk #0\n\n### Canonical:\n"));
        assert!(written.contains("## Response Chunk #1"));
        assert!(written.contains("\"finish_reason\": \"stop\""));
    }

    #[test]
    fn existing_trace_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownTraceSink::new(dir.path());
        let response = CanonicalResponse {
            id: "chatcmpl-1".to_owned(),
            model: "gpt-4o".to_owned(),
            choices: Vec::new(),
            usage: None,
            provider_specific_fields: crate::types::JsonMap::new(),
        };

        sink.write_response(timestamp(), "completion", &response).unwrap();
        let err = sink.write_response(timestamp(), "completion", &response).unwrap_err();

        assert!(err.to_string().contains("failed to create trace file"));
    }
}
