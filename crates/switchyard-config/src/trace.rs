use std::path::PathBuf;

use serde::Deserialize;

/// Markdown request/response trace output
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceConfig {
    /// Write trace files for every routed request
    #[serde(default)]
    pub enabled: bool,
    /// Directory receiving the trace files, created on first write
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_directory(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from(".traces")
}
