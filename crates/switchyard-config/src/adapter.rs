use serde::Deserialize;

/// Request compatibility rewrite toggles
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    /// Rewrite one-token "test" probes into a proper connectivity check
    #[serde(default = "default_true")]
    pub probe_rewrite: bool,
    /// Instruct models without parallel tool support to call one tool per turn
    #[serde(default = "default_true")]
    pub enforce_single_tool_call: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            probe_rewrite: true,
            enforce_single_tool_call: true,
        }
    }
}

const fn default_true() -> bool {
    true
}
