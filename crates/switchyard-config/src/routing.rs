use indexmap::IndexMap;
use serde::Deserialize;

/// Static model routing rule table
///
/// Loaded once at startup and handed to the model router, which compiles
/// the patterns and never mutates the table afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Provider used when neither an explicit prefix nor a vendor prefix
    /// identifies one. When unset, unknown aliases are rejected.
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Ordered alias remap rules, first match wins
    #[serde(default)]
    pub remap: Vec<RemapRule>,
    /// Accepted values for the `-reason-<effort>` alias suffix
    #[serde(default = "default_reasoning_efforts")]
    pub reasoning_efforts: Vec<String>,
    /// Model name prefixes identifying each vendor family, in priority order
    #[serde(default = "default_vendor_prefixes")]
    pub vendor_prefixes: IndexMap<String, Vec<String>>,
    /// Regex patterns marking models that only accept the single-input dialect
    #[serde(default = "default_single_input_markers")]
    pub single_input_markers: Vec<String>,
    /// Send every OpenAI-routed request through the single-input dialect
    #[serde(default)]
    pub always_single_input: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            remap: Vec::new(),
            reasoning_efforts: default_reasoning_efforts(),
            vendor_prefixes: default_vendor_prefixes(),
            single_input_markers: default_single_input_markers(),
            always_single_input: false,
        }
    }
}

/// Substitute one alias for another before resolution
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemapRule {
    /// Regex matched against the trimmed alias
    pub pattern: String,
    /// Replacement alias; an empty target disables the rule
    pub target: String,
}

impl RemapRule {
    /// Build a rule from a pattern and target alias
    pub fn new(pattern: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            target: target.into(),
        }
    }

    /// Whether the rule has a target to substitute
    pub fn is_active(&self) -> bool {
        !self.target.trim().is_empty()
    }
}

fn default_reasoning_efforts() -> Vec<String> {
    ["minimal", "low", "medium", "high"].map(str::to_owned).to_vec()
}

fn default_vendor_prefixes() -> IndexMap<String, Vec<String>> {
    IndexMap::from([
        (
            "openai".to_owned(),
            ["gpt-", "o1", "o3", "o4", "chatgpt-", "codex-"].map(str::to_owned).to_vec(),
        ),
        ("anthropic".to_owned(), vec!["claude-".to_owned()]),
        ("gemini".to_owned(), vec!["gemini-".to_owned()]),
    ])
}

fn default_single_input_markers() -> Vec<String> {
    ["codex", "-pro$", "deep-research", "computer-use"]
        .map(str::to_owned)
        .to_vec()
}
