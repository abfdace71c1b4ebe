use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Upstream endpoint for one provider, keyed by provider name
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API root, e.g. `https://api.openai.com/v1`
    pub base_url: Url,
    /// Bearer token sent upstream
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Whole-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
