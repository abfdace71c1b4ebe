//! Programmatic configuration builder for integration tests

use std::path::Path;

use secrecy::SecretString;
use switchyard_config::{Config, ProviderConfig, RemapRule, RoutingConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder that falls back to the `openai` provider
    pub fn new() -> Self {
        Self {
            config: Config {
                routing: RoutingConfig {
                    default_provider: Some("openai".to_owned()),
                    ..RoutingConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Point a provider at a mock upstream
    pub fn with_provider(mut self, name: &str, base_url: &str) -> Self {
        self.config.providers.insert(
            name.to_owned(),
            ProviderConfig {
                base_url: base_url.parse().expect("valid URL"),
                api_key: Some(SecretString::from("test-key")),
                timeout_secs: Some(10),
            },
        );
        self
    }

    /// Append an alias remap rule
    pub fn with_remap(mut self, pattern: &str, target: &str) -> Self {
        self.config.routing.remap.push(RemapRule::new(pattern, target));
        self
    }

    /// Write traces into `directory`
    pub fn with_traces(mut self, directory: &Path) -> Self {
        self.config.trace.enabled = true;
        self.config.trace.directory = directory.to_path_buf();
        self
    }

    /// Turn off the one-tool-per-turn instruction
    pub fn without_tool_guard(mut self) -> Self {
        self.config.adapter.enforce_single_tool_call = false;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Config {
        self.config.validate().expect("test config must be valid");
        self.config
    }
}
