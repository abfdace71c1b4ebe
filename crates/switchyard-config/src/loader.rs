use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern does not compile or a section holds
    /// an unusable value
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_routing()?;
        self.validate_trace()?;
        self.validate_providers()?;
        Ok(())
    }

    fn validate_routing(&self) -> anyhow::Result<()> {
        let routing = &self.routing;

        for rule in &routing.remap {
            regex::Regex::new(&rule.pattern)
                .map_err(|e| anyhow::anyhow!("invalid remap pattern '{}': {e}", rule.pattern))?;
        }
        for marker in &routing.single_input_markers {
            regex::Regex::new(marker).map_err(|e| anyhow::anyhow!("invalid single-input marker '{marker}': {e}"))?;
        }

        if let Some(ref provider) = routing.default_provider
            && provider.trim().is_empty()
        {
            anyhow::bail!("routing.default_provider must not be empty when set");
        }

        if routing.reasoning_efforts.is_empty() {
            anyhow::bail!("routing.reasoning_efforts must list at least one effort level");
        }
        if routing.reasoning_efforts.iter().any(|effort| effort.trim().is_empty()) {
            anyhow::bail!("routing.reasoning_efforts must not contain empty values");
        }

        for (vendor, prefixes) in &routing.vendor_prefixes {
            if prefixes.iter().any(String::is_empty) {
                anyhow::bail!("vendor '{vendor}' has an empty model prefix");
            }
        }

        Ok(())
    }

    fn validate_trace(&self) -> anyhow::Result<()> {
        if self.trace.enabled && self.trace.directory.as_os_str().is_empty() {
            anyhow::bail!("trace.directory must not be empty when tracing is enabled");
        }
        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        for (name, provider) in &self.providers {
            let scheme = provider.base_url.scheme();
            if scheme != "http" && scheme != "https" {
                anyhow::bail!("provider '{name}' base_url must use http or https, got '{scheme}'");
            }

            if provider
                .api_key
                .as_ref()
                .is_some_and(|key| key.expose_secret().is_empty())
            {
                anyhow::bail!("provider '{name}' api_key must not be empty when set");
            }

            if provider.timeout_secs == Some(0) {
                anyhow::bail!("provider '{name}' timeout_secs must be greater than 0");
            }
        }
        Ok(())
    }
}
