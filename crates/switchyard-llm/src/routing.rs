//! Model alias resolution
//!
//! Turns a caller-supplied alias into a provider-qualified target, extra
//! generation parameters, and the wire dialect to speak. The rule table is
//! compiled once and read-only afterwards, so one router can be shared
//! across requests.

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;
use switchyard_config::RoutingConfig;

use crate::error::RoutingError;
use crate::types::JsonMap;

/// Alias spellings rewritten before provider detection
const NORMALIZATIONS: &[(&str, &str)] = &[("gpt5", "gpt-5"), ("gpt4o", "gpt-4o"), ("gpt4.1", "gpt-4.1")];

/// Upstream provider family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provider {
    /// `OpenAI` and compatible endpoints
    OpenAi,
    /// Anthropic
    Anthropic,
    /// Google Gemini
    Gemini,
    /// Any other provider, by configured name
    Other(String),
}

impl Provider {
    /// Provider for a configured or explicit prefix name
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "openai" => Self::OpenAi,
            "anthropic" => Self::Anthropic,
            "gemini" => Self::Gemini,
            _ => Self::Other(name.to_owned()),
        }
    }

    /// Lowercase provider prefix used in target models
    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Other(name) => name,
        }
    }

    pub const fn is_anthropic(&self) -> bool {
        matches!(self, Self::Anthropic)
    }

    /// Whether the provider reliably handles several tool calls per response
    pub const fn supports_parallel_tool_calls(&self) -> bool {
        self.is_anthropic()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Provider {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Wire dialect expected by the target model
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dialect {
    /// Chat-completions message array
    Chat,
    /// Responses-style structured input items
    SingleInput,
}

/// Resolved target for one inbound request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRoute {
    requested_alias: String,
    remapped_alias: String,
    target_model: String,
    provider: Provider,
    model_name: String,
    extra_params: JsonMap,
    dialect: Dialect,
}

impl ModelRoute {
    /// Alias as the caller sent it, trimmed
    pub fn requested_alias(&self) -> &str {
        &self.requested_alias
    }

    /// Alias after remap rules; equals the requested alias when none matched
    pub fn remapped_alias(&self) -> &str {
        &self.remapped_alias
    }

    /// Provider-qualified target, always `provider/model`
    pub fn target_model(&self) -> &str {
        &self.target_model
    }

    pub const fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Target model without the provider prefix
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Generation parameters implied by the alias; never contains `model`
    pub const fn extra_params(&self) -> &JsonMap {
        &self.extra_params
    }

    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Reasoning effort captured from the alias suffix
    pub fn reasoning_effort(&self) -> Option<&str> {
        self.extra_params.get("reasoning_effort").and_then(Value::as_str)
    }
}

struct CompiledRemap {
    pattern: Regex,
    target: String,
}

struct VendorFamily {
    provider: Provider,
    prefixes: Vec<String>,
}

/// Compiled alias routing table
pub struct ModelRouter {
    remaps: Vec<CompiledRemap>,
    reasoning_suffix: Regex,
    vendors: Vec<VendorFamily>,
    default_provider: Option<Provider>,
    single_input_markers: Vec<Regex>,
    always_single_input: bool,
}

impl ModelRouter {
    /// Compile the routing table
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::InvalidPattern` if a remap pattern or
    /// single-input marker is not a valid regex
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        let remaps = config
            .remap
            .iter()
            .filter(|rule| rule.is_active())
            .map(|rule| {
                Ok(CompiledRemap {
                    pattern: compile(&rule.pattern)?,
                    target: rule.target.trim().to_owned(),
                })
            })
            .collect::<Result<Vec<_>, RoutingError>>()?;

        let efforts = config
            .reasoning_efforts
            .iter()
            .map(|effort| regex::escape(effort.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let reasoning_suffix = compile(&format!(r"^(?P<base>.+?)-reason(?:ing)?(?:-effort)?-(?P<effort>{efforts})$"))?;

        let vendors = config
            .vendor_prefixes
            .iter()
            .map(|(name, prefixes)| VendorFamily {
                provider: Provider::from_name(name),
                prefixes: prefixes.iter().map(|p| p.to_ascii_lowercase()).collect(),
            })
            .collect();

        let single_input_markers = config
            .single_input_markers
            .iter()
            .map(|marker| compile(marker))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            remaps,
            reasoning_suffix,
            vendors,
            default_provider: config.default_provider.as_deref().map(Provider::from_name),
            single_input_markers,
            always_single_input: config.always_single_input,
        })
    }

    /// Resolve an alias into a route
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::EmptyAlias` for a blank alias and
    /// `RoutingError::Unresolved` when no provider can be determined
    pub fn resolve(&self, alias: &str) -> Result<ModelRoute, RoutingError> {
        let requested = alias.trim();
        if requested.is_empty() {
            return Err(RoutingError::EmptyAlias);
        }

        // An explicit provider prefix bypasses remapping; a remap target is
        // resolved as if it were the alias, but never remapped again
        let remapped = if requested.contains('/') {
            requested
        } else {
            self.remap(requested).unwrap_or(requested)
        };

        let (explicit_provider, name) = match remapped.split_once('/') {
            Some((provider, name)) if !provider.is_empty() && !name.is_empty() => (Some(provider), name),
            _ => (None, remapped),
        };

        let mut extra_params = JsonMap::new();
        let name = match self.reasoning_suffix.captures(name) {
            Some(caps) => {
                extra_params.insert("reasoning_effort".to_owned(), Value::String(caps["effort"].to_owned()));
                caps["base"].to_owned()
            }
            None => name.to_owned(),
        };
        let model_name = normalize(&name);

        let provider = match explicit_provider {
            Some(provider) => Provider::from_name(provider),
            None => self.detect_provider(&model_name, requested)?,
        };

        // Responses-only models are an OpenAI concept; other providers keep chat
        let dialect = if provider == Provider::OpenAi
            && (self.always_single_input || self.single_input_markers.iter().any(|m| m.is_match(&model_name)))
        {
            Dialect::SingleInput
        } else {
            Dialect::Chat
        };

        let route = ModelRoute {
            requested_alias: requested.to_owned(),
            remapped_alias: remapped.to_owned(),
            target_model: format!("{provider}/{model_name}"),
            provider,
            model_name,
            extra_params,
            dialect,
        };

        tracing::info!(
            requested_alias = %route.requested_alias,
            remapped_alias = %route.remapped_alias,
            target_model = %route.target_model,
            dialect = %route.dialect,
            reasoning_effort = route.reasoning_effort().unwrap_or(""),
            "resolved model route"
        );

        Ok(route)
    }

    fn remap<'a>(&'a self, alias: &str) -> Option<&'a str> {
        self.remaps
            .iter()
            .find(|rule| rule.pattern.is_match(alias))
            .map(|rule| rule.target.as_str())
    }

    fn detect_provider(&self, model_name: &str, requested: &str) -> Result<Provider, RoutingError> {
        let lowered = model_name.to_ascii_lowercase();

        if let Some(family) = self
            .vendors
            .iter()
            .find(|family| family.prefixes.iter().any(|prefix| lowered.starts_with(prefix.as_str())))
        {
            return Ok(family.provider.clone());
        }

        match &self.default_provider {
            Some(provider) => {
                tracing::warn!(
                    alias = %requested,
                    provider = %provider,
                    "no vendor prefix matched, passing model through to default provider"
                );
                Ok(provider.clone())
            }
            None => Err(RoutingError::Unresolved {
                alias: requested.to_owned(),
            }),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, RoutingError> {
    Regex::new(pattern).map_err(|source| RoutingError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}

fn normalize(name: &str) -> String {
    for (from, to) in NORMALIZATIONS {
        if let Some(rest) = name.strip_prefix(from) {
            return format!("{to}{rest}");
        }
    }
    name.to_owned()
}
