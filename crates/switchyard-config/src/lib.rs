#![allow(clippy::must_use_candidate)]

pub mod adapter;
mod env;
mod loader;
pub mod log;
pub mod providers;
pub mod routing;
pub mod trace;

use indexmap::IndexMap;
use serde::Deserialize;

pub use adapter::*;
pub use log::*;
pub use providers::*;
pub use routing::*;
pub use trace::*;

/// Top-level Switchyard configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Model alias resolution rules
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Request compatibility rewrites
    #[serde(default)]
    pub adapter: AdapterConfig,
    /// Request/response trace files
    #[serde(default)]
    pub trace: TraceConfig,
    /// Log output
    #[serde(default)]
    pub log: LogConfig,
    /// Upstream endpoints keyed by provider name
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,
}
