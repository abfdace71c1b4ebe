use thiserror::Error;

use crate::routing::Dialect;
use crate::stream::EventShape;

/// Failure to resolve a model alias into a route
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Alias was empty or whitespace only
    #[error("model alias is empty")]
    EmptyAlias,

    /// No provider prefix matched and no default provider is configured
    #[error("cannot resolve model alias '{alias}': no provider matches and no default provider is configured")]
    Unresolved { alias: String },

    /// A rule table pattern failed to compile
    #[error("invalid routing pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure to convert between canonical and dialect representations
#[derive(Debug, Error)]
pub enum ConversionError {
    /// A structurally required field is absent
    #[error("missing required field `{field}` in {context}")]
    MissingField { field: &'static str, context: String },

    /// Payload could not be parsed into the expected shape
    #[error("malformed {context}")]
    Malformed {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConversionError {
    pub(crate) fn missing(field: &'static str, context: impl Into<String>) -> Self {
        Self::MissingField {
            field,
            context: context.into(),
        }
    }

    pub(crate) fn malformed(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Malformed {
            context: context.into(),
            source,
        }
    }
}

/// Upstream call failed; the cause is kept as the error source
#[derive(Debug, Error)]
#[error("upstream call to '{target_model}' ({dialect}) failed")]
pub struct TransportError {
    /// Provider-qualified target of the failed call
    pub target_model: String,
    /// Dialect the payload was sent in
    pub dialect: Dialect,
    #[source]
    pub source: anyhow::Error,
}

/// Non-fatal problem while normalizing a single stream event
#[derive(Debug, Clone, Error)]
#[error("could not normalize {shape} stream event: {reason}")]
pub struct NormalizationWarning {
    /// Event shape the normalizer was created for
    pub shape: EventShape,
    /// What was wrong with the event
    pub reason: String,
}

impl NormalizationWarning {
    pub(crate) fn new(shape: EventShape, reason: impl Into<String>) -> Self {
        Self {
            shape,
            reason: reason.into(),
        }
    }
}

/// Any fatal pipeline failure
#[derive(Debug, Error)]
pub enum LlmError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
