//! Reporting of non-fatal stream normalization problems

use crate::error::NormalizationWarning;

/// Receives warnings raised while normalizing stream events
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, warning: &NormalizationWarning);
}

/// Default sink, logs each warning through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, warning: &NormalizationWarning) {
        tracing::warn!(shape = %warning.shape, reason = %warning.reason, "stream event normalization failed");
    }
}
