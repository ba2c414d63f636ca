//! Operation counters.
//!
//! Every core operation invoked by a handler is counted once, labelled with
//! the operation name and its outcome (`success` or the error code).

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;

/// Outcome label of successful operations
pub const SUCCESS: &str = "success";

/// Errors while registering or rendering metrics
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Abstraction for recording operation metrics.
///
/// # Thread Safety
/// All implementations MUST be thread-safe (Send + Sync).
pub trait OperationMetrics: Send + Sync {
    /// Count one invocation of `operation` that ended with `outcome`
    fn record_operation(&self, operation: &str, outcome: &str);

    /// Render all metrics in the Prometheus text exposition format
    fn render(&self) -> Result<String, MetricsError>;
}

/// Prometheus metrics collector.
///
/// # Metrics
/// - `lineage_operations_total{operation, outcome}` (Counter)
pub struct PrometheusMetrics {
    registry: Registry,
    operations: IntCounterVec,
}

impl PrometheusMetrics {
    /// Creates a collector with its own registry.
    ///
    /// # Errors
    /// Fails if the counter cannot be registered.
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Creates a collector registering into `registry`
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let operations = IntCounterVec::new(
            Opts::new(
                "lineage_operations_total",
                "Versioning and bundle operations by outcome",
            ),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(operations.clone()))?;

        Ok(Self {
            registry,
            operations,
        })
    }

    /// Current value of one counter
    #[cfg(test)]
    pub(crate) fn count(&self, operation: &str, outcome: &str) -> u64 {
        self.operations
            .with_label_values(&[operation, outcome])
            .get()
    }
}

impl OperationMetrics for PrometheusMetrics {
    fn record_operation(&self, operation: &str, outcome: &str) {
        self.operations
            .with_label_values(&[operation, outcome])
            .inc();
    }

    fn render(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// No-op metrics implementation for testing or when metrics are disabled.
#[derive(Debug, Default)]
pub struct NoOpMetrics;

impl NoOpMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl OperationMetrics for NoOpMetrics {
    fn record_operation(&self, _operation: &str, _outcome: &str) {}

    fn render(&self) -> Result<String, MetricsError> {
        Ok(String::new())
    }
}
