//! Prometheus metrics for dispatch.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `waymark_dispatch_total` | Counter | `method`, `outcome` | Dispatched requests |
//! | `waymark_dispatch_duration_seconds` | Histogram | `method` | Lookup plus chain execution time |
//!
//! `outcome` is one of [`DispatchOutcome`]'s labels. Recording is a no-op
//! until a recorder is installed, so the router can always call
//! [`record_dispatch`].

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Name of the dispatch counter.
pub const DISPATCH_TOTAL: &str = "waymark_dispatch_total";

/// Name of the dispatch duration histogram.
pub const DISPATCH_DURATION: &str = "waymark_dispatch_duration_seconds";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,

    /// Histogram buckets (seconds) for dispatch duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: vec![
                0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
            ],
        }
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran.
    Matched,
    /// No route for the method and path.
    NotFound,
    /// A middleware returned an error.
    Aborted,
    /// A middleware or handler panicked and the panic was recovered.
    Panicked,
}

impl DispatchOutcome {
    /// Label value used for the `outcome` label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::NotFound => "not_found",
            Self::Aborted => "aborted",
            Self::Panicked => "panicked",
        }
    }
}

/// Installs the Prometheus recorder and registers metric descriptions.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are rejected or a
/// global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.duration_buckets.is_empty() {
        return Err(TelemetryError::InvalidConfig(
            "duration_buckets must not be empty".to_string(),
        ));
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(DISPATCH_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    describe_counter!(DISPATCH_TOTAL, "Requests dispatched by the router, by outcome");
    describe_histogram!(
        DISPATCH_DURATION,
        "Time spent resolving a route and running its middleware chain and handler"
    );

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Records one dispatch.
pub fn record_dispatch(method: &str, outcome: DispatchOutcome, duration: Duration) {
    counter!(
        DISPATCH_TOTAL,
        "method" => method.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(DISPATCH_DURATION, "method" => method.to_string()).record(duration.as_secs_f64());
}
