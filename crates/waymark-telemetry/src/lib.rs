//! Observability for the Waymark router.
//!
//! - **Logging**: structured JSON or pretty logs through `tracing-subscriber`
//! - **Metrics**: dispatch counters and latency histograms through the
//!   `metrics` facade, rendered by a Prometheus recorder
//!
//! The router always emits `tracing` events and `metrics` samples; both are
//! no-ops until the host installs a subscriber and a recorder, which is what
//! [`init_telemetry`] does.
//!
//! # Example
//!
//! ```rust,ignore
//! use waymark_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::production(), &MetricsConfig::default())?;
//!
//! // later, from a /metrics handler
//! let body = waymark_telemetry::render_metrics().unwrap_or_default();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use crate::metrics::{
    init_metrics, record_dispatch, render_metrics, DispatchOutcome, MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(logging: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(logging)?;
    init_metrics(metrics)?;
    Ok(())
}
