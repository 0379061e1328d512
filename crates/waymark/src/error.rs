//! Top-level error type.

use thiserror::Error;
use waymark_config::ConfigError;
use waymark_router::RouteError;
use waymark_telemetry::TelemetryError;

/// Result type for setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting up a router.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be initialized.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// A route or middleware could not be registered.
    #[error("route error: {0}")]
    Route(#[from] RouteError),
}
