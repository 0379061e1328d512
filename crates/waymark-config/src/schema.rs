//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};
use waymark_telemetry::{LogConfig, MetricsConfig};

/// Body format for responses the router writes itself (404s, middleware
/// aborts, recovered panics).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorFormat {
    /// `text/plain` body containing the message.
    #[default]
    Text,
    /// `application/json` body of the form `{"error": {"code", "message"}}`.
    Json,
}

/// Router dispatch configuration.
///
/// # Example
///
/// ```
/// use waymark_config::{ErrorFormat, RouterConfig};
///
/// let config = RouterConfig {
///     error_format: ErrorFormat::Json,
///     ..Default::default()
/// };
/// assert!(config.recover_panics);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Catch panics raised by middleware or handlers and answer 500.
    ///
    /// When disabled the panic unwinds into the host server.
    #[serde(default = "default_true")]
    pub recover_panics: bool,

    /// Message written for unmatched requests.
    #[serde(default = "default_not_found_message")]
    pub not_found_message: String,

    /// Body format for router-generated error responses.
    #[serde(default)]
    pub error_format: ErrorFormat,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            recover_panics: true,
            not_found_message: default_not_found_message(),
            error_format: ErrorFormat::default(),
        }
    }
}

fn default_not_found_message() -> String {
    "404 page not found".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. `info`, `waymark_router=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the telemetry crate's logging settings.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            ansi: self.ansi_enabled,
            file_line_info: self.include_location,
            ..LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dispatch metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSettings {
    /// Install a Prometheus recorder for the router's metrics.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram buckets (seconds) for dispatch duration.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: default_duration_buckets(),
        }
    }
}

impl MetricsSettings {
    /// Converts this section into the telemetry crate's metrics settings.
    #[must_use]
    pub fn to_metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.enabled,
            duration_buckets: self.duration_buckets.clone(),
        }
    }
}

fn default_duration_buckets() -> Vec<f64> {
    // Dispatch is in-process, so buckets start at 10µs
    vec![
        0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
    ]
}

fn default_true() -> bool {
    true
}
