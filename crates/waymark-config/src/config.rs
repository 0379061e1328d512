//! Root configuration type.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, MetricsSettings, RouterConfig};

/// Complete Waymark configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use waymark_config::WaymarkConfig;
///
/// let config = WaymarkConfig::default();
/// assert!(config.router.recover_panics);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct WaymarkConfig {
    /// Router dispatch configuration.
    #[serde(default)]
    pub router: RouterConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl WaymarkConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The 404 message is empty
    /// - The log level is empty
    /// - Duration buckets are empty, non-finite or not strictly increasing
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.router.not_found_message.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "router.not_found_message",
                "must not be empty",
            ));
        }

        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                "must not be empty when logging is enabled",
            ));
        }

        let buckets = &self.metrics.duration_buckets;
        if self.metrics.enabled && buckets.is_empty() {
            return Err(ConfigError::invalid_value(
                "metrics.duration_buckets",
                "at least one bucket is required",
            ));
        }
        if buckets.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(ConfigError::invalid_value(
                "metrics.duration_buckets",
                "buckets must be positive finite numbers",
            ));
        }
        if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::invalid_value(
                "metrics.duration_buckets",
                "buckets must be strictly increasing",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs with source locations, and
    /// panics propagate so they surface in the terminal.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config.router.recover_panics = false;

        config
    }

    /// Production preset: JSON logs at info, panics recovered as 500s.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.router.recover_panics = true;

        config
    }
}
