//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("configuration file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported configuration format: {}", path.display())]
    UnsupportedFormat {
        /// Path to the file.
        path: PathBuf,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        /// Path to the file.
        path: PathBuf,
        /// Parser error, including the offending key for unknown fields.
        #[source]
        source: toml::de::Error,
    },

    /// The file is not valid JSON for this schema.
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        /// Path to the file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: expected {expected}")]
    Env {
        /// Variable name, prefix included.
        var: String,
        /// Accepted values.
        expected: &'static str,
    },

    /// A loaded value failed validation.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `router.not_found_message`.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) const fn invalid_value(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidValue { field, reason }
    }

    pub(crate) fn env(var: &str, expected: &'static str) -> Self {
        Self::Env {
            var: var.to_string(),
            expected,
        }
    }

    /// Returns the field or variable an error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            Self::Env { var, .. } => Some(var),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_path() {
        let err = ConfigError::NotFound {
            path: "/etc/waymark/router.toml".into(),
        };
        assert_eq!(
            err.to_string(),
            "configuration file not found: /etc/waymark/router.toml"
        );
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_invalid_value() {
        let err = ConfigError::invalid_value("router.not_found_message", "must not be empty");
        assert_eq!(err.field(), Some("router.not_found_message"));
        assert!(err.to_string().ends_with("must not be empty"));
    }

    #[test]
    fn test_env_error() {
        let err = ConfigError::env("WAYMARK__ROUTER__RECOVER_PANICS", "a boolean");
        assert_eq!(err.field(), Some("WAYMARK__ROUTER__RECOVER_PANICS"));
        assert_eq!(
            err.to_string(),
            "invalid value for WAYMARK__ROUTER__RECOVER_PANICS: expected a boolean"
        );
    }

    #[test]
    fn test_toml_error_keeps_source() {
        let source = toml::from_str::<toml::Value>("= 1").unwrap_err();
        let err = ConfigError::Toml {
            path: "router.toml".into(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("invalid TOML in router.toml"));
    }
}
