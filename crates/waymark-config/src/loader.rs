//! Layered configuration loading.
//!
//! Three layers, later ones winning: a preset, at most one file, then
//! environment variables named `PREFIX__SECTION__KEY`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, ErrorFormat, LogFormat, WaymarkConfig};

/// Builds a [`WaymarkConfig`] from a preset, a file and the environment.
///
/// # Example
///
/// ```no_run
/// use waymark_config::ConfigLoader;
///
/// # fn main() -> Result<(), waymark_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("waymark.toml")?
///     .with_env_prefix("WAYMARK")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: WaymarkConfig,
    env_prefix: Option<String>,
    dotenv: bool,
}

impl ConfigLoader {
    /// Starts from [`WaymarkConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from [`WaymarkConfig::development`].
    ///
    /// ```
    /// use waymark_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert!(!config.router.recover_panics);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = WaymarkConfig::development();
        self
    }

    /// Starts from [`WaymarkConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = WaymarkConfig::production();
        self
    }

    /// Replaces the configuration with the contents of `path`.
    ///
    /// The format follows the extension (`.toml` or `.json`). Sections the
    /// file omits take their defaults, not the preset's values.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Read`, `UnsupportedFormat`, or a `Toml`/`Json` parse
    /// error (unknown fields included).
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        self.config = parse(path, &content)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Any error of `with_file` other than `NotFound`.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Enables environment overrides for variables starting with
    /// `PREFIX__`, e.g. `WAYMARK__ROUTER__ERROR_FORMAT=json`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Reads a `.env` file into the process environment before overrides
    /// are applied. A missing `.env` is ignored.
    #[must_use]
    pub fn with_dotenv(mut self) -> Self {
        self.dotenv = true;
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// `Env` for an unparsable override, `InvalidValue` from
    /// [`WaymarkConfig::validate`].
    pub fn load(mut self) -> Result<WaymarkConfig, ConfigError> {
        if self.dotenv {
            // Absent or unreadable .env files leave the environment as is
            let _ = dotenvy::dotenv();
        }
        if let Some(prefix) = &self.env_prefix {
            apply_env(&mut self.config, prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

fn parse(path: &Path, content: &str) -> Result<WaymarkConfig, ConfigError> {
    let owned = || PathBuf::from(path);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => {
            toml::from_str(content).map_err(|source| ConfigError::Toml {
                path: owned(),
                source,
            })
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(content).map_err(|source| ConfigError::Json {
                path: owned(),
                source,
            })
        }
        _ => Err(ConfigError::UnsupportedFormat { path: owned() }),
    }
}

/// Applies `PREFIX__SECTION__KEY` variables. Unknown keys are ignored so
/// other settings can share the prefix.
fn apply_env<I>(config: &mut WaymarkConfig, prefix: &str, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let scoped = format!("{prefix}__");
    for (var, value) in vars {
        let Some(key) = var.strip_prefix(&scoped) else {
            continue;
        };
        let Some((section, field)) = key.split_once("__") else {
            continue;
        };

        match (section, field) {
            ("ROUTER", "RECOVER_PANICS") => config.router.recover_panics = flag(&var, &value)?,
            ("ROUTER", "NOT_FOUND_MESSAGE") => config.router.not_found_message = value,
            ("ROUTER", "ERROR_FORMAT") => {
                config.router.error_format = match value.to_ascii_lowercase().as_str() {
                    "text" => ErrorFormat::Text,
                    "json" => ErrorFormat::Json,
                    _ => return Err(ConfigError::env(&var, "'text' or 'json'")),
                };
            }
            ("LOGGING", "ENABLED") => config.logging.enabled = flag(&var, &value)?,
            ("LOGGING", "LEVEL") => config.logging.level = value,
            ("LOGGING", "FORMAT") => {
                config.logging.format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env(&var, "'json' or 'pretty'")),
                };
            }
            ("METRICS", "ENABLED") => config.metrics.enabled = flag(&var, &value)?,
            ("METRICS", "DURATION_BUCKETS") => {
                config.metrics.duration_buckets = value
                    .split(',')
                    .map(|bucket| bucket.trim().parse::<f64>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| ConfigError::env(&var, "comma-separated seconds"))?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env(var, "a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, WaymarkConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let dev = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(!dev.router.recover_panics);

        let prod = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.router.recover_panics);
    }

    #[test]
    fn test_loader_toml_file() {
        let file = file(
            ".toml",
            "[router]\nrecover_panics = false\nnot_found_message = \"no such route\"\n",
        );
        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

        assert!(!config.router.recover_panics);
        assert_eq!(config.router.not_found_message, "no such route");
        assert_eq!(config.logging, crate::LoggingConfig::default());
    }

    #[test]
    fn test_loader_json_file() {
        let file = file(
            ".JSON",
            r#"{"router": {"error_format": "json"}, "metrics": {"enabled": false}}"#,
        );
        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

        assert_eq!(config.router.error_format, ErrorFormat::Json);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_loader_rejects_unknown_section() {
        let file = file(".toml", "[server]\nport = 80\n");
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn test_loader_unsupported_extension() {
        let file = file(".ini", "");
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_loader_missing_file() {
        let result = ConfigLoader::new().with_file("/nonexistent/waymark.toml");
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));

        let config = ConfigLoader::new()
            .with_production()
            .with_optional_file("/nonexistent/waymark.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, WaymarkConfig::production());
    }

    #[test]
    fn test_loader_validates_file_values() {
        let file = file(".toml", "[router]\nnot_found_message = \" \"\n");
        let result = ConfigLoader::new().with_file(file.path()).unwrap().load();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "router.not_found_message", .. })
        ));
    }

    #[test]
    fn test_flag() {
        assert!(flag("X", "true").unwrap());
        assert!(flag("X", "ON").unwrap());
        assert!(!flag("X", "0").unwrap());
        assert!(!flag("X", "no").unwrap());
        assert!(matches!(flag("X", "maybe"), Err(ConfigError::Env { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = WaymarkConfig::default();
        apply_env(
            &mut config,
            "WAYMARK",
            vars(&[
                ("WAYMARK__ROUTER__ERROR_FORMAT", "JSON"),
                ("WAYMARK__ROUTER__RECOVER_PANICS", "off"),
                ("WAYMARK__LOGGING__FORMAT", "pretty"),
                ("WAYMARK__METRICS__DURATION_BUCKETS", "0.001, 0.01,0.1"),
                ("WAYMARK__SERVER__PORT", "8080"),
                ("OTHER__ROUTER__ERROR_FORMAT", "bogus"),
                ("WAYMARKER__ROUTER__ERROR_FORMAT", "bogus"),
            ]),
        )
        .unwrap();

        assert_eq!(config.router.error_format, ErrorFormat::Json);
        assert!(!config.router.recover_panics);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.metrics.duration_buckets, vec![0.001, 0.01, 0.1]);
    }

    #[test]
    fn test_env_override_errors_name_the_variable() {
        let mut config = WaymarkConfig::default();
        let err = apply_env(
            &mut config,
            "WAYMARK",
            vars(&[("WAYMARK__METRICS__DURATION_BUCKETS", "0.1,fast")]),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("WAYMARK__METRICS__DURATION_BUCKETS"));

        let err = apply_env(
            &mut config,
            "WAYMARK",
            vars(&[("WAYMARK__LOGGING__ENABLED", "sometimes")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));
    }
}
