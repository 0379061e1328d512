//! Typed configuration for the Waymark router.
//!
//! This crate provides the strongly-typed configuration consumed by
//! `waymark-router` and `waymark-telemetry`:
//! - Development and production presets
//! - TOML and JSON configuration files, rejecting unknown fields
//! - Environment variable overrides, optionally seeded from `.env`
//! - Validation of the loaded values
//!
//! # Overview
//!
//! [`WaymarkConfig`] is the root type. It has three sections:
//!
//! - [`RouterConfig`] - dispatch behavior (panic recovery, 404 body, error format)
//! - [`LoggingConfig`] - structured logging
//! - [`MetricsSettings`] - dispatch metrics recorder
//!
//! # Example
//!
//! ```no_run
//! use waymark_config::ConfigLoader;
//!
//! # fn main() -> Result<(), waymark_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_development()
//!     .with_file("waymark.toml")?
//!     .with_dotenv()
//!     .with_env_prefix("WAYMARK")
//!     .load()?;
//!
//! println!("recover panics: {}", config.router.recover_panics);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [router]
//! recover_panics = true
//! not_found_message = "404 page not found"
//! error_format = "json"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables of the form `PREFIX__SECTION__KEY`:
//!
//! - `WAYMARK__ROUTER__RECOVER_PANICS=false`
//! - `WAYMARK__LOGGING__LEVEL=debug`
//! - `WAYMARK__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::WaymarkConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
