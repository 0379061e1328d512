//! # Waymark
//!
//! **In-process HTTP request router with scoped, priority-ordered middleware**
//!
//! Waymark sits inside a host HTTP server. Given a request it finds the
//! registered handler in a per-method segment trie, captures path
//! parameters, runs the middleware that applies to the matched route and
//! calls the handler.
//!
//! - **Router**: [`Router`] with `get`/`post`/... registration,
//!   [`use_middleware`](Router::use_middleware) and synchronous
//!   [`dispatch`](Router::dispatch)
//! - **Configuration**: [`WaymarkConfig`] loaded from TOML/JSON and
//!   `WAYMARK__*` environment variables
//! - **Telemetry**: `tracing` logs and Prometheus dispatch metrics
//! - **Hyper integration**: [`RouterService`] mounts a router on a `hyper`
//!   connection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use waymark::prelude::*;
//!
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("waymark.toml")?
//!     .with_env_prefix("WAYMARK")
//!     .load()?;
//! let router = waymark::init(&config)?;
//!
//! router.get("/items/:id", |_req, params| {
//!     Response::text(format!("item {}", params.get("id").unwrap_or_default()))
//! })?;
//! router.get("/metrics", waymark::metrics_handler)?;
//!
//! // hand RouterService::new(Arc::new(router)) to hyper's serve_connection
//! ```
//!
//! ## Dispatch
//!
//! ```text
//! Request → method root → trie resolve → global middleware → route middleware → handler
//!                 │              │                 │                  │
//!                404            404        status + message   status + message
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod service;

pub use error::{Error, Result};
pub use service::RouterService;

pub use waymark_config as config;
pub use waymark_router as router;
pub use waymark_telemetry as telemetry;

pub use waymark_config::{ConfigLoader, WaymarkConfig};
pub use waymark_router::{
    DispatchError, FnMiddleware, Middleware, MiddlewareError, Params, Request, Response,
    ResponseExt, RouteError, Router,
};

use http::StatusCode;
use waymark_router::error_response;

/// Validates `config`, installs logging and metrics, and builds a router.
///
/// Call once per process; the logging subscriber and metrics recorder are
/// global.
///
/// # Errors
///
/// Returns `Error::Config` if validation fails and `Error::Telemetry` if a
/// subscriber or recorder cannot be installed.
pub fn init(config: &WaymarkConfig) -> Result<Router> {
    config.validate()?;
    waymark_telemetry::init_telemetry(
        &config.logging.to_log_config(),
        &config.metrics.to_metrics_config(),
    )?;

    tracing::info!(
        recover_panics = config.router.recover_panics,
        metrics = config.metrics.enabled,
        "waymark initialized"
    );
    Ok(Router::with_config(config.router.clone()))
}

/// Handler rendering the Prometheus metrics text format.
///
/// Responds `503 Service Unavailable` if metrics were never initialized.
pub fn metrics_handler(_request: &Request, _params: &Params) -> Response {
    match waymark_telemetry::render_metrics() {
        Some(body) => Response::text(body),
        None => error_response(
            waymark_config::ErrorFormat::Text,
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics are not enabled",
        ),
    }
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use waymark::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Error, RouterService};

    pub use waymark_config::{ConfigLoader, ErrorFormat, RouterConfig, WaymarkConfig};

    pub use waymark_router::{
        DispatchError, FnMiddleware, Middleware, MiddlewareError, Params, Request, Response,
        ResponseExt, RouteError, Router,
    };
}
