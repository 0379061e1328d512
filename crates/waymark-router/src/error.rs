//! Error types for registration and dispatch.
//!
//! - [`RouteError`]: returned by `route`, the per-verb helpers and
//!   `use_middleware` when a pattern is malformed or would make the trie
//!   ambiguous.
//! - [`MiddlewareError`]: the abort outcome of a middleware.
//! - [`DispatchError`]: why a dispatch did not produce a handler response.

use http::{Method, StatusCode};
use thiserror::Error;
use waymark_config::RouterConfig;

use crate::response::error_response;
use crate::types::Response;

/// Registration failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A handler is already registered for this method and pattern.
    #[error("route already registered: {method} {path}")]
    DuplicateRoute {
        /// Route method.
        method: Method,
        /// Registered pattern.
        path: String,
    },

    /// The pattern names a parameter at a tier that already has a
    /// parameter with a different name.
    #[error("parameter '{conflicting}' in '{path}' conflicts with existing parameter '{existing}'")]
    ParamConflict {
        /// Pattern being registered.
        path: String,
        /// Name already present at that tier.
        existing: String,
        /// Name the pattern tried to use.
        conflicting: String,
    },

    /// The pattern cannot be parsed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// Offending pattern.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl RouteError {
    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a parameter conflict error.
    pub fn param_conflict(
        path: impl Into<String>,
        existing: impl Into<String>,
        conflicting: impl Into<String>,
    ) -> Self {
        Self::ParamConflict {
            path: path.into(),
            existing: existing.into(),
            conflicting: conflicting.into(),
        }
    }
}

/// Structured failure returned by a middleware to abort the chain.
///
/// The status and message become the response.
///
/// # Example
///
/// ```
/// use waymark_router::MiddlewareError;
/// use http::StatusCode;
///
/// let err = MiddlewareError::unauthorized("missing token");
/// assert_eq!(err.status, StatusCode::UNAUTHORIZED);
/// assert_eq!(err.message, "missing token");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {message}")]
pub struct MiddlewareError {
    /// Response status.
    pub status: StatusCode,
    /// Response message.
    pub message: String,
}

impl MiddlewareError {
    /// Creates an error with an arbitrary status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403 Forbidden.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 429 Too Many Requests.
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    /// 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

/// Why a dispatch ended without a handler response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No root for the method, or the path did not resolve to a handler.
    #[error("no route for {method} {path}")]
    NotFound {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },

    /// A middleware aborted the chain.
    #[error("middleware aborted dispatch: {0}")]
    MiddlewareAbort(#[from] MiddlewareError),

    /// A middleware or the handler panicked and the panic was recovered.
    #[error("handler panicked: {message}")]
    HandlerPanic {
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl DispatchError {
    /// Status code of the rendered response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MiddlewareAbort(err) => err.status,
            Self::HandlerPanic { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error in the configured format.
    ///
    /// Panic messages are never written to the response body.
    #[must_use]
    pub fn into_response(self, config: &RouterConfig) -> Response {
        let status = self.status();
        match self {
            Self::NotFound { .. } => {
                error_response(config.error_format, status, &config.not_found_message)
            }
            Self::MiddlewareAbort(err) => error_response(config.error_format, status, &err.message),
            Self::HandlerPanic { .. } => error_response(
                config.error_format,
                status,
                status.canonical_reason().unwrap_or("Internal Server Error"),
            ),
        }
    }
}
