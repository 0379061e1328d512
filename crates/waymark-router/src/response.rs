//! Response builders for router-generated responses.
//!
//! Not-found, middleware aborts and recovered panics are rendered either as
//! plain text (message plus newline) or as a JSON envelope:
//!
//! ```json
//! {"error": {"code": "NOT_FOUND", "message": "404 page not found"}}
//! ```

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::StatusCode;
use http_body_util::Full;
use waymark_config::ErrorFormat;

use crate::types::Response;

/// Extension trait for building responses.
pub trait ResponseExt {
    /// Creates a `200 OK` plain text response.
    fn text(body: impl Into<Bytes>) -> Response;

    /// Creates a plain text error response.
    fn error(status: StatusCode, message: &str) -> Response;

    /// Creates a JSON error response.
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn text(body: impl Into<Bytes>) -> Response {
        let mut response = Self::new(Full::new(body.into()));
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    fn error(status: StatusCode, message: &str) -> Response {
        let mut response = Self::new(Full::new(Bytes::from(format!("{message}\n"))));
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        response
    }

    fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        let mut response = Self::new(Full::new(Bytes::from(body.to_string())));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// Renders an error in the given format.
#[must_use]
pub fn error_response(format: ErrorFormat, status: StatusCode, message: &str) -> Response {
    match format {
        ErrorFormat::Text => Response::error(status, message),
        ErrorFormat::Json => Response::json_error(status, &error_code(status), message),
    }
}

/// Machine-readable code for a status, e.g. `TOO_MANY_REQUESTS`.
#[must_use]
pub fn error_code(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect(),
        None => format!("HTTP_{}", status.as_u16()),
    }
}
