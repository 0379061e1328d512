//! Request, response and handler types.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;

use crate::params::Params;

/// Request type seen by middleware and handlers.
///
/// The body is already collected; hosts with streaming bodies collect them
/// before dispatch.
pub type Request = http::Request<Full<Bytes>>;

/// Response type produced by handlers and by the router itself.
pub type Response = http::Response<Full<Bytes>>;

/// A registered route handler.
pub type Handler = Arc<dyn Fn(&Request, &Params) -> Response + Send + Sync>;
