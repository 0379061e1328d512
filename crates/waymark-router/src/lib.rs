//! Per-segment trie router with scoped, priority-ordered middleware.
//!
//! Given a request method and path, the router finds the registered
//! handler, captures path parameters, runs the middleware that applies to
//! the matched route, then calls the handler.
//!
//! # Features
//!
//! - **One trie per method**: each path segment is a node, literal children
//!   are binary searched, and each tier has at most one parameter child
//! - **Path parameters**: `:name` or `{name}` capture one segment
//! - **Literal precedence**: `/items/new` wins over `/items/:id`; a matched
//!   literal is never revisited
//! - **Scoped middleware**: global (`""`), every root (`"/"`) or any
//!   subtree (`"/admin"`), ordered by priority then registration
//! - **Concurrent**: registration and dispatch take `&self`; dispatches run
//!   in parallel under a read lock
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use http::{Method, StatusCode};
//! use http_body_util::Full;
//! use waymark_router::{Request, Response, ResponseExt, Router};
//!
//! let router = Router::new();
//! router
//!     .get("/items/:id", |_req, params| {
//!         Response::text(params.get("id").unwrap_or_default().to_string())
//!     })
//!     .unwrap();
//!
//! let matched = router.resolve(&Method::GET, "/items/42").unwrap();
//! assert_eq!(matched.params.get("id"), Some("42"));
//!
//! let request = http::Request::builder()
//!     .uri("/items/42/extra")
//!     .body(Full::new(Bytes::new()))
//!     .unwrap();
//! assert_eq!(router.dispatch(&request).status(), StatusCode::NOT_FOUND);
//! ```
//!
//! # Dispatch order
//!
//! ```text
//! method root? ──no──► 404
//!      │
//! resolve path ──no──► 404
//!      │
//! global middleware (priority, seq) ──Err──► status + message
//!      │
//! route middleware, root to terminal, merged by (priority, seq) ──Err──► status + message
//!      │
//! handler
//! ```

mod error;
mod middleware;
mod node;
mod params;
pub mod response;
mod router;
mod types;

pub use error::{DispatchError, MiddlewareError, RouteError};
pub use middleware::{FnMiddleware, Middleware, MiddlewareEntry};
pub use node::{parse_pattern, split_path, Segment};
pub use params::Params;
pub use response::{error_response, ResponseExt};
pub use router::{RouteMatch, Router};
pub use types::{Handler, Request, Response};
