//! Middleware trait and attachment entries.
//!
//! A middleware inspects the request and the resolved parameters and either
//! lets dispatch continue (`Ok(())`) or aborts it with a
//! [`MiddlewareError`], whose status and message become the response.
//! Middleware never sees or wraps the handler's response.
//!
//! # Ordering
//!
//! Every attachment gets a router-wide sequence number. Entries run in
//! ascending `(priority, seq)` order, so lower priorities run first and equal
//! priorities run in registration order.
//!
//! # Example
//!
//! ```
//! use waymark_router::{FnMiddleware, MiddlewareError, Router};
//!
//! let router = Router::new();
//! router
//!     .use_middleware(
//!         "/admin",
//!         10,
//!         FnMiddleware::new("require-token", |req, _params| {
//!             if req.headers().contains_key("x-token") {
//!                 Ok(())
//!             } else {
//!                 Err(MiddlewareError::unauthorized("missing token"))
//!             }
//!         }),
//!     )
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::MiddlewareError;
use crate::params::Params;
use crate::types::Request;

/// A request guard run before the handler.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Inspects the request. Returning an error aborts dispatch.
    fn handle(&self, request: &Request, params: &Params) -> Result<(), MiddlewareError>;
}

/// A middleware built from a closure.
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&Request, &Params) -> Result<(), MiddlewareError> + Send + Sync + 'static,
{
    /// Creates a named function-based middleware.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&Request, &Params) -> Result<(), MiddlewareError> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle(&self, request: &Request, params: &Params) -> Result<(), MiddlewareError> {
        (self.func)(request, params)
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A middleware attached at a scope.
///
/// Immutable once created; shared between the scope template and every
/// method trie it was attached to.
#[derive(Clone)]
pub struct MiddlewareEntry {
    scope: String,
    priority: i32,
    seq: u64,
    middleware: Arc<dyn Middleware>,
}

impl MiddlewareEntry {
    pub(crate) fn new(
        scope: impl Into<String>,
        priority: i32,
        seq: u64,
        middleware: Arc<dyn Middleware>,
    ) -> Self {
        Self {
            scope: scope.into(),
            priority,
            seq,
            middleware,
        }
    }

    /// Scope the entry was registered with (`""` for global).
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Priority; lower runs earlier.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Router-wide registration sequence number.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Name of the wrapped middleware.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.middleware.name()
    }

    /// Ordering key.
    #[must_use]
    pub const fn sort_key(&self) -> (i32, u64) {
        (self.priority, self.seq)
    }

    /// Runs the wrapped middleware.
    pub fn run(&self, request: &Request, params: &Params) -> Result<(), MiddlewareError> {
        self.middleware.handle(request, params)
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("name", &self.name())
            .field("scope", &self.scope)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Inserts `entry` at its sorted position, after every entry with an equal
/// or lower key.
pub(crate) fn insert_sorted(sequence: &mut Vec<Arc<MiddlewareEntry>>, entry: Arc<MiddlewareEntry>) {
    let key = entry.sort_key();
    let at = sequence.partition_point(|existing| existing.sort_key() <= key);
    sequence.insert(at, entry);
}
