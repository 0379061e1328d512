//! The router: registration and dispatch over per-method tries.
//!
//! All state lives behind one `parking_lot::RwLock`. Registration takes the
//! write lock for its whole duration; dispatch holds the read lock from
//! lookup until the handler (or the aborting middleware) returns, so
//! concurrent dispatches never block each other.
//!
//! Handlers and middleware may call the read-only accessors (`resolve`,
//! `allowed_methods`, `len`) on the router dispatching them; those take the
//! lock recursively. They must not register or dispatch on it, since that
//! would wait behind a queued writer while holding the read lock.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::Method;
use parking_lot::RwLock;
use waymark_config::RouterConfig;
use waymark_telemetry::{record_dispatch, DispatchOutcome};

use crate::error::{DispatchError, RouteError};
use crate::middleware::{insert_sorted, Middleware, MiddlewareEntry};
use crate::node::{parse_pattern, split_path, Node, Resolved};
use crate::params::Params;
use crate::types::{Request, Response};

/// State guarded by the router lock.
#[derive(Default)]
struct RouteTable {
    /// One root per registered method.
    routes: HashMap<Method, Node>,

    /// Scope `""`, sorted by `(priority, seq)`.
    global: Vec<Arc<MiddlewareEntry>>,

    /// Handler-less trie holding every scoped attachment. New method roots
    /// start as a clone of it.
    scope_template: Node,

    /// Next middleware sequence number.
    next_seq: u64,

    route_count: usize,
}

/// A resolved route, detached from the router lock.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Pattern the matched handler was registered with.
    pub pattern: String,
    /// Captured parameters.
    pub params: Params,
    /// Middleware that would run, in execution order (global first).
    pub middleware: Vec<Arc<MiddlewareEntry>>,
}

/// In-process HTTP router.
///
/// Routes are kept in one trie per method. Middleware attaches globally
/// (scope `""`), to every method root (scope `"/"`) or to the node a scope
/// pattern names.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use http::StatusCode;
/// use http_body_util::Full;
/// use waymark_router::{MiddlewareError, FnMiddleware, Request, Response, ResponseExt, Router};
///
/// let router = Router::new();
/// router
///     .get("/items/:id", |_req, params| {
///         Response::text(format!("item {}", params.get("id").unwrap_or_default()))
///     })
///     .unwrap();
/// router
///     .use_middleware("/items", 0, FnMiddleware::new("auth", |req, _params| {
///         if req.headers().contains_key("authorization") {
///             Ok(())
///         } else {
///             Err(MiddlewareError::unauthorized("login required"))
///         }
///     }))
///     .unwrap();
///
/// let request = http::Request::builder()
///     .uri("/items/42")
///     .body(Full::new(Bytes::new()))
///     .unwrap();
/// assert_eq!(router.dispatch(&request).status(), StatusCode::UNAUTHORIZED);
/// ```
pub struct Router {
    table: RwLock<RouteTable>,
    config: RouterConfig,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an empty router with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates an empty router with the given configuration.
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            table: RwLock::new(RouteTable::default()),
            config,
        }
    }

    /// Returns the router configuration.
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Registers a handler for `method` and `path`.
    ///
    /// `path` segments are literals or parameters (`:name` or `{name}`).
    /// Leading and trailing `/` are ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if the pattern is malformed
    /// - `ParamConflict` if a tier already has a differently named parameter
    /// - `DuplicateRoute` if the method and pattern are already registered
    ///
    /// Nothing is modified when an error is returned.
    pub fn route<H>(&self, method: Method, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&Request, &Params) -> Response + Send + Sync + 'static,
    {
        let segments = parse_pattern(path)?;

        let mut table = self.table.write();
        let RouteTable {
            routes,
            scope_template,
            route_count,
            ..
        } = &mut *table;

        match routes.get(&method) {
            Some(root) => root.check(&segments, path)?,
            None => scope_template.check(&segments, path)?,
        }

        let root = routes
            .entry(method.clone())
            .or_insert_with(|| scope_template.clone());
        if !root.entry(&segments).set_handler(path, Arc::new(handler)) {
            return Err(RouteError::DuplicateRoute {
                method,
                path: path.to_string(),
            });
        }
        *route_count += 1;
        drop(table);

        tracing::debug!(http.method = %method, http.path = path, "route registered");
        Ok(())
    }

    /// Registers a `GET` handler.
    pub fn get<H>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&Request, &Params) -> Response + Send + Sync + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    /// Registers a `POST` handler.
    pub fn post<H>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&Request, &Params) -> Response + Send + Sync + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    /// Registers a `PUT` handler.
    pub fn put<H>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&Request, &Params) -> Response + Send + Sync + 'static,
    {
        self.route(Method::PUT, path, handler)
    }

    /// Registers a `DELETE` handler.
    pub fn delete<H>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&Request, &Params) -> Response + Send + Sync + 'static,
    {
        self.route(Method::DELETE, path, handler)
    }

    /// Registers a `PATCH` handler.
    pub fn patch<H>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&Request, &Params) -> Response + Send + Sync + 'static,
    {
        self.route(Method::PATCH, path, handler)
    }

    /// Registers an `OPTIONS` handler.
    pub fn options<H>(&self, path: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(&Request, &Params) -> Response + Send + Sync + 'static,
    {
        self.route(Method::OPTIONS, path, handler)
    }

    /// Attaches a middleware.
    ///
    /// - `""`: global, runs first for every matched request
    /// - `"/"`: attached to every method root, present and future
    /// - anything else: parsed like a route pattern and attached to the node
    ///   it names in every method trie, present and future
    ///
    /// Lower `priority` runs earlier; equal priorities run in registration
    /// order. Registering before or after the covered routes is equivalent.
    ///
    /// # Errors
    ///
    /// `InvalidPath` or `ParamConflict`, with nothing modified.
    pub fn use_middleware<M>(&self, scope: &str, priority: i32, middleware: M) -> Result<(), RouteError>
    where
        M: Middleware,
    {
        let segments = if scope.is_empty() {
            None
        } else {
            Some(parse_pattern(scope)?)
        };

        let mut table = self.table.write();
        let RouteTable {
            routes,
            global,
            scope_template,
            next_seq,
            ..
        } = &mut *table;

        if let Some(segments) = &segments {
            scope_template.check(segments, scope)?;
            for root in routes.values() {
                root.check(segments, scope)?;
            }
        }

        let entry = Arc::new(MiddlewareEntry::new(
            scope,
            priority,
            *next_seq,
            Arc::new(middleware),
        ));
        *next_seq += 1;

        match &segments {
            None => insert_sorted(global, entry),
            Some(segments) => {
                scope_template.attach(segments, Arc::clone(&entry));
                for root in routes.values_mut() {
                    root.attach(segments, Arc::clone(&entry));
                }
            }
        }
        drop(table);

        tracing::debug!(scope, priority, "middleware attached");
        Ok(())
    }

    /// Resolves a method and path without running anything.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let table = self.table.read_recursive();
        let resolved = table.routes.get(method)?.resolve(&split_path(path))?;

        let middleware = table
            .global
            .iter()
            .chain(resolved.middleware.iter().copied())
            .cloned()
            .collect();

        Some(RouteMatch {
            pattern: resolved.pattern.to_string(),
            params: resolved.params,
            middleware,
        })
    }

    /// Methods with a handler matching `path`, sorted by name.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let segments = split_path(path);
        let table = self.table.read_recursive();

        let mut methods: Vec<Method> = table
            .routes
            .iter()
            .filter(|(_, root)| root.resolve(&segments).is_some())
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Number of registered routes across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read_recursive().route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispatches a request and renders any failure as a response.
    pub fn dispatch(&self, request: &Request) -> Response {
        match self.try_dispatch(request) {
            Ok(response) => response,
            Err(err) => err.into_response(&self.config),
        }
    }

    /// Dispatches a request.
    ///
    /// Runs global middleware, then the matched route's middleware, then
    /// the handler. Not-found requests run nothing.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the method has no root or the path does not resolve
    /// - `MiddlewareAbort` with the first middleware error
    /// - `HandlerPanic` if a middleware or the handler panicked and
    ///   `recover_panics` is enabled
    pub fn try_dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        let start = Instant::now();
        let result = self.dispatch_locked(request);

        let outcome = match &result {
            Ok(_) => DispatchOutcome::Matched,
            Err(DispatchError::NotFound { .. }) => DispatchOutcome::NotFound,
            Err(DispatchError::MiddlewareAbort(_)) => DispatchOutcome::Aborted,
            Err(DispatchError::HandlerPanic { .. }) => DispatchOutcome::Panicked,
        };
        record_dispatch(request.method().as_str(), outcome, start.elapsed());

        result
    }

    fn dispatch_locked(&self, request: &Request) -> Result<Response, DispatchError> {
        let method = request.method();
        let path = request.uri().path();

        let table = self.table.read();
        let Some(resolved) = table
            .routes
            .get(method)
            .and_then(|root| root.resolve(&split_path(path)))
        else {
            tracing::debug!(http.method = %method, http.path = path, "no route matched");
            return Err(DispatchError::NotFound {
                method: method.clone(),
                path: path.to_string(),
            });
        };

        if !self.config.recover_panics {
            return run_chain(request, &table.global, &resolved);
        }

        match panic::catch_unwind(AssertUnwindSafe(|| {
            run_chain(request, &table.global, &resolved)
        })) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    http.method = %method,
                    http.path = path,
                    error = %message,
                    "panic during dispatch"
                );
                Err(DispatchError::HandlerPanic { message })
            }
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read_recursive();
        let mut methods: Vec<&str> = table.routes.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("Router")
            .field("methods", &methods)
            .field("routes", &table.route_count)
            .field("global_middleware", &table.global.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Global middleware, then route middleware, then the handler.
fn run_chain(
    request: &Request,
    global: &[Arc<MiddlewareEntry>],
    resolved: &Resolved<'_>,
) -> Result<Response, DispatchError> {
    for entry in global.iter().chain(resolved.middleware.iter().copied()) {
        if let Err(err) = entry.run(request, &resolved.params) {
            tracing::warn!(
                http.method = %request.method(),
                http.path = request.uri().path(),
                http.status_code = err.status.as_u16(),
                scope = entry.scope(),
                priority = entry.priority(),
                middleware = entry.name(),
                "middleware aborted dispatch"
            );
            return Err(DispatchError::MiddlewareAbort(err));
        }
    }
    Ok((resolved.handler)(request, &resolved.params))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
