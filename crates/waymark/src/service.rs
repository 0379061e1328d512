//! `hyper` service adapter.
//!
//! [`RouterService`] collects the request body, then runs the router's
//! synchronous dispatch. Accepting connections stays with the host:
//!
//! ```rust,ignore
//! let service = RouterService::new(Arc::new(router));
//! loop {
//!     let (stream, _) = listener.accept().await?;
//!     let service = service.clone();
//!     tokio::spawn(async move {
//!         let io = TokioIo::new(stream);
//!         let _ = http1::Builder::new().serve_connection(io, service).await;
//!     });
//! }
//! ```

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::Service;
use waymark_router::{error_response, Request, Response, Router};

/// A `hyper` service dispatching every request through a [`Router`].
#[derive(Clone)]
pub struct RouterService {
    router: Arc<Router>,
}

impl RouterService {
    /// Wraps a shared router.
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// Returns the wrapped router.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }
}

impl From<Router> for RouterService {
    fn from(router: Router) -> Self {
        Self::new(Arc::new(router))
    }
}

impl fmt::Debug for RouterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterService")
            .field("router", &self.router)
            .finish()
    }
}

impl<B> Service<http::Request<B>> for RouterService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: fmt::Display,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: http::Request<B>) -> Self::Future {
        let router = Arc::clone(&self.router);

        Box::pin(async move {
            let (parts, body) = request.into_parts();

            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    tracing::warn!(
                        http.method = %parts.method,
                        http.path = parts.uri.path(),
                        error = %e,
                        "failed to read request body"
                    );
                    return Ok(error_response(
                        router.config().error_format,
                        StatusCode::BAD_REQUEST,
                        "failed to read request body",
                    ));
                }
            };

            let request: Request = http::Request::from_parts(parts, Full::new(bytes));
            Ok(router.dispatch(&request))
        })
    }
}
