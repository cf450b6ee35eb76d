//! Middleware layer.
//!
//! Middleware wraps every request the router sees, matched or not, and is
//! the place for cross-cutting concerns: access logging, request ids,
//! authentication-header inspection.
//!
//! A middleware receives the [`Request`] and a [`Next`] continuation. Calling
//! [`Next::run`] invokes the rest of the chain and finally the route handler:
//!
//! ```rust,no_run
//! use tsu::{Request, Response, Router};
//! use tsu::middleware::Next;
//!
//! async fn timing(req: Request, next: Next) -> Response {
//!     let start = std::time::Instant::now();
//!     let res = next.run(req).await;
//!     tracing::debug!(elapsed = ?start.elapsed(), "handled");
//!     res
//! }
//!
//! async fn hello(_req: Request) -> &'static str { "hello" }
//!
//! let app = Router::new().wrap(timing).get("/", hello);
//! ```
//!
//! Middleware registered first runs outermost.
//!
//! Built-in middleware:
//! - [`logger`] — templated access log, one line per request

use std::future::Future;
use std::sync::Arc;

use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;

pub use crate::handler::BoxFuture;

pub mod logger;

/// Implemented by everything [`Router::wrap`](crate::Router::wrap) accepts.
///
/// Any `async fn(Request, Next) -> Response` qualifies through the blanket
/// impl; stateful middleware such as [`logger::Logger`] implements it
/// directly.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self)(req, next))
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the middleware chain plus the route handler.
pub struct Next {
    chain: Arc<[BoxedMiddleware]>,
    index: usize,
    handler: BoxedHandler,
}

impl Next {
    pub(crate) fn new(chain: Arc<[BoxedMiddleware]>, handler: BoxedHandler) -> Self {
        Self { chain, index: 0, handler }
    }

    /// Runs the rest of the chain to completion and returns its response.
    pub async fn run(self, req: Request) -> Response {
        match self.chain.get(self.index).map(Arc::clone) {
            Some(middleware) => {
                let next = Self { index: self.index + 1, ..self };
                middleware.call(req, next).await
            }
            None => self.handler.call(req).await,
        }
    }
}
