//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Every route remembers the
//! pattern it was registered under, so middleware can report `/users/{id}`
//! rather than `/users/42`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{self, BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Address reported for requests dispatched through [`Router::oneshot`].
const ONESHOT_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
    0,
);

struct Route {
    pattern: Arc<str>,
    handler: BoxedHandler,
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every builder method returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
    middleware: Arc<[BoxedMiddleware]>,
    fallback: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            middleware: Arc::new([]),
            fallback: handler::not_found.into_boxed_handler(),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use tsu::{Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup, so this is a
    /// programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        let route = Route { pattern: Arc::from(path), handler: handler.into_boxed_handler() };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Wraps every request — matched or not — in `middleware`.
    ///
    /// The first middleware registered is the outermost one.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        let added: BoxedMiddleware = Arc::new(middleware);
        self.middleware = self.middleware.iter().cloned().chain([added]).collect();
        self
    }

    /// Dispatches one request in-process, without a socket.
    ///
    /// The request goes through routing and the whole middleware chain
    /// exactly as it would under [`Server`](crate::Server); the remote
    /// address is reported as `0.0.0.0:0`. Meant for tests.
    pub async fn oneshot<B: Into<Bytes>>(&self, req: http::Request<B>) -> Response {
        let (parts, body) = req.into_parts();
        self.dispatch(parts, body.into(), ONESHOT_ADDR).await
    }

    /// Core hot path: routes one request and runs it through the chain.
    pub(crate) async fn dispatch(
        &self,
        parts: http::request::Parts,
        body: Bytes,
        remote_addr: SocketAddr,
    ) -> Response {
        let (handler, req) = match self.lookup(&parts.method, parts.uri.path()) {
            Some((route, params)) => {
                let handler = Arc::clone(&route.handler);
                let pattern = Arc::clone(&route.pattern);
                (handler, Request::new(parts, body, remote_addr, Some(pattern), params))
            }
            None => {
                let handler = Arc::clone(&self.fallback);
                (handler, Request::new(parts, body, remote_addr, None, HashMap::new()))
            }
        };

        Next::new(Arc::clone(&self.middleware), handler).run(req).await
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    async fn show_route(req: Request) -> String {
        format!("{}|{}", req.route().unwrap_or("-"), req.param("id").unwrap_or("-"))
    }

    #[tokio::test]
    async fn matched_route_carries_pattern_and_params() {
        let app = Router::new().get("/users/{id}", show_route);
        let res = app
            .oneshot(http::Request::get("/users/42").body(Bytes::new()).unwrap())
            .await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"/users/{id}|42");
    }

    #[tokio::test]
    async fn unmatched_route_falls_back_to_404() {
        let app = Router::new().get("/users/{id}", show_route);
        let res = app
            .oneshot(http::Request::post("/users/42").body(Bytes::new()).unwrap())
            .await;

        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn middleware_runs_outermost_first() {
        async fn outer(req: Request, next: Next) -> Response {
            let res = next.run(req).await;
            let body = format!("outer({})", String::from_utf8_lossy(res.body()));
            Response::text(body)
        }
        async fn inner(req: Request, next: Next) -> Response {
            let res = next.run(req).await;
            let body = format!("inner({})", String::from_utf8_lossy(res.body()));
            Response::text(body)
        }
        async fn leaf(_req: Request) -> &'static str { "leaf" }

        let app = Router::new().wrap(outer).wrap(inner).get("/", leaf);
        let res = app.oneshot(http::Request::get("/").body("").unwrap()).await;

        assert_eq!(res.body().as_ref(), b"outer(inner(leaf))");
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        async fn h(_req: Request) -> &'static str { "" }
        let _ = Router::new().get("/a/{x}", h).get("/a/{y}", h);
    }
}
