//! # tsu
//!
//! A minimal HTTP framework for Rust services, with a templated access log.
//!
//! - Radix-tree routing — O(path-length) lookup via [`matchit`]
//! - Middleware — `async fn(Request, Next) -> Response`, outermost first
//! - Access log — [`middleware::logger`], one formatted line per request
//! - Graceful shutdown — SIGTERM / Ctrl-C, drains in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tsu::{Method, Request, Response, Router, Server, StatusCode};
//! use tsu::middleware::logger::{Config, Logger};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .wrap(Logger::new(Config::new().combined(true)))
//!         .on(Method::GET,  "/users/{id}", get_user)
//!         .on(Method::POST, "/users",      create_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(r#"{"id":"99"}"#)
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use http::{Method, StatusCode};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
