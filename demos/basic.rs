//! Minimal tsu example — JSON endpoints behind the access logger.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42
//!   curl http://localhost:3000/healthz      # not logged
//!
//! Set `COMBINED=1` for Apache combined log lines and `LOG_STDOUT=1` to
//! send them to standard output instead of standard error.

use tsu::middleware::logger::{Config, Logger, Output};
use tsu::{Request, Response, Router, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let combined = std::env::var_os("COMBINED").is_some();
    let output = if std::env::var_os("LOG_STDOUT").is_some() {
        Output::stdout()
    } else {
        Output::stderr()
    };
    let logger = Logger::new(
        Config::new()
            .combined(combined)
            .sink(output)
            .filter(|req| req.path() == "/healthz"),
    );

    let app = Router::new()
        .wrap(logger)
        .get("/users/{id}",    get_user)
        .post("/users",        create_user)
        .delete("/users/{id}", delete_user)
        .get("/healthz",       healthz);

    if let Err(e) = Server::bind("0.0.0.0:3000").serve(app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// POST /users — an empty body becomes a 500 carrying "empty body" for `${error}`.
async fn create_user(req: Request) -> Result<Response, &'static str> {
    if req.body().is_empty() {
        return Err("empty body");
    }
    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#))
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn healthz(_req: Request) -> &'static str {
    "ok"
}
