//! Access-log middleware.
//!
//! Writes one line per request, built from a `${tag}` template:
//!
//! ```rust,no_run
//! use tsu::Router;
//! use tsu::middleware::logger::{Config, Logger};
//!
//! # async fn hello(_req: tsu::Request) -> &'static str { "hello" }
//! let app = Router::new()
//!     .wrap(Logger::new(
//!         Config::new()
//!             .format("${ip} ${method} ${route} ${status} ${latency}\n")
//!             .filter(|req| req.path() == "/healthz"),
//!     ))
//!     .get("/", hello);
//! ```
//!
//! # Tags
//!
//! | Tag | Value |
//! |---|---|
//! | `time` | cached timestamp, see [`Config::time_format`] |
//! | `ip` / `ips` | peer address / raw `X-Forwarded-For` |
//! | `method`, `path`, `url`, `host`, `protocol` | request line and host |
//! | `route` | registered route pattern, e.g. `/users/{id}` |
//! | `status`, `latency`, `error` | outcome of the handler |
//! | `body`, `bytes-received`, `bytes-sent` | request body, request/response sizes |
//! | `referer`, `user-agent`, `request-protocol` | as used by the combined format |
//! | `header:<K>`, `query:<K>`, `form:<K>`, `cookie:<K>` | request lookups |
//!
//! Unknown tags render as nothing. A `${` without a closing `}` is printed
//! as-is.
//!
//! Logging never affects the response: render problems are appended to the
//! line itself and sink write failures go to `tracing`.

mod pool;
mod render;
mod tag;
mod template;
mod timestamp;

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use http::StatusCode;
use tracing::{error, warn};

use self::pool::BufferPool;
use self::render::Renderer;
use self::tag::{Exchange, Resolver};
use self::template::Template;
use self::timestamp::Timestamp;
use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// `${time} ${method} ${path} - ${ip} - ${status} - ${latency}\n`
pub const DEFAULT_FORMAT: &str = "${time} ${method} ${path} - ${ip} - ${status} - ${latency}\n";
/// `15:04:05`-style wall clock.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";
/// Apache combined log format.
///
/// The two `-` after the address are the RFC 1413 identity and the
/// authenticated user, neither of which is known here.
pub const COMBINED_FORMAT: &str = "${ip} - - [${time}] \"${method} ${url} ${request-protocol}\" ${status} ${bytes-sent} ${referer} ${user-agent}\n";
/// `10/Oct/2000:13:55:36 -0700`
pub const COMBINED_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Status logged when the handler never finished (client went away, panic).
const UNFINISHED_STATUS: u16 = 499;
const POOL_SIZE: usize = 64;

type Filter = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

// ── Output ────────────────────────────────────────────────────────────────────

/// Where log lines go.
///
/// Each line is written with a single `write_all` while holding a lock, so
/// lines from concurrent requests never interleave.
pub struct Output(Mutex<Box<dyn Write + Send>>);

impl Output {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self(Mutex::new(Box::new(writer)))
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut writer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line)?;
        writer.flush()
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Output(..)")
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

/// Logger settings. Every field is optional; see the setters for defaults.
#[derive(Default)]
pub struct Config {
    filter: Option<Filter>,
    format: Option<String>,
    time_format: Option<String>,
    output: Option<Output>,
    combined: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests for which `filter` returns `true` are not logged at all.
    /// The handler still runs.
    pub fn filter(mut self, filter: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Line template. Default: [`DEFAULT_FORMAT`], or [`COMBINED_FORMAT`]
    /// with [`combined`](Config::combined). An explicit format always wins.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// `strftime` layout for `${time}` (see [`chrono::format::strftime`]).
    /// Default: [`DEFAULT_TIME_FORMAT`], or [`COMBINED_TIME_FORMAT`] with
    /// [`combined`](Config::combined). A layout `chrono` rejects falls back
    /// to the default.
    pub fn time_format(mut self, layout: impl Into<String>) -> Self {
        self.time_format = Some(layout.into());
        self
    }

    /// Destination for log lines. Default: standard error.
    pub fn output(self, writer: impl Write + Send + 'static) -> Self {
        self.sink(Output::new(writer))
    }

    /// Like [`output`](Config::output), for a ready-made [`Output`] such as
    /// [`Output::stdout`].
    pub fn sink(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    /// Use the Apache combined log format for whichever of format and time
    /// format were not set explicitly, and print `-` for a missing Referer or
    /// User-Agent.
    pub fn combined(mut self, combined: bool) -> Self {
        self.combined = combined;
        self
    }
}

// ── Logger ────────────────────────────────────────────────────────────────────

/// The access-log middleware. Register it with [`Router::wrap`](crate::Router::wrap).
///
/// Cloning is cheap; clones share the template, buffers, clock and output.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    filter: Option<Filter>,
    renderer: Renderer,
    pool: BufferPool,
    output: Output,
}

impl Logger {
    pub fn new(config: Config) -> Self {
        let Config { filter, format, time_format, output, combined } = config;

        let (default_format, default_time_format) = if combined {
            (COMBINED_FORMAT, COMBINED_TIME_FORMAT)
        } else {
            (DEFAULT_FORMAT, DEFAULT_TIME_FORMAT)
        };
        let format = format.unwrap_or_else(|| default_format.to_owned());
        let mut time_format = time_format.unwrap_or_else(|| default_time_format.to_owned());
        if !timestamp::is_valid_layout(&time_format) {
            warn!(layout = %time_format, fallback = default_time_format, "invalid access log time format");
            time_format = default_time_format.to_owned();
        }

        let template = Template::new(&format, "${", "}");
        let timestamp = template.has_tag("time").then(|| Timestamp::start(time_format));
        let renderer = Renderer::new(&template, Resolver::new(timestamp, combined));

        Self {
            inner: Arc::new(Inner {
                filter,
                renderer,
                pool: BufferPool::new(POOL_SIZE),
                output: output.unwrap_or_default(),
            }),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Middleware for Logger {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            if inner.filter.as_ref().is_some_and(|skip| skip(&req)) {
                return next.run(req).await;
            }

            let pending = Pending { inner, req: Some(req.clone()), start: Instant::now() };
            let res = next.run(req).await;
            pending.finish(&res);
            res
        })
    }
}

impl Inner {
    fn log(&self, req: &Request, res: &Response, latency: Duration) {
        let mut buf = self.pool.get();
        if let Err(e) = self.renderer.render(&Exchange { req, res }, latency, &mut buf) {
            buf.extend_from_slice(e.to_string().as_bytes());
        }
        if let Err(e) = self.output.write_line(&buf) {
            error!(error = %e, "failed to write access log line");
        }
    }
}

/// A request whose line has not been written yet.
///
/// Dropped without [`finish`](Pending::finish) means the handler future was
/// cancelled or panicked; the line is still written, with status 499.
struct Pending {
    inner: Arc<Inner>,
    req: Option<Request>,
    start: Instant,
}

impl Pending {
    fn finish(mut self, res: &Response) {
        let stop = Instant::now();
        if let Some(req) = self.req.take() {
            self.inner.log(&req, res, stop.duration_since(self.start));
        }
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        let stop = Instant::now();
        if let Some(req) = self.req.take() {
            let status = StatusCode::from_u16(UNFINISHED_STATUS).unwrap_or(StatusCode::BAD_REQUEST);
            self.inner.log(&req, &Response::status(status), stop.duration_since(self.start));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_fills_only_unset_fields() {
        let config = Config::new().combined(true).format("${status}\n");
        assert!(config.combined);
        assert_eq!(config.format.as_deref(), Some("${status}\n"));
        assert_eq!(config.time_format, None);
    }

    #[test]
    fn output_writes_whole_lines() {
        #[derive(Clone, Default)]
        struct Sink(Arc<Mutex<Vec<u8>>>);
        impl Write for Sink {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> { Ok(()) }
        }

        let sink = Sink::default();
        let output = Output::new(sink.clone());
        output.write_line(b"one\n").unwrap();
        output.write_line(b"two\n").unwrap();
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"one\ntwo\n");
    }

    #[test]
    fn sink_takes_a_prebuilt_output() {
        let config = Config::new().sink(Output::stdout());
        assert!(config.output.is_some());

        let config = Config::new().sink(Output::stderr()).output(io::sink());
        assert!(config.output.is_some());
    }

    #[test]
    fn clock_runs_only_when_time_is_rendered() {
        let without = Logger::new(Config::new().format("${method}\n"));
        assert!(!without.inner.renderer.has_clock());

        let literal = Logger::new(Config::new().format("time\n"));
        assert!(!literal.inner.renderer.has_clock());

        let default = Logger::new(Config::new());
        assert!(default.inner.renderer.has_clock());

        let combined = Logger::new(Config::new().combined(true));
        assert!(combined.inner.renderer.has_clock());
    }
}
