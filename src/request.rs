//! Incoming HTTP request type.

use std::borrow::Cow;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderMap};
use http::{Method, Uri, Version};

/// An incoming HTTP request: head, fully collected body, and routing result.
///
/// Cloning is one atomic increment. Middleware that needs to look at the
/// request after the handler has consumed it (the access logger, for one)
/// keeps a clone.
#[derive(Clone)]
pub struct Request {
    inner: Arc<Inner>,
}

struct Inner {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: SocketAddr,
    route: Option<Arc<str>>,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        parts: http::request::Parts,
        body: Bytes,
        remote_addr: SocketAddr,
        route: Option<Arc<str>>,
        params: HashMap<String, String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                method: parts.method,
                uri: parts.uri,
                version: parts.version,
                headers: parts.headers,
                body,
                remote_addr,
                route,
                params,
            }),
        }
    }

    pub fn method(&self) -> &Method { &self.inner.method }
    pub fn uri(&self) -> &Uri { &self.inner.uri }
    pub fn path(&self) -> &str { self.inner.uri.path() }
    pub fn version(&self) -> Version { self.inner.version }
    pub fn headers(&self) -> &HeaderMap { &self.inner.headers }
    pub fn body(&self) -> &Bytes { &self.inner.body }
    pub fn remote_addr(&self) -> SocketAddr { self.inner.remote_addr }
    pub fn ip(&self) -> IpAddr { self.inner.remote_addr.ip() }

    /// Path and query exactly as the client sent them (`/users?page=2`).
    pub fn url(&self) -> &str {
        self.inner.uri.path_and_query().map_or("/", |pq| pq.as_str())
    }

    /// The registered pattern of the route that matched, e.g. `/users/{id}`.
    ///
    /// `None` when no route matched and the request fell through to 404.
    pub fn route(&self) -> Option<&str> {
        self.inner.route.as_deref()
    }

    /// Header lookup. Names are case-insensitive; values that are not valid
    /// visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `Host` header, or the URI authority for HTTP/2 requests.
    pub fn host(&self) -> Option<&str> {
        self.header(header::HOST.as_str())
            .or_else(|| self.inner.uri.authority().map(|a| a.as_str()))
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.inner.params.get(key).map(String::as_str)
    }

    /// First query-string value for `key`, percent-decoded.
    pub fn query(&self, key: &str) -> Option<Cow<'_, str>> {
        let query = self.inner.uri.query()?;
        lookup_urlencoded(query.as_bytes(), key)
    }

    /// Form field lookup.
    ///
    /// Checks the query string first, then an
    /// `application/x-www-form-urlencoded` body. Empty values count as
    /// absent, so `?user=` does not hide `user=alice` in the body.
    pub fn form(&self, key: &str) -> Option<Cow<'_, str>> {
        if let Some(value) = self.query(key).filter(|v| !v.is_empty()) {
            return Some(value);
        }
        let is_form = self
            .header(header::CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if !is_form {
            return None;
        }
        lookup_urlencoded(&self.inner.body, key).filter(|v| !v.is_empty())
    }

    /// Scheme the client used, as reported by the proxy in front of us.
    ///
    /// `X-Forwarded-Proto`, `X-Forwarded-Protocol` and `X-Url-Scheme` are
    /// passed through verbatim; `X-Forwarded-Ssl: on` means `https`.
    /// Without any of them the answer is `http`.
    pub fn scheme(&self) -> &str {
        ["x-forwarded-proto", "x-forwarded-protocol", "x-url-scheme"]
            .into_iter()
            .find_map(|name| self.header(name).filter(|v| !v.is_empty()))
            .or_else(|| {
                self.header("x-forwarded-ssl")
                    .filter(|v| v.eq_ignore_ascii_case("on"))
                    .map(|_| "https")
            })
            .unwrap_or("http")
    }

    /// Cookie lookup across every `Cookie` header on the request.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| k.trim() == name)
            .map(|(_, v)| v.trim().trim_matches('"'))
    }
}

fn lookup_urlencoded<'a>(input: &'a [u8], key: &str) -> Option<Cow<'a, str>> {
    url::form_urlencoded::parse(input)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}
