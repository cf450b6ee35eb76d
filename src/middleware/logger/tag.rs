//! Tag vocabulary and per-request field resolution.
//!
//! Tag names are bound to a [`Tag`] once, when the template is compiled:
//! first by exact name in [`FIXED`], then against the [`PREFIXES`] list.
//! An exact name always wins over a prefix. Anything else is
//! [`Tag::Unknown`] and renders as nothing.

use std::io::{self, Write};

use http::Version;
use http::header::{REFERER, USER_AGENT};

use super::timestamp::Timestamp;
use crate::request::Request;
use crate::response::Response;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Tag {
    Time,
    Referer,
    Protocol,
    Ip,
    Ips,
    Host,
    Method,
    Path,
    Url,
    UserAgent,
    Latency,
    Status,
    Body,
    BytesSent,
    BytesReceived,
    RequestProtocol,
    Route,
    Error,
    Header(String),
    Query(String),
    Form(String),
    Cookie(String),
    Unknown,
}

const FIXED: &[(&str, Tag)] = &[
    ("time", Tag::Time),
    ("referer", Tag::Referer),
    ("protocol", Tag::Protocol),
    ("ip", Tag::Ip),
    ("ips", Tag::Ips),
    ("host", Tag::Host),
    ("method", Tag::Method),
    ("path", Tag::Path),
    ("url", Tag::Url),
    ("user-agent", Tag::UserAgent),
    ("latency", Tag::Latency),
    ("status", Tag::Status),
    ("body", Tag::Body),
    ("bytes-sent", Tag::BytesSent),
    ("bytes-received", Tag::BytesReceived),
    ("request-protocol", Tag::RequestProtocol),
    ("route", Tag::Route),
    ("error", Tag::Error),
    // older spellings
    ("ua", Tag::UserAgent),
    ("bytesSent", Tag::BytesSent),
    ("bytesReceived", Tag::BytesReceived),
    ("reqProtocol", Tag::RequestProtocol),
];

const PREFIXES: &[(&str, fn(String) -> Tag)] = &[
    ("header:", Tag::Header),
    ("query:", Tag::Query),
    ("form:", Tag::Form),
    ("cookie:", Tag::Cookie),
];

impl Tag {
    pub(crate) fn lookup(name: &str) -> Self {
        if let Some((_, tag)) = FIXED.iter().find(|(fixed, _)| *fixed == name) {
            return tag.clone();
        }
        PREFIXES
            .iter()
            .find_map(|(prefix, make)| name.strip_prefix(prefix).map(|key| make(key.to_owned())))
            .unwrap_or(Self::Unknown)
    }
}

/// One finished request/response pair, as seen by the renderer.
pub(crate) struct Exchange<'a> {
    pub(crate) req: &'a Request,
    pub(crate) res: &'a Response,
}

/// Writes tag values for an exchange.
pub(crate) struct Resolver {
    timestamp: Option<Timestamp>,
    combined: bool,
}

impl Resolver {
    /// `timestamp` is `None` when the format never mentions `${time}`;
    /// `combined` turns missing Referer / User-Agent into `-`.
    pub(crate) fn new(timestamp: Option<Timestamp>, combined: bool) -> Self {
        Self { timestamp, combined }
    }

    #[cfg(test)]
    pub(crate) fn has_clock(&self) -> bool {
        self.timestamp.is_some()
    }

    /// Appends the value of `tag` to `out`. Absent values append nothing.
    ///
    /// `Latency` is not known here and is written by the renderer.
    pub(crate) fn resolve(&self, tag: &Tag, ex: &Exchange<'_>, out: &mut Vec<u8>) -> io::Result<()> {
        let Exchange { req, res } = ex;
        match tag {
            Tag::Time => {
                if let Some(ts) = &self.timestamp {
                    out.extend_from_slice(ts.current().as_bytes());
                }
            }
            Tag::Referer => self.combined_header(req.header(REFERER.as_str()), out),
            Tag::UserAgent => self.combined_header(req.header(USER_AGENT.as_str()), out),
            Tag::Protocol => out.extend_from_slice(req.scheme().as_bytes()),
            Tag::Ip => write!(out, "{}", req.ip())?,
            Tag::Ips => push(out, req.header("x-forwarded-for")),
            Tag::Host => push(out, req.host()),
            Tag::Method => out.extend_from_slice(req.method().as_str().as_bytes()),
            Tag::Path => out.extend_from_slice(req.path().as_bytes()),
            Tag::Url => out.extend_from_slice(req.url().as_bytes()),
            Tag::Status => write!(out, "{}", res.status_code().as_u16())?,
            Tag::Body => out.extend_from_slice(req.body()),
            Tag::BytesSent => write!(out, "{}", res.body().len())?,
            Tag::BytesReceived => write!(out, "{}", req.body().len())?,
            Tag::RequestProtocol => {
                let proto = if req.version() == Version::HTTP_11 { "HTTP/1.1" } else { "unknown" };
                out.extend_from_slice(proto.as_bytes());
            }
            Tag::Route => push(out, req.route()),
            Tag::Error => push(out, res.error()),
            Tag::Header(name) => push(out, req.header(name)),
            Tag::Query(key) => push(out, req.query(key).as_deref()),
            Tag::Form(key) => push(out, req.form(key).as_deref()),
            Tag::Cookie(name) => push(out, req.cookie(name)),
            Tag::Latency | Tag::Unknown => {}
        }
        Ok(())
    }

    fn combined_header(&self, value: Option<&str>, out: &mut Vec<u8>) {
        match value {
            Some(v) if !v.is_empty() => out.extend_from_slice(v.as_bytes()),
            _ if self.combined => out.push(b'-'),
            _ => {}
        }
    }
}

fn push(out: &mut Vec<u8>, value: Option<&str>) {
    if let Some(v) = value {
        out.extend_from_slice(v.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    #[test]
    fn fixed_names_and_aliases() {
        assert_eq!(Tag::lookup("status"), Tag::Status);
        assert_eq!(Tag::lookup("user-agent"), Tag::UserAgent);
        assert_eq!(Tag::lookup("ua"), Tag::UserAgent);
        assert_eq!(Tag::lookup("bytesSent"), Tag::BytesSent);
        assert_eq!(Tag::lookup("reqProtocol"), Tag::RequestProtocol);
    }

    #[test]
    fn prefixes_keep_the_key() {
        assert_eq!(Tag::lookup("header:X-Request-Id"), Tag::Header("X-Request-Id".to_owned()));
        assert_eq!(Tag::lookup("query:page"), Tag::Query("page".to_owned()));
        assert_eq!(Tag::lookup("form:user"), Tag::Form("user".to_owned()));
        assert_eq!(Tag::lookup("cookie:session"), Tag::Cookie("session".to_owned()));
    }

    #[test]
    fn unknown_names() {
        assert_eq!(Tag::lookup("not-a-real-tag"), Tag::Unknown);
        assert_eq!(Tag::lookup(""), Tag::Unknown);
        assert_eq!(Tag::lookup("Status"), Tag::Unknown);
        assert_eq!(Tag::lookup("headers:x"), Tag::Unknown);
    }

    #[test]
    fn every_fixed_name_is_reachable() {
        for (name, tag) in FIXED {
            assert_eq!(&Tag::lookup(name), tag, "{name}");
        }
    }

    fn exchange_parts(builder: http::request::Builder, body: &'static str) -> (Request, Response) {
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        let req = Request::new(
            parts,
            Bytes::from_static(body.as_bytes()),
            "192.0.2.10:40000".parse().unwrap(),
            Some(Arc::from("/items/{id}")),
            HashMap::new(),
        );
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .text("created!")
            .with_error("slow disk");
        (req, res)
    }

    fn render(resolver: &Resolver, name: &str, req: &Request, res: &Response) -> String {
        let mut out = Vec::new();
        resolver.resolve(&Tag::lookup(name), &Exchange { req, res }, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn resolves_request_and_response_fields() {
        let (req, res) = exchange_parts(
            http::Request::builder()
                .method("POST")
                .uri("/items/7?verbose=1")
                .header("host", "shop.test")
                .header("x-forwarded-for", "203.0.113.1, 10.0.0.1")
                .header("x-forwarded-proto", "https")
                .header("x-request-id", "abc-123")
                .header("cookie", "session=s1"),
            "hello",
        );
        let resolver = Resolver::new(None, false);
        let r = |name| render(&resolver, name, &req, &res);

        assert_eq!(r("method"), "POST");
        assert_eq!(r("path"), "/items/7");
        assert_eq!(r("url"), "/items/7?verbose=1");
        assert_eq!(r("route"), "/items/{id}");
        assert_eq!(r("ip"), "192.0.2.10");
        assert_eq!(r("ips"), "203.0.113.1, 10.0.0.1");
        assert_eq!(r("host"), "shop.test");
        assert_eq!(r("protocol"), "https");
        assert_eq!(r("request-protocol"), "HTTP/1.1");
        assert_eq!(r("status"), "201");
        assert_eq!(r("body"), "hello");
        assert_eq!(r("bytes-received"), "5");
        assert_eq!(r("bytes-sent"), "8");
        assert_eq!(r("error"), "slow disk");
        assert_eq!(r("header:X-Request-Id"), "abc-123");
        assert_eq!(r("query:verbose"), "1");
        assert_eq!(r("form:verbose"), "1");
        assert_eq!(r("cookie:session"), "s1");
        assert_eq!(r("header:missing"), "");
        assert_eq!(r("time"), "");
        assert_eq!(r("nope"), "");
    }

    #[test]
    fn protocol_passes_forwarded_value_through() {
        let (req, res) = exchange_parts(
            http::Request::builder().uri("/").header("x-forwarded-proto", "wss"),
            "",
        );
        assert_eq!(render(&Resolver::new(None, false), "protocol", &req, &res), "wss");

        let (req, res) = exchange_parts(http::Request::builder().uri("/"), "");
        assert_eq!(render(&Resolver::new(None, false), "protocol", &req, &res), "http");
    }

    #[test]
    fn request_protocol_other_versions_are_unknown() {
        let (req, res) = exchange_parts(
            http::Request::builder().uri("/").version(Version::HTTP_2),
            "",
        );
        assert_eq!(render(&Resolver::new(None, false), "request-protocol", &req, &res), "unknown");
    }

    #[test]
    fn combined_mode_dashes_missing_referer_and_user_agent() {
        let (req, res) = exchange_parts(http::Request::builder().uri("/"), "");

        let plain = Resolver::new(None, false);
        assert_eq!(render(&plain, "referer", &req, &res), "");
        assert_eq!(render(&plain, "user-agent", &req, &res), "");

        let combined = Resolver::new(None, true);
        assert_eq!(render(&combined, "referer", &req, &res), "-");
        assert_eq!(render(&combined, "user-agent", &req, &res), "-");
    }

    #[test]
    fn combined_mode_keeps_present_headers() {
        let (req, res) = exchange_parts(
            http::Request::builder()
                .uri("/")
                .header("referer", "https://example.com/")
                .header("user-agent", "curl/8.0"),
            "",
        );
        let combined = Resolver::new(None, true);
        assert_eq!(render(&combined, "referer", &req, &res), "https://example.com/");
        assert_eq!(render(&combined, "ua", &req, &res), "curl/8.0");
    }

    #[test]
    fn time_reads_the_shared_timestamp() {
        let (req, res) = exchange_parts(http::Request::builder().uri("/"), "");
        let resolver = Resolver::new(Some(Timestamp::start("%Y".to_owned())), false);
        assert_eq!(render(&resolver, "time", &req, &res).len(), 4);
    }
}
