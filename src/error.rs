//! Unified error type.

use std::fmt;
use std::net::AddrParseError;

/// The error type returned by tsu's fallible operations.
///
/// Handler failures never show up here: they travel on the
/// [`Response`](crate::Response) (see [`Response::error`](crate::Response::error))
/// and are picked up by middleware such as the access logger. This type
/// surfaces infrastructure failures only: a bad listen address, binding to a
/// port, or accepting a connection.
#[derive(Debug)]
pub struct Error(Kind);

#[derive(Debug)]
enum Kind {
    Addr(String, AddrParseError),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Kind::Addr(addr, e) => write!(f, "invalid listen address `{addr}`: {e}"),
            Kind::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Kind::Addr(_, e) => Some(e),
            Kind::Io(e) => Some(e),
        }
    }
}

impl Error {
    pub(crate) fn addr(addr: &str, e: AddrParseError) -> Self {
        Self(Kind::Addr(addr.to_owned(), e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(Kind::Io(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_error_names_the_address() {
        let parse_err = "nope".parse::<std::net::SocketAddr>().unwrap_err();
        let err = Error::addr("nope", parse_err);
        assert!(err.to_string().starts_with("invalid listen address `nope`"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn io_error_is_wrapped() {
        let err: Error = std::io::Error::other("boom").into();
        assert_eq!(err.to_string(), "io: boom");
    }
}
