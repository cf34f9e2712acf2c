//! Minimal HTTP/1.1 surface: scrape endpoint plus the two upload forms.

use std::fmt;
use std::io;

pub mod request;
pub mod response;
pub mod routes;
pub mod server;

pub use request::Request;
pub use response::Response;
pub use server::HttpServer;

/// Why a connection could not be turned into a `Request`.
#[derive(Debug)]
pub enum HttpError {
    Malformed(String),
    TooLarge(usize),
    Io(io::Error),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Malformed(reason) => write!(f, "malformed request: {reason}"),
            HttpError::TooLarge(len) => write!(
                f,
                "request body of {len} bytes exceeds {} bytes",
                request::MAX_BODY_BYTES
            ),
            HttpError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for HttpError {
    fn from(value: io::Error) -> Self {
        HttpError::Io(value)
    }
}
