//! Error types for the market-data API client.
//!
//! # Design
//! `Authorize` and `Connection` come from the transport: the first before any
//! network I/O, the second after a failed exchange. `BadRequest`, `Api` and
//! `Decode` come from interpreting a completed `Response`. Every variant
//! carries enough context (status, headers, raw body or the underlying
//! transport message) to diagnose a failure without re-running the call.
//! Nothing is retried.

use std::fmt;

use thiserror::Error;

use crate::headers::HeaderMap;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A non-public request was attempted without both credentials set.
    #[error("authorization failed: {0}")]
    Authorize(String),

    /// The exchange failed below HTTP: DNS, refused connection, TLS or timeout.
    #[error("{message}")]
    Connection { kind: FailureKind, message: String },

    /// The API rejected the request with one of its documented error statuses.
    #[error("bad API request ({status}): {body}")]
    BadRequest {
        status: u16,
        headers: HeaderMap,
        body: String,
    },

    /// Unexpected status code or a request that could not be built.
    #[error("{message}{}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Api {
        message: String,
        status: Option<u16>,
        headers: HeaderMap,
        body: String,
    },

    /// The body could not be decoded into the expected shape.
    #[error("failed to decode response: {message}")]
    Decode { message: String, body: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// An `Api` error that did not come from a response.
    pub(crate) fn api(message: impl Into<String>) -> Self {
        Error::Api {
            message: message.into(),
            status: None,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    pub(crate) fn connection(kind: FailureKind, detail: impl fmt::Display) -> Self {
        Error::Connection {
            kind,
            message: format!("{}\n\n(Network error [{}]: {detail})", kind.cause(), kind.code()),
        }
    }

    /// Status code of the response behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::BadRequest { status, .. } => Some(*status),
            Error::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw response body behind this error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::BadRequest { body, .. } | Error::Decode { body, .. } => Some(body.as_str()),
            Error::Api { body, status: Some(_), .. } => Some(body.as_str()),
            _ => None,
        }
    }
}

/// Class of a failed exchange, used to pick the human-readable cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    HostNotFound,
    ConnectionRefused,
    Timeout,
    Certificate,
    Unexpected,
}

impl FailureKind {
    /// Stable identifier embedded in connection error messages.
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::HostNotFound => "host_not_found",
            FailureKind::ConnectionRefused => "connection_refused",
            FailureKind::Timeout => "timeout",
            FailureKind::Certificate => "ssl_certificate",
            FailureKind::Unexpected => "unexpected",
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            FailureKind::HostNotFound | FailureKind::ConnectionRefused | FailureKind::Timeout
        )
    }

    fn cause(&self) -> &'static str {
        match self {
            FailureKind::HostNotFound | FailureKind::ConnectionRefused | FailureKind::Timeout => {
                "Could not connect to Currency API. Please check your internet connection and try again."
            }
            FailureKind::Certificate => "Could not verify SSL certificate.",
            FailureKind::Unexpected => "Unexpected error communicating.",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
