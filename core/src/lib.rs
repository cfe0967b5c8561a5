//! Blocking client for the Currency market-data API.
//!
//! # Overview
//! Requests are plain `Request` values. `HttpTransport` turns one into exactly
//! one HTTP exchange and hands back the raw `Response`; `Client` sits on top
//! of any `ApiClient` transport, one method per route, and turns responses
//! into decoded values or typed errors.
//!
//! # Design
//! - Public routes need no credentials. Private ones use HTTP Basic auth
//!   against the live or demo base URL.
//! - The transport never judges status codes and never retries.
//! - Response headers are parsed from the raw header block by the pure
//!   `parse_raw_headers`; a repeated header name keeps its last value.
//! - Logging goes through the optional `Logger` hook; `TracingLogger` forwards
//!   to `tracing`.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod logger;
pub mod transport;
pub mod types;

pub use client::Client;
pub use config::Config;
pub use error::{Error, FailureKind, Result};
pub use headers::{parse_raw_headers, HeaderMap};
pub use http::{ApiPath, HttpMethod, Request, Response};
pub use logger::{Logger, TracingLogger};
pub use transport::{ApiClient, HttpTransport, WireRequest};
pub use types::{Asset, AssetsCollection};
