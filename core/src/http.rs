//! Request and response values exchanged with the transport.
//!
//! # Design
//! `Request` describes one outbound call as plain data: route fragment, verb,
//! query pairs, an already-serialized body and extra headers, plus the
//! `is_public` / `is_demo` flags that decide which base URL is targeted and
//! whether credentials are attached. `Response` is the raw outcome of one
//! exchange. It is built once by the transport and exposes accessors only.
//!
//! Verbs and route fragments are closed enums with a total mapping to their
//! wire strings. The only way an unknown verb can enter the system is
//! `HttpMethod::from_str`, which rejects it with `Error::Api`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;
use crate::headers::HeaderMap;

/// HTTP verb for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether the serialized request body is sent for this verb.
    pub fn sends_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }

    /// Whether the response body is read for this verb.
    pub fn reads_body(&self) -> bool {
        *self != HttpMethod::Head
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| Error::api(format!("Invalid method verb: {s}")))
    }
}

/// Route fragments served by the market-data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiPath {
    Assets,
    Ohlc,
    OrderBook,
    Summary,
    Ticker,
    Trades,
}

impl ApiPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiPath::Assets => "/assets",
            ApiPath::Ohlc => "/OHLC",
            ApiPath::OrderBook => "/orderbook",
            ApiPath::Summary => "/summary",
            ApiPath::Ticker => "/ticker",
            ApiPath::Trades => "/trades",
        }
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound API call described as plain data.
///
/// The path is kept as an opaque string so the transport never depends on
/// the set of known routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    path: String,
    method: HttpMethod,
    params: Vec<(String, String)>,
    body: Option<String>,
    headers: Vec<(String, String)>,
    is_public: bool,
    is_demo: bool,
}

impl Request {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
            is_public: false,
            is_demo: false,
        }
    }

    /// Shorthand for a request against one of the known routes.
    pub fn route(path: ApiPath, method: HttpMethod) -> Self {
        Self::new(path.as_str(), method)
    }

    /// Appends query pairs, keeping insertion order.
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the serialized body. Ignored on the wire for GET and HEAD.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn demo(mut self, is_demo: bool) -> Self {
        self.is_demo = is_demo;
        self
    }

    pub fn set_public(&mut self, is_public: bool) -> &mut Self {
        self.is_public = is_public;
        self
    }

    pub fn set_demo(&mut self, is_demo: bool) -> &mut Self {
        self.is_demo = is_demo;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn is_demo(&self) -> bool {
        self.is_demo
    }
}

/// Raw outcome of one completed exchange.
///
/// The transport never judges the status code; that belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: String,
    total_time: Duration,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<String>, total_time: Duration) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            total_time,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Wall-clock duration of the exchange, from send to last body byte.
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    pub fn into_parts(self) -> (u16, HeaderMap, String) {
        (self.status, self.headers, self.body)
    }
}
