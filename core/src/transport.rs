//! Blocking HTTP transport for the market-data API.
//!
//! # Design
//! `HttpTransport::call` performs exactly one exchange per `Request` and is
//! split into two halves, mirroring the build/parse split of the client:
//!
//! - `prepare` is pure. It resolves the base URL, checks credentials,
//!   encodes the query string, merges headers, attaches Basic auth and decides
//!   whether a body goes on the wire. The result is a `WireRequest`.
//! - `execute` sends the `WireRequest` through a `ureq::Agent`, renders the
//!   reply as a raw header block plus body, splits it at the header length and
//!   parses the block with `parse_raw_headers`.
//!
//! The agent is the connection handle. With keep-alive on (the default) one
//! agent, and so its idle connections, lives across calls; with keep-alive
//! off it is dropped after every call. `call` takes `&mut self`, so sharing
//! one transport across threads needs the caller's own lock.
//!
//! HTTP status codes are never errors here. Only failures below HTTP become
//! `Error::Connection`.

use std::fmt;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ureq::http;
use ureq::{Agent, Body, RequestBuilder};

use crate::config::Config;
use crate::error::{Error, FailureKind, Result};
use crate::headers::{parse_raw_headers, HeaderMap};
use crate::http::{HttpMethod, Request, Response};
use crate::logger::Logger;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(80);
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "application/json"),
    ("Accept", "application/json"),
];

/// The contract between the endpoint facade and whatever performs the
/// exchange. `HttpTransport` is the production implementation.
pub trait ApiClient {
    fn call(&mut self, request: &Request) -> Result<Response>;

    fn set_config(&mut self, config: Config);

    fn set_api_key(&mut self, api_key: &str);

    fn set_secret_key(&mut self, secret_key: &str);

    fn set_logger(&mut self, logger: Option<Arc<dyn Logger>>);
}

/// A fully resolved request, ready to be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Headers in send order, defaults first, caller overrides applied.
    pub headers: Vec<(String, String)>,
    /// `None` for verbs that never carry a body.
    pub body: Option<String>,
}

impl WireRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Headers flattened to `Name:Value` lines.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers.iter().map(|(n, v)| format!("{n}:{v}")).collect()
    }
}

/// Reply rendered the way a raw socket read would see it: header block
/// followed by body bytes, with the length of the header block reported.
#[derive(Debug)]
struct RawExchange {
    status: u16,
    raw: Vec<u8>,
    header_size: usize,
}

pub struct HttpTransport {
    config: Config,
    api_key: Option<String>,
    secret_key: Option<String>,
    timeout: Duration,
    connection_timeout: Duration,
    keep_alive: bool,
    agent: Option<Agent>,
    logger: Option<Arc<dyn Logger>>,
}

impl HttpTransport {
    pub fn new(config: Config) -> Self {
        let timeout = config
            .timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        let connection_timeout = config
            .connection_timeout_secs
            .map_or(DEFAULT_CONNECTION_TIMEOUT, Duration::from_secs);
        let keep_alive = config.keep_alive.unwrap_or(true);
        Self {
            config,
            api_key: None,
            secret_key: None,
            timeout,
            connection_timeout,
            keep_alive,
            agent: None,
            logger: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Overall time allowed for one exchange. Takes effect on the next call.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        self.close_connection();
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Time allowed to establish the connection. Takes effect on the next call.
    pub fn set_connection_timeout(&mut self, timeout: Duration) {
        self.connection_timeout = timeout;
        self.close_connection();
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) -> &mut Self {
        self.keep_alive = keep_alive;
        if !keep_alive {
            self.close_connection();
        }
        self
    }

    /// Whether a connection handle is currently held.
    pub fn is_connected(&self) -> bool {
        self.agent.is_some()
    }

    /// Drops the connection handle and any idle connections it pools.
    pub fn close_connection(&mut self) {
        self.agent = None;
    }

    /// Resolves everything about the request that does not need the network.
    pub fn prepare(&self, request: &Request) -> Result<WireRequest> {
        for (name, value) in request.headers() {
            check_header(name, value)?;
        }
        let mut headers = merge_headers(request.headers());

        let base = if request.is_public() {
            &self.config.public
        } else {
            let (api_key, secret_key) = self
                .credentials()
                .ok_or_else(|| Error::Authorize("apiKey or secretKey not set".to_string()))?;
            headers.push(("Authorization".to_string(), basic_auth(api_key, secret_key)));
            if request.is_demo() {
                &self.config.base_demo
            } else {
                &self.config.base
            }
        };

        let mut url = format!("{}{}", base.trim_end_matches('/'), request.path());
        if !request.params().is_empty() {
            let query = serde_urlencoded::to_string(request.params())
                .map_err(|e| Error::api(format!("failed to encode query params: {e}")))?;
            url.push('?');
            url.push_str(&query);
        }

        let method = request.method();
        let body = method
            .sends_body()
            .then(|| request.body().unwrap_or_default().to_string());

        Ok(WireRequest {
            method,
            url,
            headers,
            body,
        })
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        let api_key = self.api_key.as_deref().filter(|k| !k.is_empty())?;
        let secret_key = self.secret_key.as_deref().filter(|k| !k.is_empty())?;
        Some((api_key, secret_key))
    }

    fn acquire_agent(&mut self) -> Agent {
        let (timeout, connection_timeout) = (self.timeout, self.connection_timeout);
        self.agent
            .get_or_insert_with(|| new_agent(timeout, connection_timeout))
            .clone()
    }

    fn execute(&mut self, wire: &WireRequest) -> Result<Response> {
        let agent = self.acquire_agent();
        let started = Instant::now();
        let result = send(&agent, wire).and_then(|reply| render_raw(reply, wire.method.reads_body()));
        let total_time = started.elapsed();

        if !self.keep_alive {
            self.close_connection();
        }

        let exchange = result.map_err(|e| classify_failure(&e))?;
        let (headers, body) = split_raw(&exchange.raw, exchange.header_size);
        tracing::debug!(
            method = %wire.method,
            url = %wire.url,
            status = exchange.status,
            elapsed_ms = elapsed_ms(total_time),
            "exchange completed"
        );
        Ok(Response::new(exchange.status, headers, body, total_time))
    }

    fn log_request(&self, request: &Request) {
        let Some(logger) = &self.logger else {
            return;
        };
        let mut message = format!("Send request: {} {}", request.method(), request.path());
        if !request.params().is_empty() {
            message.push_str(" with query params: ");
            message.push_str(&pairs_json(request.params()));
        }
        if let Some(body) = request.body().filter(|b| !b.is_empty()) {
            message.push_str(" with body: ");
            message.push_str(body);
        }
        if !request.headers().is_empty() {
            message.push_str(" with headers: ");
            message.push_str(&pairs_json(request.headers()));
        }
        logger.info(&message);
    }

    fn log_response(&self, response: &Response) {
        let Some(logger) = &self.logger else {
            return;
        };
        let headers = serde_json::to_string(response.headers()).unwrap_or_default();
        let mut message = format!(
            "Response with code {} received with headers: {headers}",
            response.status()
        );
        if !response.body().is_empty() {
            message.push_str(" and body: ");
            message.push_str(response.body());
        }
        logger.info(&message);
    }
}

impl ApiClient for HttpTransport {
    fn call(&mut self, request: &Request) -> Result<Response> {
        self.log_request(request);
        let wire = self.prepare(request)?;
        let response = self.execute(&wire)?;
        self.log_response(&response);
        Ok(response)
    }

    fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    fn set_api_key(&mut self, api_key: &str) {
        self.api_key = Some(api_key.to_string());
    }

    fn set_secret_key(&mut self, secret_key: &str) {
        self.secret_key = Some(secret_key.to_string());
    }

    fn set_logger(&mut self, logger: Option<Arc<dyn Logger>>) {
        self.logger = logger;
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<set>"))
            .field("timeout", &self.timeout)
            .field("connection_timeout", &self.connection_timeout)
            .field("keep_alive", &self.keep_alive)
            .field("connected", &self.agent.is_some())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

/// Defaults overlaid by the caller's headers; a caller header replaces a
/// default of the same name (case-insensitive) in place.
fn merge_headers(extra: &[(String, String)]) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = DEFAULT_HEADERS
        .iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();
    for (name, value) in extra {
        match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => *slot = (name.clone(), value.clone()),
            None => headers.push((name.clone(), value.clone())),
        }
    }
    headers
}

/// Rejects header names and values that cannot go on the wire, such as a
/// value carrying a line break.
fn check_header(name: &str, value: &str) -> Result<()> {
    http::HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::api(format!("Invalid header name {name:?}: {e}")))?;
    http::HeaderValue::from_str(value)
        .map_err(|e| Error::api(format!("Invalid value for header {name}: {e}")))?;
    Ok(())
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

fn pairs_json(pairs: &[(String, String)]) -> String {
    let map: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    serde_json::Value::Object(map).to_string()
}

fn new_agent(timeout: Duration, connection_timeout: Duration) -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0)
        .timeout_global(Some(timeout))
        .timeout_connect(Some(connection_timeout))
        .build()
        .new_agent()
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(agent: &Agent, wire: &WireRequest) -> std::result::Result<http::Response<Body>, ureq::Error> {
    let url = wire.url.as_str();
    let body = wire.body.as_deref().unwrap_or_default().as_bytes();
    let headers = wire.headers.as_slice();
    match wire.method {
        HttpMethod::Get => with_headers(agent.get(url), headers).call(),
        HttpMethod::Head => with_headers(agent.head(url), headers).call(),
        HttpMethod::Post => with_headers(agent.post(url), headers).send(body),
        HttpMethod::Put => with_headers(agent.put(url), headers).send(body),
        HttpMethod::Patch => with_headers(agent.patch(url), headers).send(body),
        HttpMethod::Delete => with_headers(agent.delete(url), headers)
            .force_send_body()
            .send(body),
        HttpMethod::Options => with_headers(agent.options(url), headers)
            .force_send_body()
            .send(body),
    }
}

/// Renders the reply as status line, header lines and a blank line, followed
/// by the body bytes. The body is not read when `read_body` is false and is
/// otherwise read in full, whatever its size.
fn render_raw(
    mut reply: http::Response<Body>,
    read_body: bool,
) -> std::result::Result<RawExchange, ureq::Error> {
    let status = reply.status();
    let mut head = format!("{:?} {}\r\n", reply.version(), status);
    for (name, value) in reply.headers() {
        head.push_str(name.as_str());
        head.push_str(": ");
        head.push_str(&String::from_utf8_lossy(value.as_bytes()));
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let header_size = head.len();
    let mut raw = head.into_bytes();
    if read_body {
        raw.extend(reply.body_mut().with_config().limit(u64::MAX).read_to_vec()?);
    }
    Ok(RawExchange {
        status: status.as_u16(),
        raw,
        header_size,
    })
}

/// Splits a raw reply at the reported header length.
fn split_raw(raw: &[u8], header_size: usize) -> (HeaderMap, String) {
    let (head, body) = raw.split_at(header_size.min(raw.len()));
    let headers = parse_raw_headers(&String::from_utf8_lossy(head));
    (headers, String::from_utf8_lossy(body).into_owned())
}

fn classify_failure(err: &ureq::Error) -> Error {
    let kind = match err {
        ureq::Error::HostNotFound => FailureKind::HostNotFound,
        ureq::Error::ConnectionFailed => FailureKind::ConnectionRefused,
        ureq::Error::Timeout(_) => FailureKind::Timeout,
        ureq::Error::Io(io) => match io.kind() {
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::AddrNotAvailable => FailureKind::ConnectionRefused,
            ErrorKind::TimedOut => FailureKind::Timeout,
            _ if mentions_certificate(err) => FailureKind::Certificate,
            _ => FailureKind::Unexpected,
        },
        _ if mentions_certificate(err) => FailureKind::Certificate,
        _ => FailureKind::Unexpected,
    };
    Error::connection(kind, err)
}

// TLS failures surface through several ureq variants depending on the TLS
// backend; all of them name the certificate in their message.
fn mentions_certificate(err: &ureq::Error) -> bool {
    let message = err.to_string().to_ascii_lowercase();
    message.contains("certificate") || message.contains("tls") || message.contains("ssl")
}
