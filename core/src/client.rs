//! Endpoint facade over an `ApiClient` transport.
//!
//! # Design
//! `Client` builds one `Request` per market-data route, hands it to the
//! transport and interprets the `Response`: status 200 is decoded as JSON,
//! documented error statuses become `Error::BadRequest`, anything else is
//! `Error::Api`. The transport is generic so tests and callers can plug in
//! their own `ApiClient`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{ApiPath, HttpMethod, Request, Response};
use crate::logger::Logger;
use crate::transport::{ApiClient, HttpTransport};
use crate::types::AssetsCollection;

pub const STATUS_OK: u16 = 200;

/// Statuses the API documents for rejected requests.
pub const EXPECTED_ERROR_STATUSES: [u16; 11] = [400, 401, 403, 404, 405, 406, 409, 415, 422, 429, 500];

/// Market-data API client.
#[derive(Debug)]
pub struct Client<T: ApiClient = HttpTransport> {
    transport: T,
    demo: bool,
}

impl Client<HttpTransport> {
    pub fn new(config: Config) -> Self {
        Self::with_transport(HttpTransport::new(config))
    }

    /// Builds a client from the config file named by `CURRENCY_SDK_CONFIG`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }
}

impl<T: ApiClient> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            demo: false,
        }
    }

    pub fn set_demo(&mut self, demo: bool) -> &mut Self {
        self.demo = demo;
        self
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn set_auth(&mut self, api_key: &str, secret_key: &str) -> &mut Self {
        self.transport.set_api_key(api_key);
        self.transport.set_secret_key(secret_key);
        self
    }

    pub fn set_config(&mut self, config: Config) -> &mut Self {
        self.transport.set_config(config);
        self
    }

    pub fn set_logger(&mut self, logger: Option<Arc<dyn Logger>>) -> &mut Self {
        self.transport.set_logger(logger);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn get_assets(&mut self) -> Result<AssetsCollection> {
        let request = self.public_request(ApiPath::Assets, &[]);
        self.fetch(&request)
    }

    pub fn get_ohlc(&mut self, filter: &[(&str, &str)]) -> Result<Value> {
        let request = self.public_request(ApiPath::Ohlc, filter);
        self.fetch(&request)
    }

    pub fn get_order_book(&mut self, filter: &[(&str, &str)]) -> Result<Value> {
        let request = self.public_request(ApiPath::OrderBook, filter);
        self.fetch(&request)
    }

    pub fn get_summary(&mut self) -> Result<Value> {
        let request = self.public_request(ApiPath::Summary, &[]);
        self.fetch(&request)
    }

    pub fn get_ticker(&mut self, filter: &[(&str, &str)]) -> Result<Value> {
        let request = self.public_request(ApiPath::Ticker, filter);
        self.fetch(&request)
    }

    pub fn get_trades(&mut self, filter: &[(&str, &str)]) -> Result<Value> {
        let request = self.public_request(ApiPath::Trades, filter);
        self.fetch(&request)
    }

    /// Sends an arbitrary request and decodes a 200 body into `D`.
    pub fn fetch<D: DeserializeOwned>(&mut self, request: &Request) -> Result<D> {
        let response = self.transport.call(request)?;
        parse_response(response)
    }

    fn public_request(&self, path: ApiPath, filter: &[(&str, &str)]) -> Request {
        let mut request = Request::route(path, HttpMethod::Get).with_params(filter.iter().copied());
        request.set_public(true).set_demo(self.demo);
        request
    }
}

/// Interprets a completed response: decode on 200, typed error otherwise.
pub fn parse_response<D: DeserializeOwned>(response: Response) -> Result<D> {
    if response.status() == STATUS_OK {
        return decode(response);
    }
    Err(status_error(response))
}

fn decode<D: DeserializeOwned>(response: Response) -> Result<D> {
    serde_json::from_str(response.body()).map_err(|e| Error::Decode {
        message: e.to_string(),
        body: response.into_parts().2,
    })
}

/// Maps a non-200 response to `BadRequest` or `Api`.
pub fn status_error(response: Response) -> Error {
    let (status, headers, body) = response.into_parts();
    if EXPECTED_ERROR_STATUSES.contains(&status) {
        return Error::BadRequest {
            status,
            headers,
            body,
        };
    }
    Error::Api {
        message: "Unexpected response error code".to_string(),
        status: Some(status),
        headers,
        body,
    }
}
