//! In-process imitation of the Currency market-data API.
//!
//! Three roots mirror the client's base URLs: `/public` needs no
//! credentials, `/live` and `/demo` require HTTP Basic auth with
//! `API_KEY` / `SECRET_KEY`. A few extra routes exist only to drive client
//! edge cases: fixed status codes, a non-JSON body and repeated headers.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, RawQuery},
    http::{header, HeaderMap, Method, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const API_KEY: &str = "mock-key";
pub const SECRET_KEY: &str = "mock-secret";

/// Size of the `/public/large` body, above ureq's default 10 MiB read limit.
pub const LARGE_BODY_BYTES: usize = 11 * 1024 * 1024;

const MARKET_ROUTES: [&str; 5] = ["OHLC", "orderbook", "summary", "ticker", "trades"];

/// What the server saw of a request sent to one of the echo routes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub environment: String,
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub user: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/public/assets", get(list_assets))
        .route("/public/echo", any(echo_public))
        .route("/public/status/{code}", get(fixed_status))
        .route("/public/not-json", get(not_json))
        .route("/public/duplicate-headers", get(duplicate_headers))
        .route("/public/redirect", get(redirect))
        .route("/public/large", get(large))
        .route("/public/{route}", get(market_data))
        .route("/live/echo", any(echo_live))
        .route("/demo/echo", any(echo_demo))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_assets() -> Json<Value> {
    Json(json!({
        "BTC": {
            "name": "Bitcoin",
            "description": "Bitcoin",
            "can_deposit": true,
            "can_withdraw": true,
            "maker_fee": 0.1,
            "taker_fee": 0.2,
            "min_withdraw": 0.001,
            "max_withdraw": 100.0
        },
        "ETH": {
            "name": "Ethereum",
            "description": "Ether",
            "can_deposit": true,
            "can_withdraw": false
        }
    }))
}

async fn market_data(
    Path(route): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    if !MARKET_ROUTES.contains(&route.as_str()) {
        return error(StatusCode::NOT_FOUND, "not found");
    }
    Json(json!({ "route": route, "query": query })).into_response()
}

async fn fixed_status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => error(status, status.canonical_reason().unwrap_or("unknown")),
        Err(_) => error(StatusCode::BAD_REQUEST, "invalid status code"),
    }
}

async fn not_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "not json")
}

async fn duplicate_headers() -> impl IntoResponse {
    (
        AppendHeaders([("x-mock-dup", "first"), ("x-mock-dup", "second")]),
        Json(json!({ "ok": true })),
    )
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/public/assets")])
}

/// A JSON string literal padded to `LARGE_BODY_BYTES` bytes.
async fn large() -> impl IntoResponse {
    let body = format!("\"{}\"", "x".repeat(LARGE_BODY_BYTES - 2));
    ([(header::CONTENT_TYPE, "application/json")], body)
}

async fn echo_public(method: Method, headers: HeaderMap, RawQuery(query): RawQuery, body: String) -> Response {
    Json(echo("public", method, &headers, query, body)).into_response()
}

async fn echo_live(method: Method, headers: HeaderMap, RawQuery(query): RawQuery, body: String) -> Response {
    echo_private("live", method, headers, query, body)
}

async fn echo_demo(method: Method, headers: HeaderMap, RawQuery(query): RawQuery, body: String) -> Response {
    echo_private("demo", method, headers, query, body)
}

fn echo_private(
    environment: &str,
    method: Method,
    headers: HeaderMap,
    query: Option<String>,
    body: String,
) -> Response {
    match basic_user(&headers) {
        Some((user, password)) if user == API_KEY && password == SECRET_KEY => {
            Json(echo(environment, method, &headers, query, body)).into_response()
        }
        _ => {
            tracing::debug!(environment, "rejected request with missing or invalid credentials");
            error(StatusCode::UNAUTHORIZED, "invalid credentials")
        }
    }
}

fn echo(environment: &str, method: Method, headers: &HeaderMap, query: Option<String>, body: String) -> Echo {
    let text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Echo {
        environment: environment.to_string(),
        method: method.to_string(),
        query,
        content_type: text(header::CONTENT_TYPE),
        accept: text(header::ACCEPT),
        user: basic_user(headers).map(|(user, _)| user),
        headers: headers
            .iter()
            .filter_map(|(n, v)| Some((n.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body,
    }
}

/// Decodes `Authorization: Basic ...` into `(user, password)`.
fn basic_user(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn basic_user_decodes_credentials() {
        let encoded = STANDARD.encode("mock-key:mock-secret");
        let headers = with_auth(&format!("Basic {encoded}"));
        assert_eq!(
            basic_user(&headers),
            Some(("mock-key".to_string(), "mock-secret".to_string()))
        );
    }

    #[test]
    fn basic_user_rejects_other_schemes() {
        assert_eq!(basic_user(&with_auth("Bearer abc")), None);
        assert_eq!(basic_user(&with_auth("Basic !!!")), None);
        assert_eq!(basic_user(&HeaderMap::new()), None);
    }

    #[test]
    fn password_may_contain_colons() {
        let encoded = STANDARD.encode("user:pa:ss");
        let (_, password) = basic_user(&with_auth(&format!("Basic {encoded}"))).unwrap();
        assert_eq!(password, "pa:ss");
    }

    #[test]
    fn echo_records_request_shape() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let seen = echo("public", Method::PATCH, &headers, Some("a=1".to_string()), "{}".to_string());
        assert_eq!(seen.method, "PATCH");
        assert_eq!(seen.query.as_deref(), Some("a=1"));
        assert_eq!(seen.content_type.as_deref(), Some("application/json"));
        assert_eq!(seen.accept, None);
        assert_eq!(seen.user, None);
        assert_eq!(seen.body, "{}");
    }
}
