use axum::http::{self, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use mock_server::{app, Echo, API_KEY, LARGE_BODY_BYTES, SECRET_KEY};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

fn private_request(method: &str, uri: &str, auth: Option<String>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(http::header::AUTHORIZATION, auth);
    }
    builder.body(body.to_string()).unwrap()
}

// --- public market data ---

#[tokio::test]
async fn assets_are_keyed_by_ticker() {
    let resp = app().oneshot(get("/public/assets")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let assets: serde_json::Value = body_json(resp).await;
    assert_eq!(assets["BTC"]["name"], "Bitcoin");
    assert_eq!(assets["ETH"]["can_withdraw"], false);
}

#[tokio::test]
async fn market_route_echoes_query() {
    let resp = app()
        .oneshot(get("/public/OHLC?pair=BTC_USD&interval=60"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let data: serde_json::Value = body_json(resp).await;
    assert_eq!(data["route"], "OHLC");
    assert_eq!(data["query"]["pair"], "BTC_USD");
    assert_eq!(data["query"]["interval"], "60");
}

#[tokio::test]
async fn unknown_market_route_is_404() {
    let resp = app().oneshot(get("/public/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let data: serde_json::Value = body_json(resp).await;
    assert_eq!(data["error"], "not found");
}

// --- test hooks ---

#[tokio::test]
async fn fixed_status_route_returns_requested_code() {
    let resp = app().oneshot(get("/public/status/503")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let data: serde_json::Value = body_json(resp).await;
    assert_eq!(data["error"], "Service Unavailable");
}

#[tokio::test]
async fn fixed_status_rejects_garbage() {
    let resp = app().oneshot(get("/public/status/abc")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn not_json_claims_json() {
    let resp = app().oneshot(get("/public/not-json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/json");
    assert_eq!(&body_bytes(resp).await[..], b"not json");
}

#[tokio::test]
async fn duplicate_headers_are_both_sent() {
    let resp = app().oneshot(get("/public/duplicate-headers")).await.unwrap();

    let values: Vec<_> = resp
        .headers()
        .get_all("x-mock-dup")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(values, vec!["first", "second"]);
}

#[tokio::test]
async fn redirect_points_at_assets() {
    let resp = app().oneshot(get("/public/redirect")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "/public/assets");
}

#[tokio::test]
async fn large_body_is_one_json_string() {
    let resp = app().oneshot(get("/public/large")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    assert_eq!(bytes.len(), LARGE_BODY_BYTES);
    assert_eq!((bytes[0], bytes[bytes.len() - 1]), (b'"', b'"'));
}

// --- echo ---

#[tokio::test]
async fn public_echo_reports_method_query_and_body() {
    let resp = app()
        .oneshot(private_request("PUT", "/public/echo?a=1&b=2", None, r#"{"x":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.environment, "public");
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.query.as_deref(), Some("a=1&b=2"));
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"x":1}"#);
}

#[tokio::test]
async fn private_echo_requires_credentials() {
    let resp = app()
        .oneshot(private_request("GET", "/live/echo", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app()
        .oneshot(private_request("GET", "/demo/echo", Some(basic(API_KEY, "wrong")), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn private_echo_accepts_valid_credentials() {
    let resp = app()
        .oneshot(private_request(
            "DELETE",
            "/demo/echo",
            Some(basic(API_KEY, SECRET_KEY)),
            r#"{"id":7}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.environment, "demo");
    assert_eq!(echo.method, "DELETE");
    assert_eq!(echo.user.as_deref(), Some(API_KEY));
    assert_eq!(echo.body, r#"{"id":7}"#);
}

#[tokio::test]
async fn head_echo_has_no_body() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/public/echo")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}
