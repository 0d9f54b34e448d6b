//! Integration tests for the public surface: root page, open data, health,
//! and the headers every response carries.

use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use gateway_server::config::Config;
use gateway_server::routes::build_router;
use gateway_server::state::AppState;

/// Helper: start the server on a random port and return the base URL.
async fn start_test_server(enable_chat: bool) -> (String, SocketAddr) {
    let config = Config {
        app_name: "TestApp".to_string(),
        enable_chat,
        ..Config::default()
    };
    let state = AppState::from_config(&config).expect("Failed to build state");
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), addr)
}

#[tokio::test]
async fn test_open_data() {
    let (base_url, _addr) = start_test_server(true).await;

    let resp = reqwest::get(format!("{}/api/data", base_url)).await.unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "This data is open for everyone!"}));
}

#[tokio::test]
async fn test_health_check() {
    let (base_url, _addr) = start_test_server(true).await;

    let resp = reqwest::get(format!("{}/health", base_url)).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_root_serves_chat_page() {
    let (base_url, _addr) = start_test_server(true).await;

    let resp = reqwest::get(format!("{}/", base_url)).await.unwrap();

    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "got {}", content_type);
    let page = resp.text().await.unwrap();
    assert!(page.contains("TestApp"));
    assert!(page.contains("chat message"));
}

#[tokio::test]
async fn test_root_greets_when_chat_disabled() {
    let (base_url, _addr) = start_test_server(false).await;

    let resp = reqwest::get(format!("{}/", base_url)).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Hello from TestApp!");
}

#[tokio::test]
async fn test_security_and_cors_headers_on_every_response() {
    let (base_url, _addr) = start_test_server(true).await;

    for path in ["/", "/api/data", "/health"] {
        let resp = reqwest::get(format!("{}{}", base_url, path)).await.unwrap();
        let headers = resp.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff", "{}", path);
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN", "{}", path);
        assert_eq!(headers["access-control-allow-origin"], "*", "{}", path);
    }
}

#[tokio::test]
async fn test_cors_preflight_is_answered() {
    let (base_url, _addr) = start_test_server(true).await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}/api/users", base_url))
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 204);
    let headers = resp.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .contains("POST"));
    assert_eq!(headers["access-control-allow-headers"], "content-type");
}
