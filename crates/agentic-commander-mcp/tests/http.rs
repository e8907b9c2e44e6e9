//! HTTP transport tests driven through the router without a socket.

#![cfg(feature = "http")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use agentic_commander::{CommandEngine, ExecutorConfig, Policy};
use agentic_commander_mcp::protocol::ProtocolHandler;
use agentic_commander_mcp::tools::ToolRegistry;
use agentic_commander_mcp::transport::HttpTransport;

fn app(token: Option<&str>) -> axum::Router {
    let engine = Arc::new(
        CommandEngine::new(
            Policy::allow_all().with_default_blocklist(),
            ExecutorConfig::default(),
        )
        .unwrap(),
    );
    let registry = Arc::new(ToolRegistry::with_builtin_tools(engine, true).unwrap());
    let handler = Arc::new(ProtocolHandler::new(registry));
    HttpTransport::new(handler, token.map(str::to_string)).router()
}

fn post(body: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_request_roundtrip() {
    let response = app(None)
        .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"], json!({}));
}

#[tokio::test]
async fn test_notification_is_accepted_without_body() {
    let response = app(None)
        .oneshot(post(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_parse_error_over_http() {
    let response = app(None)
        .oneshot(post("{not json", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_non_utf8_body_is_parse_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(vec![b'{', 0xff, b'}']))
        .unwrap();
    let response = app(None).oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["error"]["message"], "Parse error: body is not valid UTF-8");
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let response = app(Some("s3cret"))
        .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32900);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized() {
    let response = app(Some("s3cret"))
        .oneshot(post(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            Some("guess"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_correct_token_passes() {
    let response = app(Some("s3cret"))
        .oneshot(post(
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#,
            Some("s3cret"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 7);
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_health_skips_auth() {
    let response = app(Some("s3cret"))
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_blocked_command_over_http() {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 3,
        "method": "tools/call",
        "params": { "name": "execute_command", "arguments": { "command": "rm -rf /" } }
    });
    let response = app(None)
        .oneshot(post(&body.to_string(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["isError"], true);
}
