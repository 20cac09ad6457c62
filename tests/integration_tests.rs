//! Integration tests for Transcript Guard HTTP endpoints
//!
//! Drives the full router (body limit, CORS and tracing layers included) in-process
//! with `tower::ServiceExt::oneshot`, without binding a socket.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use transcript_guard::{Config, create_app};

const MAP_ID: &str = "0f7a5a8e-2d55-4f61-9a0d-5b1c3e7f9a21";

/// Send one request through a router and decode the JSON response
async fn send(app: Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body.to_string())).await
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(create_app(Config::default()), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["metrics"]["total_requests"], 0);
    assert_eq!(body["metrics"]["dropped_tool_results"], 0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_sanitize_endpoint_drops_orphans() {
    let (status, body) = post_json(
        create_app(Config::default()),
        "/v1/messages/sanitize",
        json!({"messages": [{
          "role": "user",
          "content": [
            {"type": "tool_result", "tool_use_id": "tool_orphan", "content": "{\"ok\":true}"},
            {"type": "text", "text": "recrie esse mapa"}
          ]
        }]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dropped_tool_results"], 1);
    assert_eq!(
        body["messages"],
        json!([{"role": "user", "content": [{"type": "text", "text": "recrie esse mapa"}]}])
    );
}

#[tokio::test]
async fn test_sanitize_endpoint_rejects_unknown_role() {
    let (status, body) = post_json(
        create_app(Config::default()),
        "/v1/messages/sanitize",
        json!({"messages": [{"role": "system", "content": "be terse"}]}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["code"], 400);
}

#[tokio::test]
async fn test_sanitize_endpoint_requires_messages() {
    let (status, _) =
        post_json(create_app(Config::default()), "/v1/messages/sanitize", json!({"msgs": []}))
            .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_prepare_endpoint_returns_sanitized_request() {
    let (status, body) = post_json(
        create_app(Config::default()),
        "/v1/agent/prepare",
        json!({
          "map_id": MAP_ID,
          "systemPrompt": "You edit mind maps.",
          "messages": [
            {"role": "user", "content": [{"type": "tool_result", "tool_use_id": "t9", "content": "late"}]},
            {"role": "user", "content": "continue"}
          ],
          "maxTokens": "2048"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dropped_tool_results"], 1);
    assert_eq!(body["request"]["maxTokens"], 2048);
    assert_eq!(body["request"]["mode"], "agent");
    assert_eq!(body["request"]["messages"][0], json!({"role": "user", "content": "late"}));
}

#[tokio::test]
async fn test_prepare_endpoint_lists_contract_issues() {
    let (status, body) = post_json(
        create_app(Config::default()),
        "/v1/agent/prepare",
        json!({"map_id": "nope", "systemPrompt": "", "messages": []}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    let issues = body["error"]["issues"].as_array().expect("issues array");
    assert_eq!(issues.len(), 3);
    assert_eq!(issues[0], json!({"path": "map_id", "message": "Invalid map ID"}));
}

#[tokio::test]
async fn test_metrics_track_requests() {
    let app = create_app(Config::default());

    let transcript = json!({"messages": [
      {"role": "assistant", "content": [{"type": "tool_use", "id": "a", "name": "move"}]},
      {"role": "user", "content": [
        {"type": "tool_result", "tool_use_id": "a", "content": "ok"},
        {"type": "tool_result", "tool_use_id": "b", "content": "stale"}
      ]}
    ]});
    post_json(app.clone(), "/v1/messages/sanitize", transcript).await;
    post_json(app.clone(), "/v1/agent/prepare", json!({})).await;

    let (_, body) = send(app, "GET", "/health", None).await;
    assert_eq!(body["metrics"]["total_requests"], 2);
    assert_eq!(body["metrics"]["rejected_requests"], 1);
    assert_eq!(body["metrics"]["sanitized_transcripts"], 1);
    assert_eq!(body["metrics"]["dropped_tool_results"], 1);
}

#[tokio::test]
async fn test_body_limit_is_enforced() {
    let mut config = Config::default();
    config.server.max_body_bytes = 64;

    let long_text = "x".repeat(256);
    let (status, _) = post_json(
        create_app(config),
        "/v1/messages/sanitize",
        json!({"messages": [{"role": "user", "content": long_text}]}),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
