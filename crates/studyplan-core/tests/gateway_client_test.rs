//! Integration tests for `GatewayClient` against a local axum server that
//! plays the model provider.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use studyplan_core::gateway::{FALLBACK_PLAN, GatewayClient, GatewayConfig, GatewayError, PlanModel};

#[derive(Clone)]
struct Provider {
    status: StatusCode,
    body: Value,
    delay: Duration,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn completions(
    State(provider): State<Provider>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    provider.seen.lock().unwrap().push((auth, request));
    tokio::time::sleep(provider.delay).await;
    (provider.status, Json(provider.body.clone()))
}

/// Start a fake provider and return its base URL and request log.
async fn spawn_provider(
    status: StatusCode,
    body: Value,
    delay: Duration,
) -> (String, Arc<Mutex<Vec<(Option<String>, Value)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let provider = Provider {
        status,
        body,
        delay,
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(provider);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1"), seen)
}

fn client(base_url: &str, timeout: Duration) -> GatewayClient {
    GatewayClient::new(
        GatewayConfig::new("test-key")
            .with_base_url(base_url)
            .with_model("test/model")
            .with_timeout(timeout),
    )
    .unwrap()
}

#[tokio::test]
async fn success_returns_message_content() {
    let (url, seen) = spawn_provider(
        StatusCode::OK,
        json!({ "choices": [ { "message": { "role": "assistant", "content": "## Сегодня" } } ] }),
        Duration::ZERO,
    )
    .await;

    let text = client(&url, Duration::from_secs(5))
        .complete("system text", "user prompt")
        .await
        .unwrap();
    assert_eq!(text, "## Сегодня");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, request) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(request["model"], "test/model");
    assert_eq!(request["messages"][0]["role"], "system");
    assert_eq!(request["messages"][0]["content"], "system text");
    assert_eq!(request["messages"][1]["role"], "user");
    assert_eq!(request["messages"][1]["content"], "user prompt");
}

#[tokio::test]
async fn missing_content_degrades_to_fallback() {
    let (url, _) = spawn_provider(StatusCode::OK, json!({ "choices": [] }), Duration::ZERO).await;

    let text = client(&url, Duration::from_secs(5))
        .complete("s", "p")
        .await
        .unwrap();
    assert_eq!(text, FALLBACK_PLAN);
}

#[tokio::test]
async fn status_429_is_rate_limited() {
    let (url, seen) = spawn_provider(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": "slow down" }),
        Duration::ZERO,
    )
    .await;

    let err = client(&url, Duration::from_secs(5))
        .complete("s", "p")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::RateLimited));
    assert_eq!(seen.lock().unwrap().len(), 1, "no retry after 429");
}

#[tokio::test]
async fn status_402_is_quota_exceeded() {
    let (url, _) =
        spawn_provider(StatusCode::PAYMENT_REQUIRED, json!({}), Duration::ZERO).await;

    let err = client(&url, Duration::from_secs(5))
        .complete("s", "p")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::QuotaExceeded));
}

#[tokio::test]
async fn other_status_is_upstream_error() {
    let (url, _) = spawn_provider(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": "down" }),
        Duration::ZERO,
    )
    .await;

    let err = client(&url, Duration::from_secs(5))
        .complete("s", "p")
        .await
        .unwrap_err();
    match err {
        GatewayError::Upstream { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("down"));
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_provider_times_out() {
    let (url, _) = spawn_provider(
        StatusCode::OK,
        json!({ "choices": [ { "message": { "content": "late" } } ] }),
        Duration::from_secs(2),
    )
    .await;

    let err = client(&url, Duration::from_millis(200))
        .complete("s", "p")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn null_choices_degrade_to_fallback() {
    for body in [json!({ "choices": null }), json!({ "choices": [null] })] {
        let (url, _) = spawn_provider(StatusCode::OK, body, Duration::ZERO).await;

        let text = client(&url, Duration::from_secs(5))
            .complete("s", "p")
            .await
            .unwrap();
        assert_eq!(text, FALLBACK_PLAN);
    }
}

#[tokio::test]
async fn non_json_success_body_is_decode_error() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::OK, "<html>gateway page</html>") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let err = client(&format!("http://{addr}/v1"), Duration::from_secs(5))
        .complete("s", "p")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)), "got {err:?}");
}
