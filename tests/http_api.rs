//! Health, metrics and routing tests

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use matrix_pushgw::config::Settings;
use matrix_pushgw::server::{create_app, AppState};

fn app_with(settings: Settings) -> Router {
    create_app(AppState::new(settings).unwrap())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_push_target() {
    let mut settings = Settings::default();
    settings.push.server_url = "https://push.example.org/notify".to_string();

    let (status, body) = send(app_with(settings), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["push"]["server_url"], "https://push.example.org/notify");
    assert_eq!(health["listeners"]["plain_port"], 5000);
    assert!(health["listeners"]["tls_port"].is_null());
}

#[tokio::test]
async fn test_metrics_exposes_gateway_counters() {
    let app = app_with(Settings::default());

    // Record at least one rejection so the family is present
    let reject = Request::builder()
        .method("POST")
        .uri("/_matrix/push/v1/notify")
        .body(Body::from("oops"))
        .unwrap();
    let (status, _) = send(app.clone(), reject).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app, get("/metrics")).await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("pushgw_notifications_rejected_total"));
}

#[tokio::test]
async fn test_notify_requires_post() {
    let (status, _) = send(app_with(Settings::default()), get("/_matrix/push/r0/notify")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (status, _) = send(app_with(Settings::default()), get("/_matrix/push/r1/notify")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let mut settings = Settings::default();
    settings.server.max_body_bytes = 16;

    let request = Request::builder()
        .method("POST")
        .uri("/_matrix/push/r0/notify")
        .header("content-length", "64")
        .body(Body::from(vec![b' '; 64]))
        .unwrap();
    let (status, _) = send(app_with(settings), request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
