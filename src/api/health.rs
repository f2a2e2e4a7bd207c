//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub push: PushHealthResponse,
    pub listeners: ListenerHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct PushHealthResponse {
    pub server_url: String,
    pub timeout_seconds: u64,
    pub expire_after_days: u32,
}

#[derive(Debug, Serialize)]
pub struct ListenerHealthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_port: Option<u16>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let settings = &state.settings;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        push: PushHealthResponse {
            server_url: state.dispatcher.endpoint().to_string(),
            timeout_seconds: settings.push.timeout_seconds,
            expire_after_days: settings.push.expire_after_days,
        },
        listeners: ListenerHealthResponse {
            plain_port: Some(settings.server.port).filter(|p| *p != 0),
            tls_port: Some(settings.tls.port).filter(|p| *p != 0),
        },
    })
}
