//! Matrix push gateway notify handlers

use axum::{body::Bytes, extract::State, Json};

use crate::error::Result;
use crate::metrics::RequestMetrics;
use crate::notification::decode_notification;
use crate::server::AppState;

use super::models::{ApiVersion, NotifyResponse};

/// `POST /_matrix/push/r0/notify`
#[tracing::instrument(
    name = "http.notify",
    skip(state, body),
    fields(version = "r0", body_len = body.len())
)]
pub async fn notify_r0(State(state): State<AppState>, body: Bytes) -> Result<Json<NotifyResponse>> {
    relay(&state, ApiVersion::R0, &body).await
}

/// `POST /_matrix/push/v1/notify`, same contract as r0
#[tracing::instrument(
    name = "http.notify",
    skip(state, body),
    fields(version = "v1", body_len = body.len())
)]
pub async fn notify_v1(State(state): State<AppState>, body: Bytes) -> Result<Json<NotifyResponse>> {
    relay(&state, ApiVersion::V1, &body).await
}

/// Decode, fan out, then acknowledge.
///
/// Only a decode failure reaches the caller; per-device outcomes end up in
/// logs and metrics.
async fn relay(state: &AppState, version: ApiVersion, body: &[u8]) -> Result<Json<NotifyResponse>> {
    if state.settings.debug.payloads {
        tracing::info!(
            body = %String::from_utf8_lossy(body),
            "Inbound push payload"
        );
    }

    let notification =
        decode_notification(body).inspect_err(|_| RequestMetrics::record_rejected(version.as_str()))?;

    RequestMetrics::record_received(version.as_str(), notification.devices.len());
    tracing::info!(
        event_id = %notification.event_id,
        devices = notification.devices.len(),
        "Iterating through device list"
    );

    let report = state.dispatcher.dispatch(&notification).await;

    tracing::debug!(
        dispatch_id = %report.dispatch_id,
        attempts = report.attempts.len(),
        failed = report.failed(),
        "Acknowledging push request"
    );

    Ok(Json(NotifyResponse::default()))
}
