use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;
use crate::triggers::{notify_r0, notify_v1};

use super::health::health;
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Matrix push gateway API
        .nest(
            "/_matrix/push",
            Router::new()
                .route("/r0/notify", post(notify_r0))
                .route("/v1/notify", post(notify_v1)),
        )
}
