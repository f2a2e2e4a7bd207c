//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    DELIVERIES_FAILED_TOTAL, DELIVERIES_SUCCEEDED_TOTAL, DELIVERY_LATENCY,
    DEVICES_PER_NOTIFICATION, NOTIFICATIONS_RECEIVED_TOTAL, NOTIFICATIONS_REJECTED_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    exposition_text(buffer)
}

fn exposition_text(buffer: Vec<u8>) -> Result<String, prometheus::Error> {
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Helper struct for recording inbound request metrics
pub struct RequestMetrics;

impl RequestMetrics {
    /// Record a decoded push request and its fan-out
    pub fn record_received(version: &str, devices: usize) {
        NOTIFICATIONS_RECEIVED_TOTAL
            .with_label_values(&[version])
            .inc();
        DEVICES_PER_NOTIFICATION.observe(devices as f64);
    }

    /// Record a push request that failed to decode
    pub fn record_rejected(version: &str) {
        NOTIFICATIONS_REJECTED_TOTAL
            .with_label_values(&[version])
            .inc();
    }
}

/// Helper struct for recording delivery metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    /// Record a delivery the push server accepted
    pub fn record_success(elapsed: Duration) {
        DELIVERIES_SUCCEEDED_TOTAL.inc();
        DELIVERY_LATENCY
            .with_label_values(&["success"])
            .observe(elapsed.as_secs_f64());
    }

    /// Record a failed delivery
    pub fn record_failure(kind: &str, elapsed: Duration) {
        DELIVERIES_FAILED_TOTAL.with_label_values(&[kind]).inc();
        DELIVERY_LATENCY
            .with_label_values(&["failure"])
            .observe(elapsed.as_secs_f64());
    }
}
