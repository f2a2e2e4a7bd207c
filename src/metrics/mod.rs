//! Prometheus metrics for the push gateway.
//!
//! - Inbound requests (received per API version, rejected payloads)
//! - Fan-out size (devices per notification)
//! - Outbound deliveries (outcome, failure kind, latency)

mod helpers;

pub use helpers::{encode_metrics, DeliveryMetrics, RequestMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Histogram, HistogramVec, IntCounter, IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "pushgw";

lazy_static! {
    // ============================================================================
    // Inbound Metrics
    // ============================================================================

    /// Push requests accepted, by API version
    pub static ref NOTIFICATIONS_RECEIVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_received_total", METRIC_PREFIX),
        "Total push requests decoded successfully",
        &["version"]
    ).unwrap();

    /// Push requests rejected because the body did not decode
    pub static ref NOTIFICATIONS_REJECTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_rejected_total", METRIC_PREFIX),
        "Total push requests rejected as malformed",
        &["version"]
    ).unwrap();

    /// Devices listed per notification
    pub static ref DEVICES_PER_NOTIFICATION: Histogram = register_histogram!(
        format!("{}_devices_per_notification", METRIC_PREFIX),
        "Distribution of target devices per notification",
        vec![0.0, 1.0, 2.0, 3.0, 5.0, 10.0, 25.0]
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Deliveries accepted by the push server
    pub static ref DELIVERIES_SUCCEEDED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_deliveries_succeeded_total", METRIC_PREFIX),
        "Total device deliveries accepted by the push server"
    ).unwrap();

    /// Deliveries that failed, by failure kind
    pub static ref DELIVERIES_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_deliveries_failed_total", METRIC_PREFIX),
        "Total device deliveries that failed",
        &["kind"]
    ).unwrap();

    /// Latency of a single provider call
    pub static ref DELIVERY_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_delivery_latency_seconds", METRIC_PREFIX),
        "Push server call latency in seconds",
        &["outcome"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();
}
