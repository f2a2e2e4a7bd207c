use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::DeliveryMetrics;

use super::{
    Device, DeliveryFailure, InboundNotification, NotificationTranslator, PushTransport,
};

/// Outcome of one device delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered { status: u16 },
    Failed { kind: &'static str, error: String },
}

/// One delivery attempt, in device-list order
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryAttempt {
    pub app_id: String,
    pub pushkey: String,
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

impl DeliveryAttempt {
    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered { .. })
    }
}

/// Result of fanning one notification out to its devices
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub dispatch_id: Uuid,
    pub attempts: Vec<DeliveryAttempt>,
}

impl DispatchReport {
    fn new(dispatch_id: Uuid, capacity: usize) -> Self {
        Self {
            dispatch_id,
            attempts: Vec::with_capacity(capacity),
        }
    }

    /// Number of devices the push server accepted
    pub fn delivered(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_delivered()).count()
    }

    /// Number of devices that could not be reached
    pub fn failed(&self) -> usize {
        self.attempts.len() - self.delivered()
    }
}

/// Relays notifications to the push server, one call per device.
///
/// Devices are handled sequentially in list order. A failed device is logged
/// and skipped; it never stops the remaining deliveries and is never
/// surfaced to the caller as an error.
pub struct DeliveryDispatcher {
    transport: Arc<dyn PushTransport>,
    translator: NotificationTranslator,
    log_outbound: bool,
}

impl DeliveryDispatcher {
    pub fn new(transport: Arc<dyn PushTransport>, translator: NotificationTranslator) -> Self {
        Self {
            transport,
            translator,
            log_outbound: false,
        }
    }

    /// Log every serialized outbound message, not only failed ones
    pub fn with_outbound_logging(mut self, enabled: bool) -> Self {
        self.log_outbound = enabled;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Deliver `notification` to every device it lists.
    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip(self, notification),
        fields(
            event_id = %notification.event_id,
            room_id = %notification.room_id,
            device_count = notification.devices.len()
        )
    )]
    pub async fn dispatch(&self, notification: &InboundNotification) -> DispatchReport {
        let mut report = DispatchReport::new(Uuid::new_v4(), notification.devices.len());

        for device in &notification.devices {
            let outcome = self.deliver(notification, device).await;
            report.attempts.push(DeliveryAttempt {
                app_id: device.app_id.clone(),
                pushkey: device.pushkey.clone(),
                outcome,
            });
        }

        tracing::info!(
            dispatch_id = %report.dispatch_id,
            delivered = report.delivered(),
            failed = report.failed(),
            "Relayed notification to push server"
        );

        report
    }

    async fn deliver(&self, notification: &InboundNotification, device: &Device) -> DeliveryOutcome {
        tracing::debug!(pushkey = %device.pushkey, app_id = %device.app_id, "Processing device");

        let started = Instant::now();
        let message = self.translator.translate(notification, device, Utc::now());

        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                let failure = DeliveryFailure::from(e);
                tracing::error!(
                    pushkey = %device.pushkey,
                    error = %failure,
                    "Failed to serialize push message"
                );
                DeliveryMetrics::record_failure(failure.kind(), started.elapsed());
                return failed(failure);
            }
        };

        if self.log_outbound {
            tracing::info!(pushkey = %device.pushkey, payload = %payload, "Outbound push message");
        }

        match self.transport.deliver(&payload).await {
            Ok(receipt) => {
                DeliveryMetrics::record_success(started.elapsed());
                tracing::debug!(
                    pushkey = %device.pushkey,
                    status = receipt.status.as_u16(),
                    "Push server accepted notification"
                );
                DeliveryOutcome::Delivered {
                    status: receipt.status.as_u16(),
                }
            }
            Err(failure) => {
                DeliveryMetrics::record_failure(failure.kind(), started.elapsed());
                tracing::error!(
                    pushkey = %device.pushkey,
                    app_id = %device.app_id,
                    endpoint = %self.transport.endpoint(),
                    error = %failure,
                    payload = %payload,
                    "Error relaying push message to push server"
                );
                failed(failure)
            }
        }
    }
}

fn failed(failure: DeliveryFailure) -> DeliveryOutcome {
    DeliveryOutcome::Failed {
        kind: failure.kind(),
        error: failure.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;
    use reqwest::StatusCode;

    use super::*;
    use crate::notification::{Counts, DeliveryReceipt};

    /// Records every payload and fails for the configured push keys
    #[derive(Default)]
    struct RecordingTransport {
        failing_tokens: Vec<String>,
        payloads: Mutex<Vec<serde_json::Value>>,
    }

    impl RecordingTransport {
        fn failing(tokens: &[&str]) -> Self {
            Self {
                failing_tokens: tokens.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            }
        }

        fn tokens(&self) -> Vec<String> {
            self.payloads
                .lock()
                .unwrap()
                .iter()
                .map(|p| p["token"].as_str().unwrap().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl PushTransport for RecordingTransport {
        async fn deliver(&self, payload: &str) -> Result<DeliveryReceipt, DeliveryFailure> {
            let value: serde_json::Value = serde_json::from_str(payload)?;
            let token = value["token"].as_str().unwrap_or_default().to_string();
            self.payloads.lock().unwrap().push(value);

            if self.failing_tokens.contains(&token) {
                return Err(DeliveryFailure::Status {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: "unavailable".to_string(),
                });
            }

            Ok(DeliveryReceipt {
                status: StatusCode::OK,
                response_bytes: 0,
            })
        }

        fn endpoint(&self) -> &str {
            "memory://push"
        }
    }

    fn dispatcher(transport: Arc<RecordingTransport>) -> DeliveryDispatcher {
        DeliveryDispatcher::new(transport, NotificationTranslator::new(Duration::weeks(10)))
    }

    fn notification_for(pushkeys: &[&str]) -> InboundNotification {
        InboundNotification {
            event_id: "$1".to_string(),
            room_id: "!r:example.org".to_string(),
            counts: Counts {
                unread: 2,
                missed_calls: 0,
            },
            devices: pushkeys
                .iter()
                .map(|pk| Device {
                    app_id: "a1".to_string(),
                    pushkey: pk.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_one_attempt_per_device_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let notification = notification_for(&["pk1", "pk2", "pk3"]);

        let report = dispatcher(transport.clone()).dispatch(&notification).await;

        assert_eq!(report.attempts.len(), 3);
        assert_eq!(report.delivered(), 3);
        assert_eq!(transport.tokens(), vec!["pk1", "pk2", "pk3"]);
        let pushkeys: Vec<&str> = report.attempts.iter().map(|a| a.pushkey.as_str()).collect();
        assert_eq!(pushkeys, vec!["pk1", "pk2", "pk3"]);
    }

    #[tokio::test]
    async fn test_no_devices_means_no_calls() {
        let transport = Arc::new(RecordingTransport::default());

        let report = dispatcher(transport.clone())
            .dispatch(&notification_for(&[]))
            .await;

        assert!(report.attempts.is_empty());
        assert!(transport.tokens().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_devices() {
        let transport = Arc::new(RecordingTransport::failing(&["pk1", "pk3"]));
        let notification = notification_for(&["pk1", "pk2", "pk3", "pk4"]);

        let report = dispatcher(transport.clone()).dispatch(&notification).await;

        assert_eq!(transport.tokens(), vec!["pk1", "pk2", "pk3", "pk4"]);
        assert_eq!(report.delivered(), 2);
        assert_eq!(report.failed(), 2);
        assert!(!report.attempts[0].is_delivered());
        assert!(report.attempts[1].is_delivered());
        assert_eq!(
            report.attempts[2].outcome,
            DeliveryOutcome::Failed {
                kind: "status",
                error: "Push server responded with 503 Service Unavailable: unavailable"
                    .to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_all_devices_failing_still_attempts_each() {
        let transport = Arc::new(RecordingTransport::failing(&["pk1", "pk2"]));

        let report = dispatcher(transport.clone())
            .with_outbound_logging(true)
            .dispatch(&notification_for(&["pk1", "pk2"]))
            .await;

        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.delivered(), 0);
    }

    #[tokio::test]
    async fn test_each_payload_is_translated_for_its_device() {
        let transport = Arc::new(RecordingTransport::default());
        let mut notification = notification_for(&["pk1", "pk2"]);
        notification.devices[1].app_id = "a2".to_string();

        dispatcher(transport.clone()).dispatch(&notification).await;

        let payloads = transport.payloads.lock().unwrap();
        assert_eq!(payloads[0]["appid"], "a1");
        assert_eq!(payloads[1]["appid"], "a2");
        for payload in payloads.iter() {
            assert_eq!(payload["replace_tag"], "!r:example.org");
            assert_eq!(payload["clear_pending"], false);
            assert_eq!(payload["data"]["notification"]["event_id"], "$1");
        }
    }

    #[test]
    fn test_report_serializes_outcomes() {
        let report = DispatchReport {
            dispatch_id: Uuid::nil(),
            attempts: vec![DeliveryAttempt {
                app_id: "a1".to_string(),
                pushkey: "pk1".to_string(),
                outcome: DeliveryOutcome::Delivered { status: 200 },
            }],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["attempts"][0]["outcome"], "delivered");
        assert_eq!(value["attempts"][0]["status"], 200);
    }
}
