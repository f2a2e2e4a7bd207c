//! Translation of Matrix notifications into Ubuntu Touch push messages.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;

use super::{Device, InboundNotification};

/// Message accepted by the Ubuntu Touch push service `/notify` endpoint.
///
/// Borrows from the inbound notification it was built from, one per device.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage<'a> {
    pub appid: &'a str,
    /// Absolute expiry, e.g. `2019-10-08T14:48:00.000Z`
    pub expire_on: String,
    pub token: &'a str,
    pub clear_pending: bool,
    pub replace_tag: &'a str,
    pub data: PushData<'a>,
}

/// Envelope the device-side push helper unpacks
#[derive(Debug, Clone, Serialize)]
pub struct PushData<'a> {
    pub notification: &'a InboundNotification,
}

/// Builds one outbound message per target device
#[derive(Debug, Clone)]
pub struct NotificationTranslator {
    expire_after: Duration,
}

impl NotificationTranslator {
    pub fn new(expire_after: Duration) -> Self {
        Self { expire_after }
    }

    pub fn expire_after(&self) -> Duration {
        self.expire_after
    }

    /// Translate `notification` for a single `device` as of `now`.
    pub fn translate<'a>(
        &self,
        notification: &'a InboundNotification,
        device: &'a Device,
        now: DateTime<Utc>,
    ) -> OutboundMessage<'a> {
        OutboundMessage {
            appid: &device.app_id,
            expire_on: format_expiry(expiry_from(now, self.expire_after)),
            token: &device.pushkey,
            clear_pending: notification.counts.unread == 0,
            replace_tag: replace_tag(notification),
            data: PushData { notification },
        }
    }
}

/// Collapse key for pending notifications: the room, falling back to the
/// event for payloads that carry no room.
fn replace_tag(notification: &InboundNotification) -> &str {
    [
        notification.room_id.as_str(),
        notification.event_id.as_str(),
        notification.id.as_str(),
    ]
    .into_iter()
    .find(|tag| !tag.is_empty())
    .unwrap_or_default()
}

/// `now + horizon`, pinned to the latest representable instant on overflow.
fn expiry_from(now: DateTime<Utc>, horizon: Duration) -> DateTime<Utc> {
    now.checked_add_signed(horizon).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn format_expiry(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
