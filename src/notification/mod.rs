//! Matrix notification decoding, translation and delivery.
//!
//! One inbound push request flows through three stages:
//!
//! - `decoder`: raw body to `InboundNotification`
//! - `translator`: notification plus one device to an `OutboundMessage`
//! - `dispatcher`: one `PushTransport` call per device, failures isolated
//!
//! Use `create_dispatcher()` to wire the stages from configuration.

mod decoder;
mod dispatcher;
mod translator;
mod transport;
mod types;

use std::sync::Arc;

use crate::config::Settings;
use crate::error::Result;

pub use decoder::{decode_notification, PushRequest};
pub use dispatcher::{DeliveryAttempt, DeliveryDispatcher, DeliveryOutcome, DispatchReport};
pub use translator::{NotificationTranslator, OutboundMessage, PushData};
pub use transport::{DeliveryFailure, DeliveryReceipt, HttpPushTransport, PushTransport};
pub use types::{Content, Counts, Device, DeviceData, InboundNotification, Priority, Tweaks};

/// Create the dispatcher described by `settings`, backed by the HTTP transport.
pub fn create_dispatcher(settings: &Settings) -> Result<DeliveryDispatcher> {
    let transport = HttpPushTransport::new(&settings.push.server_url, settings.push.timeout())?;

    tracing::info!(
        endpoint = %settings.push.server_url,
        timeout_seconds = settings.push.timeout_seconds,
        expire_after_days = settings.push.expire_after_days,
        "Creating push server dispatcher"
    );

    Ok(create_dispatcher_with_transport(settings, Arc::new(transport)))
}

/// Create a dispatcher around an existing transport.
pub fn create_dispatcher_with_transport(
    settings: &Settings,
    transport: Arc<dyn PushTransport>,
) -> DeliveryDispatcher {
    let translator = NotificationTranslator::new(settings.push.expiry_horizon());
    DeliveryDispatcher::new(transport, translator).with_outbound_logging(settings.debug.outbound)
}
