//! Decoding of Matrix push gateway request bodies.

use serde::de::Error as _;
use serde::Deserialize;

use crate::error::{AppError, Result};

use super::types::object_or_default;
use super::InboundNotification;

/// Top-level envelope of `POST /_matrix/push/{r0,v1}/notify`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PushRequest {
    #[serde(deserialize_with = "object_or_default")]
    pub notification: InboundNotification,
}

/// Decode a raw request body into a notification.
///
/// The body must be exactly one JSON object. Unknown fields are ignored and
/// missing ones fall back to their zero values; any other mismatch fails the
/// whole request.
pub fn decode_notification(body: &[u8]) -> Result<InboundNotification> {
    let starts_with_object = body
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');

    if !starts_with_object {
        return Err(AppError::MalformedPayload(serde_json::Error::custom(
            "push request body must be a JSON object",
        )));
    }

    let request: PushRequest = serde_json::from_slice(body)?;
    Ok(request.notification)
}
