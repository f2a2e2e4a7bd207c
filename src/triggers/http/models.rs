use serde::Serialize;

/// Acknowledgment returned once a push request has been decoded.
///
/// Always serializes as `{}`, whatever happened to the individual devices.
#[derive(Debug, Default, Serialize)]
pub struct NotifyResponse {}

/// Push gateway API version a request arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    R0,
    V1,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::R0 => "r0",
            ApiVersion::V1 => "v1",
        }
    }
}
