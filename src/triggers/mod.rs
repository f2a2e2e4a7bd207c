mod http;

pub use http::{notify_r0, notify_v1, ApiVersion, NotifyResponse};
