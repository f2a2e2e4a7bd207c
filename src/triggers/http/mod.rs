//! HTTP notification trigger handlers
//!
//! Endpoints a Matrix homeserver calls to hand over notifications:
//! - `/_matrix/push/r0/notify`
//! - `/_matrix/push/v1/notify`

mod handlers;
mod models;

// Re-export handlers
pub use handlers::{notify_r0, notify_v1};

// Re-export models
pub use models::{ApiVersion, NotifyResponse};
