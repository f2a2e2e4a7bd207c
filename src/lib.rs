// Supporting modules
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Push relay
pub mod notification;

// Application layer
pub mod api;
pub mod server;
pub mod shutdown;
pub mod triggers;
