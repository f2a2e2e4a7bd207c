mod legacy;
mod settings;

pub use legacy::LegacyConfig;
pub use settings::{
    DebugConfig, LoggingConfig, OtelConfig, PushConfig, ServerConfig, Settings, TlsConfig,
    DEFAULT_PUSH_SERVER_URL,
};
