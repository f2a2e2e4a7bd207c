use std::env;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::legacy::LegacyConfig;
use crate::error::AppError;

/// Default Ubuntu Touch push endpoint
pub const DEFAULT_PUSH_SERVER_URL: &str = "https://push.ubports.com/notify";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Plain HTTP port, 0 disables the plain listener
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on inbound request bodies
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    /// HTTPS port, 0 disables the TLS listener
    #[serde(default)]
    pub port: u16,
    /// PEM certificate chain
    pub cert_file: Option<PathBuf>,
    /// PEM private key
    pub key_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Ubuntu Touch push endpoint notifications are relayed to
    #[serde(default = "default_push_server_url")]
    pub server_url: String,
    /// Per-call timeout for the outbound client in seconds
    #[serde(default = "default_push_timeout")]
    pub timeout_seconds: u64,
    /// How long the provider may hold an undelivered notification
    #[serde(default = "default_expire_after_days")]
    pub expire_after_days: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebugConfig {
    /// Log raw inbound request bodies
    #[serde(default)]
    pub payloads: bool,
    /// Log every serialized outbound message
    #[serde(default)]
    pub outbound: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_otel_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    // Room for a maximum-size Matrix event plus envelope and devices
    1024 * 1024
}

fn default_push_server_url() -> String {
    DEFAULT_PUSH_SERVER_URL.to_string()
}

fn default_push_timeout() -> u64 {
    10
}

fn default_expire_after_days() -> u32 {
    70 // 10 weeks
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "matrix-pushgw".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let legacy_path =
            env::var("PUSHGW_LEGACY_CONFIG").unwrap_or_else(|_| "matrix-pushgw.conf".into());

        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("push.server_url", default_push_server_url())?
            .set_default("push.timeout_seconds", default_push_timeout() as i64)?
            .set_default("push.expire_after_days", i64::from(default_expire_after_days()))?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        if let Some(legacy) = LegacyConfig::load(&legacy_path)? {
            builder = legacy.apply(builder)?;
        }

        // PUSHGW__PUSH__SERVER_URL, PUSHGW__SERVER__PORT, PUSHGW__TLS__CERT_FILE, ...
        let builder = builder.add_source(
            Environment::with_prefix("PUSHGW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject settings the gateway cannot start with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.server.port == 0 && self.tls.port == 0 {
            return Err(AppError::ConfigurationMissing(
                "neither server.port nor tls.port is configured".to_string(),
            ));
        }

        if self.tls.port != 0 && (self.tls.cert_file.is_none() || self.tls.key_file.is_none()) {
            return Err(AppError::ConfigurationMissing(
                "tls.port requires tls.cert_file and tls.key_file".to_string(),
            ));
        }

        if self.push.server_url.trim().is_empty() {
            return Err(AppError::ConfigurationMissing(
                "push.server_url is empty".to_string(),
            ));
        }

        if self.push.timeout_seconds == 0 {
            return Err(AppError::ConfigurationMissing(
                "push.timeout_seconds must be positive".to_string(),
            ));
        }

        if self.push.expire_after_days == 0 {
            return Err(AppError::ConfigurationMissing(
                "push.expire_after_days must be positive".to_string(),
            ));
        }

        if chrono::Utc::now()
            .checked_add_signed(self.push.expiry_horizon())
            .is_none()
        {
            return Err(AppError::ConfigurationMissing(format!(
                "push.expire_after_days {} is beyond the representable date range",
                self.push.expire_after_days
            )));
        }

        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn tls_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.tls.port)
    }
}

impl PushConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn expiry_horizon(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.expire_after_days))
    }
}

impl TlsConfig {
    pub fn is_enabled(&self) -> bool {
        self.port != 0
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            server_url: default_push_server_url(),
            timeout_seconds: default_push_timeout(),
            expire_after_days: default_expire_after_days(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_otel_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.push.server_url, DEFAULT_PUSH_SERVER_URL);
        assert_eq!(settings.push.timeout(), Duration::from_secs(10));
        assert_eq!(settings.push.expiry_horizon(), chrono::Duration::weeks(10));
        assert!(!settings.tls.is_enabled());
        assert!(!settings.logging.is_json());
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_no_listener_is_missing_configuration() {
        let mut settings = Settings::default();
        settings.server.port = 0;

        let err = settings.validate().unwrap_err();
        assert!(matches!(err, AppError::ConfigurationMissing(_)));
    }

    #[test]
    fn test_tls_port_requires_key_material() {
        let mut settings = Settings::default();
        settings.tls.port = 5443;
        settings.tls.cert_file = Some(PathBuf::from("cert.pem"));

        assert!(matches!(
            settings.validate(),
            Err(AppError::ConfigurationMissing(_))
        ));

        settings.tls.key_file = Some(PathBuf::from("key.pem"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_tls_only_is_valid() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        settings.tls.port = 5443;
        settings.tls.cert_file = Some(PathBuf::from("cert.pem"));
        settings.tls.key_file = Some(PathBuf::from("key.pem"));

        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_push_url_is_rejected() {
        let mut settings = Settings::default();
        settings.push.server_url = "  ".to_string();

        assert!(matches!(
            settings.validate(),
            Err(AppError::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        let mut settings = Settings::default();
        settings.push.expire_after_days = 0;

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_horizon_past_date_range_is_rejected() {
        let mut settings = Settings::default();
        settings.push.expire_after_days = 100_000_000;

        assert!(matches!(
            settings.validate(),
            Err(AppError::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_body_limit_fits_maximum_event() {
        assert!(Settings::default().server.max_body_bytes > 65_536 * 2);
    }

    #[test]
    fn test_addresses() {
        let mut settings = Settings::default();
        settings.tls.port = 5443;
        assert_eq!(settings.server_addr(), "0.0.0.0:5000");
        assert_eq!(settings.tls_addr(), "0.0.0.0:5443");
    }
}
