//! Support for the flat JSON configuration file used by earlier gateway deployments.
//!
//! ```json
//! {
//!     "PlainPort": 5000,
//!     "SslPort": 5443,
//!     "SslCert": "/etc/pushgw/cert.pem",
//!     "SslKey": "/etc/pushgw/key.pem",
//!     "Debug": true,
//!     "DebugWS": false,
//!     "PushServerUrl": "https://push.ubports.com/notify",
//!     "PushServerPort": 0
//! }
//! ```
//!
//! Values are mapped onto the sectioned settings and layered below environment
//! variables.

use std::io::ErrorKind;
use std::path::Path;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::settings::DEFAULT_PUSH_SERVER_URL;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyConfig {
    #[serde(rename = "PlainPort")]
    pub plain_port: Option<u16>,
    #[serde(rename = "SslPort")]
    pub ssl_port: Option<u16>,
    #[serde(rename = "SslCert")]
    pub ssl_cert: Option<String>,
    #[serde(rename = "SslKey")]
    pub ssl_key: Option<String>,
    #[serde(rename = "Debug")]
    pub debug: Option<bool>,
    #[serde(rename = "DebugWS")]
    pub debug_ws: Option<bool>,
    #[serde(rename = "PushServerUrl")]
    pub push_server_url: Option<String>,
    #[serde(rename = "PushServerPort")]
    pub push_server_port: Option<u16>,
}

impl LegacyConfig {
    /// Read the legacy file, `Ok(None)` when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Foreign(Box::new(e))),
        };

        Self::parse(&raw)
            .map(Some)
            .map_err(|e| ConfigError::Message(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Translate into the sectioned layout understood by `Settings`.
    pub fn to_sections(&self) -> Result<Value, ConfigError> {
        let mut server = Map::new();
        let mut tls = Map::new();
        let mut push = Map::new();
        let mut debug = Map::new();

        if let Some(port) = self.plain_port {
            server.insert("port".into(), json!(port));
        }
        if let Some(port) = self.ssl_port {
            tls.insert("port".into(), json!(port));
        }
        if let Some(cert) = &self.ssl_cert {
            tls.insert("cert_file".into(), json!(cert));
        }
        if let Some(key) = &self.ssl_key {
            tls.insert("key_file".into(), json!(key));
        }
        if let Some(enabled) = self.debug {
            debug.insert("payloads".into(), json!(enabled));
        }
        if let Some(enabled) = self.debug_ws {
            debug.insert("outbound".into(), json!(enabled));
        }
        if let Some(url) = self.push_url()? {
            push.insert("server_url".into(), json!(url));
        }

        Ok(json!({
            "server": server,
            "tls": tls,
            "push": push,
            "debug": debug,
        }))
    }

    /// Add the legacy values as a configuration source.
    pub fn apply(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let sections = self.to_sections()?.to_string();
        Ok(builder.add_source(File::from_str(&sections, FileFormat::Json)))
    }

    /// Resolve the provider URL, folding a non-zero `PushServerPort` into it.
    fn push_url(&self) -> Result<Option<String>, ConfigError> {
        let port = self.push_server_port.filter(|port| *port != 0);

        let Some(port) = port else {
            return Ok(self.push_server_url.clone());
        };

        let base = self
            .push_server_url
            .as_deref()
            .unwrap_or(DEFAULT_PUSH_SERVER_URL);
        let mut url = Url::parse(base)
            .map_err(|e| ConfigError::Message(format!("invalid PushServerUrl {}: {}", base, e)))?;
        url.set_port(Some(port))
            .map_err(|_| ConfigError::Message(format!("PushServerUrl {} cannot carry a port", base)))?;

        Ok(Some(url.to_string()))
    }
}
