//! HTTP server settings shared by the services

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Bind address and CORS policy of one service
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS; any origin when unset
    pub allowed_origin: Option<String>,
}

impl ServerConfig {
    /// Load settings from `{PREFIX}_HOST`, `{PREFIX}_PORT` and
    /// `{PREFIX}_ALLOWED_ORIGIN`
    pub fn from_env(prefix: &str, default_port: u16) -> Result<Self> {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .add_source(Environment::with_prefix(prefix))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
