//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.

pub mod secrets;

use crate::error::{Error, Result};
use secrecy::SecretString;

/// One POSIX year, the default retention for persisted event records.
pub const DEFAULT_RETENTION_SECONDS: i64 = 31_556_926;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    /// Primary chat webhook URL.
    pub webhook_url: SecretString,
    /// Optional secondary webhook for delivery-failure notices.
    pub fail_webhook_url: Option<SecretString>,
    /// Base URL of the provider health API. Only needed by `poll`/`run`.
    pub health_api_url: Option<String>,
    /// How long persisted records live before the store may discard them.
    pub retention_seconds: i64,
    /// Deployment label (dev/staging/prod). Observability tagging only.
    pub environment: String,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// In production, systemd EnvironmentFile provides the vars.
    pub fn from_env() -> Result<Self> {
        let retention_seconds = match std::env::var("RETENTION_SECONDS") {
            Ok(raw) => raw
                .parse::<i64>()
                .map_err(|_| Error::Config(format!("RETENTION_SECONDS is not a number: {raw}")))?,
            Err(_) => DEFAULT_RETENTION_SECONDS,
        };

        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            webhook_url: SecretString::from(required_var("WEBHOOK_URL")?),
            fail_webhook_url: std::env::var("FAIL_WEBHOOK_URL").ok().map(SecretString::from),
            health_api_url: std::env::var("HEALTH_API_URL").ok(),
            retention_seconds,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Record retention as a chrono duration.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_seconds)
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}
