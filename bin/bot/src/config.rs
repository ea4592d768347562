//! Centralized host configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (`DATABASE_URL`, `PROCESSOR__POLLING_INTERVAL_SECONDS`,
//! `WEBHOOK__URL`, …).

use serde::Deserialize;

/// Host configuration.
#[derive(Debug, Deserialize)]
pub struct BotConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Polling processor configuration.
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Outbound webhook transport configuration.
    pub webhook: WebhookConfig,
}

/// Polling processor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// Seconds between polls for due occurrences.
    #[serde(default = "default_polling_interval_seconds")]
    pub polling_interval_seconds: u64,
}

/// Outbound webhook transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint that receives dispatched messages.
    pub url: String,

    /// Per-send timeout in seconds.
    #[serde(default = "default_send_timeout_seconds")]
    pub send_timeout_seconds: u64,
}

fn default_polling_interval_seconds() -> u64 {
    60
}

fn default_send_timeout_seconds() -> u64 {
    30
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            polling_interval_seconds: default_polling_interval_seconds(),
        }
    }
}

impl BotConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
