//! Application configuration.

use std::time::Duration;

use carelink_client::CallConfig;
use carelink_core::ConnectionConfig;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// REST API base URL, e.g. `https://api.clinic.example`.
    pub api_base: String,
    /// Connection policy.
    pub connection: ConnectionConfig,
    /// Incoming-call policy.
    pub call: CallConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            connection: ConnectionConfig::default(),
            call: CallConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build from `CARELINK_*` environment variables, with defaults.
    ///
    /// Loads `.env` first so local development picks up a checked-in file.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(base) = std::env::var("CARELINK_API_BASE") {
            config.api_base = base;
        }
        if let Some(attempts) = env_u64("CARELINK_MAX_RECONNECT_ATTEMPTS") {
            config.connection.max_reconnect_attempts = attempts as u32;
        }
        if let Some(millis) = env_u64("CARELINK_RECONNECT_DELAY_MS") {
            config.connection.reconnect_delay = Duration::from_millis(millis);
        }
        if let Some(millis) = env_u64("CARELINK_HEARTBEAT_INTERVAL_MS") {
            config.connection.heartbeat_interval = Duration::from_millis(millis);
        }
        if let Some(millis) = env_u64("CARELINK_RING_TIMEOUT_MS") {
            config.call.ring_timeout = Duration::from_millis(millis);
        }
        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|raw| raw.parse().ok())
}
