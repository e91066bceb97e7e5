//! Sync client configuration.

use std::time::Duration;

use url::Url;

use crate::error::SyncError;

/// Fixed delay between reconnect attempts. Deliberately not exponential:
/// table sessions are short-lived and a bounded worst-case rejoin latency
/// matters more than connection-storm etiquette.
pub const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Messages queued while disconnected before the oldest is dropped.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/sync`.
    pub url: String,
    /// Bearer token appended as a `token` query parameter.
    pub auth_token: Option<String>,
    /// Reconnect automatically after an unintentional disconnect.
    pub auto_connect: bool,
    pub retry_delay: Duration,
    pub outbox_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/sync".to_string(),
            auth_token: None,
            auto_connect: true,
            retry_delay: RETRY_DELAY,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

impl SyncConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load from the environment, falling back to defaults. Reads `.env`
    /// if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            url: std::env::var("VEILCAST_SYNC_URL").unwrap_or(defaults.url),
            auth_token: std::env::var("VEILCAST_SYNC_TOKEN").ok(),
            auto_connect: std::env::var("VEILCAST_AUTO_CONNECT")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(defaults.auto_connect),
            retry_delay: defaults.retry_delay,
            outbox_capacity: defaults.outbox_capacity,
        }
    }

    /// The URL actually dialed, with the auth token attached.
    pub fn connection_url(&self) -> Result<Url, SyncError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| SyncError::invalid_url(&self.url, e.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(SyncError::invalid_url(
                    &self.url,
                    format!("unsupported scheme '{}'", other),
                ));
            }
        }
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}
