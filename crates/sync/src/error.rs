//! Sync client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid sync server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Not connected to sync server")]
    NotConnected,

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }
}
