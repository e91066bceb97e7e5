//! Veilcast realtime sync: WebSocket client for propagating fog-of-war
//! events between peers in a scene.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod outbox;
pub mod route;

pub use client::SyncClient;
pub use config::SyncConfig;
pub use connection::ConnectionState;
pub use error::SyncError;
pub use route::{SceneRouter, SyncEvent};
