//! WebSocket sync client using tokio-tungstenite.
//!
//! One socket per client. The read task parses server messages, resolves
//! the welcome handshake, and routes fog events; the write task drains an
//! mpsc channel so callers never hold the socket. The client is not
//! `Connected` until the server's welcome arrives, and only a welcome-gated
//! session rejoins scene rooms and flushes the offline outbox.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use veilcast_domain::{RevealedArea, SceneId, UserId};
use veilcast_shared::{ClientMessage, EmptyData, FogEventData, ServerMessage};

use crate::config::SyncConfig;
use crate::connection::ConnectionState;
use crate::error::SyncError;
use crate::outbox::Outbox;
use crate::route::{SceneRouter, SyncEvent};

type EventCallback = Box<dyn Fn(SyncEvent) + Send + Sync>;
type StateCallback = Box<dyn Fn(ConnectionState) + Send + Sync>;

/// Client for the realtime fog sync channel.
pub struct SyncClient {
    config: SyncConfig,
    user_id: Arc<RwLock<UserId>>,
    state: Arc<RwLock<ConnectionState>>,
    tx: Arc<Mutex<Option<mpsc::Sender<ClientMessage>>>>,
    router: Arc<Mutex<SceneRouter>>,
    outbox: Arc<Mutex<Outbox>>,
    on_event: Arc<Mutex<Option<EventCallback>>>,
    on_state_change: Arc<Mutex<Option<StateCallback>>>,
    intentional_disconnect: Arc<AtomicBool>,
    /// Signals the session's read loop to close the socket from our side;
    /// the server is never required to hang up first.
    shutdown: Arc<watch::Sender<bool>>,
}

impl SyncClient {
    pub fn new(config: SyncConfig, user_id: UserId) -> Self {
        let outbox = Outbox::new(config.outbox_capacity);
        Self {
            config,
            user_id: Arc::new(RwLock::new(user_id)),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            tx: Arc::new(Mutex::new(None)),
            router: Arc::new(Mutex::new(SceneRouter::new(Some(user_id)))),
            outbox: Arc::new(Mutex::new(outbox)),
            on_event: Arc::new(Mutex::new(None)),
            on_state_change: Arc::new(Mutex::new(None)),
            intentional_disconnect: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(watch::channel(false).0),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub async fn set_on_event<F>(&self, callback: F)
    where
        F: Fn(SyncEvent) + Send + Sync + 'static,
    {
        let mut on_event = self.on_event.lock().await;
        *on_event = Some(Box::new(callback));
    }

    pub async fn set_on_state_change<F>(&self, callback: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let mut on_state_change = self.on_state_change.lock().await;
        *on_state_change = Some(Box::new(callback));
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    async fn set_state(&self, new_state: ConnectionState) {
        {
            let mut state = self.state.write().await;
            if *state == new_state {
                return;
            }
            *state = new_state;
        }
        let callback = self.on_state_change.lock().await;
        if let Some(ref cb) = *callback {
            cb(new_state);
        }
    }

    /// Run until explicitly disconnected, reconnecting after each dropped
    /// session with a fixed delay.
    pub async fn run(&self) -> Result<(), SyncError> {
        self.intentional_disconnect.store(false, Ordering::SeqCst);
        loop {
            match self.connect().await {
                Ok(()) => {}
                Err(e) => tracing::warn!("sync session ended with error: {}", e),
            }
            if self.intentional_disconnect.load(Ordering::SeqCst) || !self.config.auto_connect {
                return Ok(());
            }
            self.set_state(ConnectionState::Reconnecting).await;
            tracing::info!(
                delay_secs = self.config.retry_delay.as_secs(),
                "reconnecting to sync server"
            );
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    /// Run a single session: dial, pump messages until the socket closes.
    /// Returns `Ok` on a clean close, `Err` if the dial or transport failed.
    pub async fn connect(&self) -> Result<(), SyncError> {
        self.set_state(ConnectionState::Connecting).await;
        self.shutdown.send_replace(false);
        let mut shutdown_rx = self.shutdown.subscribe();
        let url = self.config.connection_url()?;

        let (ws_stream, _) = match connect_async(url.as_str()).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!("failed to connect to sync server: {}", e);
                self.set_state(ConnectionState::Failed).await;
                return Err(SyncError::transport(e.to_string()));
            }
        };
        tracing::info!("connected to sync server at {}", self.config.url);

        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::channel::<ClientMessage>(32);
        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = Some(tx.clone());
        }

        let write_handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::error!("failed to serialize sync message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json)).await {
                    tracing::error!("failed to send sync message: {}", e);
                    break;
                }
            }
        });

        let mut welcomed = false;
        loop {
            let msg = tokio::select! {
                shutdown = shutdown_rx.wait_for(|stop| *stop) => {
                    let _ = shutdown;
                    tracing::info!("closing sync connection");
                    break;
                }
                msg = read.next() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(server_msg) => {
                        if !welcomed {
                            if let ServerMessage::Welcome { .. } = &server_msg {
                                welcomed = true;
                                self.handle_welcome(&server_msg, &tx).await;
                            } else {
                                tracing::warn!("message before welcome, dropping");
                                continue;
                            }
                        }
                        self.deliver(server_msg).await;
                    }
                    Err(e) => {
                        tracing::warn!("failed to parse server message: {}", e);
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::info!("sync server closed connection");
                    break;
                }
                Ok(Message::Ping(_)) => {}
                Err(e) => {
                    tracing::error!("sync socket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = None;
        }
        write_handle.abort();
        self.set_state(ConnectionState::Disconnected).await;

        if welcomed {
            Ok(())
        } else {
            Err(SyncError::Handshake(
                "connection closed before welcome".to_string(),
            ))
        }
    }

    /// Welcome handshake: adopt the server-assigned user id, rejoin every
    /// scene room, flush messages queued while offline.
    async fn handle_welcome(&self, msg: &ServerMessage, tx: &mpsc::Sender<ClientMessage>) {
        if let ServerMessage::Welcome { user_id, .. } = msg {
            if let Some(assigned) = user_id {
                *self.user_id.write().await = *assigned;
                self.router.lock().await.set_local_user(*assigned);
            }
        }
        self.set_state(ConnectionState::Connected).await;

        let scenes = self.router.lock().await.joined_scenes();
        for scene_id in scenes {
            let rejoin = ClientMessage::SceneJoin {
                scene_id,
                data: EmptyData::default(),
            };
            if tx.send(rejoin).await.is_err() {
                return;
            }
        }

        let queued = self.outbox.lock().await.drain();
        if !queued.is_empty() {
            tracing::info!(count = queued.len(), "flushing offline outbox");
        }
        for msg in queued {
            if tx.send(msg).await.is_err() {
                return;
            }
        }
    }

    async fn deliver(&self, message: ServerMessage) {
        let event = {
            let router = self.router.lock().await;
            router.route(message)
        };
        if let Some(event) = event {
            let callback = self.on_event.lock().await;
            if let Some(ref cb) = *callback {
                cb(event);
            }
        }
    }

    /// Send a message, or queue it if disconnected. Heartbeats are never
    /// queued; a stale heartbeat is worthless after reconnect.
    pub async fn send(&self, message: ClientMessage) -> Result<(), SyncError> {
        let tx = {
            let tx_lock = self.tx.lock().await;
            tx_lock.clone()
        };
        match tx {
            Some(tx) if self.state().await == ConnectionState::Connected => tx
                .send(message)
                .await
                .map_err(|e| SyncError::transport(e.to_string())),
            _ => {
                if !matches!(message, ClientMessage::Heartbeat) {
                    self.outbox.lock().await.push(message);
                }
                Err(SyncError::NotConnected)
            }
        }
    }

    pub async fn join_scene(&self, scene_id: SceneId) -> Result<(), SyncError> {
        self.router.lock().await.join(scene_id);
        self.send(ClientMessage::SceneJoin {
            scene_id,
            data: EmptyData::default(),
        })
        .await
    }

    pub async fn leave_scene(&self, scene_id: SceneId) -> Result<(), SyncError> {
        self.router.lock().await.leave(scene_id);
        self.send(ClientMessage::SceneLeave {
            scene_id,
            data: EmptyData::default(),
        })
        .await
    }

    /// Broadcast newly revealed areas to peers in the scene room.
    pub async fn reveal(
        &self,
        scene_id: SceneId,
        areas: Vec<RevealedArea>,
    ) -> Result<(), SyncError> {
        let user_id = *self.user_id.read().await;
        self.send(ClientMessage::FogReveal {
            scene_id,
            user_id,
            timestamp: Utc::now(),
            data: FogEventData { areas, user_id },
        })
        .await
    }

    /// Broadcast a conceal override. The concealed areas are carried in
    /// full so late-joining peers can tombstone by id.
    pub async fn conceal(
        &self,
        scene_id: SceneId,
        areas: Vec<RevealedArea>,
    ) -> Result<(), SyncError> {
        let user_id = *self.user_id.read().await;
        self.send(ClientMessage::FogConceal {
            scene_id,
            user_id,
            timestamp: Utc::now(),
            data: FogEventData { areas, user_id },
        })
        .await
    }

    pub async fn heartbeat(&self) -> Result<(), SyncError> {
        self.send(ClientMessage::Heartbeat).await
    }

    /// Leave every scene room and close the socket from this side. `run`
    /// will not reconnect after this.
    pub async fn disconnect(&self) {
        self.intentional_disconnect.store(true, Ordering::SeqCst);

        // Leave frames go straight to the write task while the socket is
        // still up; while offline they are pointless and must not land in
        // the outbox (a later session would flush them right after
        // rejoining the same scenes).
        let tx = {
            let tx_lock = self.tx.lock().await;
            tx_lock.clone()
        };
        let connected = self.state().await == ConnectionState::Connected;
        let scenes = {
            let mut router = self.router.lock().await;
            let scenes = router.joined_scenes();
            for scene_id in &scenes {
                router.leave(*scene_id);
            }
            scenes
        };
        if let (Some(tx), true) = (tx, connected) {
            for scene_id in scenes {
                let leave = ClientMessage::SceneLeave {
                    scene_id,
                    data: EmptyData::default(),
                };
                if tx.send(leave).await.is_err() {
                    break;
                }
            }
        }

        self.shutdown.send_replace(true);
        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = None;
        }
        self.set_state(ConnectionState::Disconnected).await;
    }
}

impl Clone for SyncClient {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            user_id: Arc::clone(&self.user_id),
            state: Arc::clone(&self.state),
            tx: Arc::clone(&self.tx),
            router: Arc::clone(&self.router),
            outbox: Arc::clone(&self.outbox),
            on_event: Arc::clone(&self.on_event),
            on_state_change: Arc::clone(&self.on_state_change),
            intentional_disconnect: Arc::clone(&self.intentional_disconnect),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}
