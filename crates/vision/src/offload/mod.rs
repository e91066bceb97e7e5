//! Worker offload manager.
//!
//! Moves geometry-kernel invocations off the interactive thread onto a
//! dedicated worker task, correlates asynchronous requests and responses by
//! id, enforces per-request timeouts, and exposes the cache-invalidation
//! messages the worker's memoization depends on.
//!
//! Construct one `VisionOffload` at session start and pass it by reference;
//! teardown (`terminate`) is deterministic, and `restart` rejects every
//! in-flight request as cancellation rather than dropping it silently.

mod protocol;
mod worker;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};

use veilcast_domain::{Token, TokenId, VisionBlocker, VisionPolygon};

use crate::error::VisionError;

pub use protocol::{WorkerRequest, WorkerResponse};

/// Timeout windows for correlated requests.
#[derive(Debug, Clone, Copy)]
pub struct OffloadConfig {
    pub single_timeout: Duration,
    pub multi_timeout: Duration,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            single_timeout: Duration::from_secs(5),
            multi_timeout: Duration::from_secs(10),
        }
    }
}

/// Running diagnostics counters. Read-only, never authoritative for
/// decision logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffloadStats {
    /// Correlated requests issued (single and multi each count once).
    pub requests_issued: u64,
    /// Individual token calculations completed; a multi-vision response
    /// counts once per token.
    pub calculations_completed: u64,
}

enum WorkerReply {
    Single(VisionPolygon),
    Multi(HashMap<TokenId, VisionPolygon>),
}

type Pending = HashMap<u64, oneshot::Sender<Result<WorkerReply, VisionError>>>;

struct WorkerSlot {
    request_tx: Option<mpsc::UnboundedSender<WorkerRequest>>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

/// Offloads vision calculations to a worker task, one per manager.
pub struct VisionOffload {
    config: OffloadConfig,
    slot: Mutex<WorkerSlot>,
    pending: Arc<Mutex<Pending>>,
    /// Sticky: once initialization fails, every call fails fast until
    /// `restart()`.
    init_error: Mutex<Option<String>>,
    next_request_id: AtomicU64,
    requests_issued: AtomicU64,
    calculations_completed: Arc<AtomicU64>,
    response_delay: Option<Duration>,
}

impl VisionOffload {
    pub fn new() -> Self {
        Self::with_config(OffloadConfig::default())
    }

    pub fn with_config(config: OffloadConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(WorkerSlot {
                request_tx: None,
                tasks: Vec::new(),
            }),
            pending: Arc::new(Mutex::new(HashMap::new())),
            init_error: Mutex::new(None),
            next_request_id: AtomicU64::new(0),
            requests_issued: AtomicU64::new(0),
            calculations_completed: Arc::new(AtomicU64::new(0)),
            response_delay: None,
        }
    }

    /// Hold worker responses for `delay` before delivery. Test hook.
    #[cfg(test)]
    pub(crate) fn with_response_delay(config: OffloadConfig, delay: Duration) -> Self {
        let mut offload = Self::with_config(config);
        offload.response_delay = Some(delay);
        offload
    }

    /// Compute one token's visibility on the worker.
    ///
    /// `walls`, when provided, replaces the worker's wall snapshot for this
    /// and subsequent calculations (without invalidating its cache — see
    /// [`VisionOffload::update_walls`]).
    pub async fn calculate_vision(
        &self,
        token: Token,
        walls: Option<Vec<VisionBlocker>>,
        range: Option<f64>,
    ) -> Result<VisionPolygon, VisionError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        let reply = self
            .send_correlated(
                request_id,
                WorkerRequest::CalculateVision {
                    request_id,
                    token,
                    walls,
                    range,
                },
                self.config.single_timeout,
            )
            .await?;
        match reply {
            WorkerReply::Single(polygon) => Ok(polygon),
            WorkerReply::Multi(_) => Err(VisionError::Worker(
                "mismatched reply shape for single-vision request".into(),
            )),
        }
    }

    /// Compute visibility for several tokens in one round trip.
    pub async fn calculate_multi_vision(
        &self,
        tokens: Vec<Token>,
        walls: Option<Vec<VisionBlocker>>,
        range: Option<f64>,
    ) -> Result<HashMap<TokenId, VisionPolygon>, VisionError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        let reply = self
            .send_correlated(
                request_id,
                WorkerRequest::CalculateMultiVision {
                    request_id,
                    tokens,
                    walls,
                    range,
                },
                self.config.multi_timeout,
            )
            .await?;
        match reply {
            WorkerReply::Multi(polygons) => Ok(polygons),
            WorkerReply::Single(_) => Err(VisionError::Worker(
                "mismatched reply shape for multi-vision request".into(),
            )),
        }
    }

    /// Replace the worker's wall set and invalidate its memo cache.
    /// Fire-and-forget; must be called whenever the wall list changes.
    pub async fn update_walls(&self, walls: Vec<VisionBlocker>) -> Result<(), VisionError> {
        let tx = self.ensure_worker().await?;
        tx.send(WorkerRequest::UpdateWalls { walls })
            .map_err(|_| VisionError::WorkerUnavailable("worker channel closed".into()))
    }

    /// Unconditionally invalidate the worker's memo cache. A no-op when the
    /// worker was never started (nothing is cached).
    pub async fn clear_cache(&self) -> Result<(), VisionError> {
        let slot = self.slot.lock().await;
        if let Some(tx) = &slot.request_tx {
            tx.send(WorkerRequest::ClearCache)
                .map_err(|_| VisionError::WorkerUnavailable("worker channel closed".into()))?;
        }
        Ok(())
    }

    /// Running request/calculation counters.
    pub fn stats(&self) -> OffloadStats {
        OffloadStats {
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            calculations_completed: self.calculations_completed.load(Ordering::Relaxed),
        }
    }

    /// Tear the worker down. Every pending request is rejected with
    /// `Cancelled` — callers must treat this as cancellation-with-error,
    /// not silence.
    pub async fn terminate(&self) {
        {
            let mut slot = self.slot.lock().await;
            slot.request_tx = None;
            for task in slot.tasks.drain(..) {
                task.abort();
            }
        }
        let mut pending = self.pending.lock().await;
        let cancelled = pending.len();
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(VisionError::Cancelled));
        }
        if cancelled > 0 {
            tracing::debug!(cancelled, "rejected pending vision requests on terminate");
        }
    }

    /// Tear down and reinitialize, clearing a sticky initialization error.
    pub async fn restart(&self) -> Result<(), VisionError> {
        self.terminate().await;
        {
            let mut init_error = self.init_error.lock().await;
            *init_error = None;
        }
        self.ensure_worker().await.map(|_| ())
    }

    async fn send_correlated(
        &self,
        request_id: u64,
        request: WorkerRequest,
        window: Duration,
    ) -> Result<WorkerReply, VisionError> {
        let tx = self.ensure_worker().await?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id, reply_tx);

        if tx.send(request).is_err() {
            self.pending.lock().await.remove(&request_id);
            return Err(VisionError::WorkerUnavailable(
                "worker channel closed".into(),
            ));
        }
        self.requests_issued.fetch_add(1, Ordering::Relaxed);

        match tokio::time::timeout(window, reply_rx).await {
            Ok(Ok(result)) => result,
            // Sender dropped without a reply: terminate/restart raced us.
            Ok(Err(_)) => Err(VisionError::Cancelled),
            Err(_) => {
                // Remove the entry so a late worker response finds no match
                // and is discarded instead of settling anything.
                self.pending.lock().await.remove(&request_id);
                Err(VisionError::Timeout {
                    request_id,
                    elapsed_ms: window.as_millis() as u64,
                })
            }
        }
    }

    /// Lazily spawn the worker and response dispatcher on first use.
    async fn ensure_worker(
        &self,
    ) -> Result<mpsc::UnboundedSender<WorkerRequest>, VisionError> {
        {
            let init_error = self.init_error.lock().await;
            if let Some(error) = init_error.as_ref() {
                return Err(VisionError::WorkerUnavailable(error.clone()));
            }
        }

        let mut slot = self.slot.lock().await;
        if let Some(tx) = &slot.request_tx {
            if !tx.is_closed() {
                return Ok(tx.clone());
            }
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                let message = format!("no async runtime for vision worker: {e}");
                let mut init_error = self.init_error.lock().await;
                *init_error = Some(message.clone());
                return Err(VisionError::WorkerUnavailable(message));
            }
        };

        let (channels, worker_task) = worker::spawn(
            &handle,
            worker::WorkerOptions {
                response_delay: self.response_delay,
            },
        );
        let dispatcher_task = handle.spawn(dispatch_responses(
            channels.response_rx,
            Arc::clone(&self.pending),
            Arc::clone(&self.calculations_completed),
        ));

        slot.tasks = vec![worker_task, dispatcher_task];
        slot.request_tx = Some(channels.request_tx.clone());
        tracing::debug!("vision worker started");
        Ok(channels.request_tx)
    }
}

impl Default for VisionOffload {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve worker responses against the pending table. Responses with no
/// matching entry (timed out or cancelled) are discarded; ids are unique
/// and consumed on first match, so a promise settles exactly once.
async fn dispatch_responses(
    mut responses: mpsc::UnboundedReceiver<WorkerResponse>,
    pending: Arc<Mutex<Pending>>,
    calculations: Arc<AtomicU64>,
) {
    while let Some(response) = responses.recv().await {
        let (request_id, result) = match response {
            WorkerResponse::VisionResult {
                request_id,
                polygon,
            } => {
                calculations.fetch_add(1, Ordering::Relaxed);
                (request_id, Ok(WorkerReply::Single(polygon)))
            }
            WorkerResponse::MultiVisionResult {
                request_id,
                polygons,
            } => {
                calculations.fetch_add(polygons.len() as u64, Ordering::Relaxed);
                (request_id, Ok(WorkerReply::Multi(polygons)))
            }
            WorkerResponse::Error { request_id, error } => {
                (request_id, Err(VisionError::Worker(error)))
            }
        };

        let sender = pending.lock().await.remove(&request_id);
        match sender {
            Some(sender) => {
                if sender.send(result).is_err() {
                    tracing::debug!(request_id, "caller gone before delivery");
                }
            }
            None => {
                tracing::debug!(request_id, "no matching pending request, discarding");
            }
        }
    }
}
