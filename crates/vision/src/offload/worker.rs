//! The vision worker task.
//!
//! One worker per manager; requests are serialized by the task's own event
//! loop. The worker owns the wall set and a memo cache keyed on (observer
//! state, range) — deliberately not on the wall list, which is why
//! `UpdateWalls` / `ClearCache` exist as explicit invalidation messages.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use tokio::sync::mpsc;

use veilcast_domain::{Token, TokenId, VisionBlocker, VisionPolygon};

use crate::geometry::calculate_vision_polygon;

use super::protocol::{WorkerRequest, WorkerResponse};

pub(super) struct WorkerOptions {
    /// Hold every correlated response for this long before sending.
    /// Test hook for timeout behavior; `None` in production.
    pub response_delay: Option<Duration>,
}

pub(super) struct WorkerChannels {
    pub request_tx: mpsc::UnboundedSender<WorkerRequest>,
    pub response_rx: mpsc::UnboundedReceiver<WorkerResponse>,
}

/// Spawn the worker task on the current runtime.
pub(super) fn spawn(
    handle: &tokio::runtime::Handle,
    options: WorkerOptions,
) -> (WorkerChannels, tokio::task::JoinHandle<()>) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();

    let task = handle.spawn(run(request_rx, response_tx, options));

    (
        WorkerChannels {
            request_tx,
            response_rx,
        },
        task,
    )
}

/// Memo entries kept before the cache resets wholesale. Every token move is
/// a distinct key, so the cache would otherwise grow without bound between
/// wall edits.
const CACHE_CAP: usize = 256;

struct WorkerState {
    walls: Vec<VisionBlocker>,
    cache: HashMap<u64, VisionPolygon>,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            walls: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Requests may carry a wall snapshot; it replaces the worker's set but
    /// does not invalidate the cache — that is `UpdateWalls`' contract.
    fn adopt_walls(&mut self, walls: Option<Vec<VisionBlocker>>) {
        if let Some(walls) = walls {
            self.walls = walls;
        }
    }

    fn calculate(&mut self, token: &Token, range: Option<f64>) -> Result<VisionPolygon, String> {
        if !token.position.is_finite() {
            return Err(format!("non-finite position for token {}", token.id));
        }
        let effective = range.unwrap_or(token.vision.range);
        if !effective.is_finite() {
            return Err(format!("non-finite range for token {}", token.id));
        }

        let key = cache_key(token, range);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }
        let polygon = calculate_vision_polygon(token, &self.walls, range);
        if self.cache.len() >= CACHE_CAP {
            self.cache.clear();
        }
        self.cache.insert(key, polygon.clone());
        Ok(polygon)
    }
}

async fn run(
    mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
    responses: mpsc::UnboundedSender<WorkerResponse>,
    options: WorkerOptions,
) {
    let mut state = WorkerState::new();

    while let Some(request) = requests.recv().await {
        let response = match request {
            WorkerRequest::CalculateVision {
                request_id,
                token,
                walls,
                range,
            } => {
                state.adopt_walls(walls);
                match state.calculate(&token, range) {
                    Ok(polygon) => WorkerResponse::VisionResult {
                        request_id,
                        polygon,
                    },
                    Err(error) => WorkerResponse::Error { request_id, error },
                }
            }
            WorkerRequest::CalculateMultiVision {
                request_id,
                tokens,
                walls,
                range,
            } => {
                state.adopt_walls(walls);
                let mut polygons: HashMap<TokenId, VisionPolygon> =
                    HashMap::with_capacity(tokens.len());
                let mut failure: Option<String> = None;
                for token in &tokens {
                    match state.calculate(token, range) {
                        Ok(polygon) => {
                            polygons.insert(token.id, polygon);
                        }
                        Err(error) => {
                            failure = Some(error);
                            break;
                        }
                    }
                }
                match failure {
                    None => WorkerResponse::MultiVisionResult {
                        request_id,
                        polygons,
                    },
                    Some(error) => WorkerResponse::Error { request_id, error },
                }
            }
            WorkerRequest::UpdateWalls { walls } => {
                state.walls = walls;
                state.cache.clear();
                continue;
            }
            WorkerRequest::ClearCache => {
                state.cache.clear();
                continue;
            }
        };

        if let Some(delay) = options.response_delay {
            tokio::time::sleep(delay).await;
        }
        if responses.send(response).is_err() {
            // Manager gone; nothing left to serve.
            break;
        }
    }

    tracing::debug!("vision worker shut down");
}

/// Memo key over observer state and range override. Coordinates hash by bit
/// pattern; the kernel is deterministic, so equal keys mean equal output.
fn cache_key(token: &Token, range: Option<f64>) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    token.id.hash(&mut hasher);
    token.position.x.to_bits().hash(&mut hasher);
    token.position.y.to_bits().hash(&mut hasher);
    token.rotation.to_bits().hash(&mut hasher);
    token.vision.enabled.hash(&mut hasher);
    token.vision.range.to_bits().hash(&mut hasher);
    token.vision.angle.to_bits().hash(&mut hasher);
    token.vision.vision_mode.hash(&mut hasher);
    match range {
        Some(r) => {
            1u8.hash(&mut hasher);
            r.to_bits().hash(&mut hasher);
        }
        None => 0u8.hash(&mut hasher),
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use veilcast_domain::{Point2D, VisionConfig};

    fn token_at(x: f64, y: f64) -> Token {
        Token {
            id: TokenId::new(),
            position: Point2D::new(x, y),
            rotation: 0.0,
            vision: VisionConfig::omnidirectional(100.0),
        }
    }

    #[test]
    fn test_cache_key_sensitive_to_position_and_range() {
        let token = token_at(0.0, 0.0);
        let moved = Token {
            position: Point2D::new(1.0, 0.0),
            ..token.clone()
        };
        assert_ne!(cache_key(&token, None), cache_key(&moved, None));
        assert_ne!(cache_key(&token, None), cache_key(&token, Some(50.0)));
        assert_eq!(cache_key(&token, Some(50.0)), cache_key(&token, Some(50.0)));
    }

    #[test]
    fn test_worker_state_caches_until_walls_update() {
        let mut state = WorkerState::new();
        let token = token_at(0.0, 0.0);

        let open = state.calculate(&token, None).expect("calculate");
        assert!(!open.is_empty());

        // A wall arriving without UpdateWalls semantics: adopt_walls does
        // not clear the cache, so the stale polygon is served.
        state.adopt_walls(Some(vec![VisionBlocker {
            id: veilcast_domain::WallId::new(),
            points: vec![Point2D::new(50.0, -10.0), Point2D::new(50.0, 10.0)],
            blocks_light: true,
            blocks_movement: true,
            blocks_sound: None,
            door_state: None,
            height: None,
            terrain_type: None,
        }]));
        let stale = state.calculate(&token, None).expect("calculate");
        assert_eq!(stale, open);

        // UpdateWalls clears the cache and the wall now occludes.
        state.cache.clear();
        let fresh = state.calculate(&token, None).expect("calculate");
        assert_ne!(fresh, open);
    }

    #[test]
    fn test_cache_stays_bounded_as_tokens_move() {
        let mut state = WorkerState::new();
        let mut token = token_at(0.0, 0.0);
        for step in 0..(CACHE_CAP * 3) {
            token.position = Point2D::new(step as f64, 0.0);
            state.calculate(&token, None).expect("calculate");
            assert!(state.cache.len() <= CACHE_CAP);
        }
        // Recent entries still serve as memos after a reset.
        let before = state.cache.len();
        state.calculate(&token, None).expect("cached");
        assert_eq!(state.cache.len(), before);
    }

    #[test]
    fn test_worker_state_rejects_non_finite_input() {
        let mut state = WorkerState::new();
        let mut token = token_at(0.0, 0.0);
        token.position = Point2D::new(f64::INFINITY, 0.0);
        let err = state.calculate(&token, None).expect_err("must fail");
        assert!(err.contains("non-finite"));
    }
}
