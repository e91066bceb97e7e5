//! Typed request/response protocol between the offload manager and the
//! vision worker.
//!
//! Requests carry owned values only — walls and tokens are moved (or
//! cloned) into the message, never shared by reference, so the worker can
//! never observe a torn read of caller-owned state. `UpdateWalls` and
//! `ClearCache` are fire-and-forget; everything else is correlated by
//! `request_id`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use veilcast_domain::{Token, TokenId, VisionBlocker, VisionPolygon};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerRequest {
    CalculateVision {
        request_id: u64,
        token: Token,
        walls: Option<Vec<VisionBlocker>>,
        range: Option<f64>,
    },
    CalculateMultiVision {
        request_id: u64,
        tokens: Vec<Token>,
        walls: Option<Vec<VisionBlocker>>,
        range: Option<f64>,
    },
    /// Replace the worker's wall set and invalidate its memo cache. Must be
    /// sent whenever the wall list changes; skipping it is a correctness
    /// bug (stale visibility), not a performance issue.
    UpdateWalls { walls: Vec<VisionBlocker> },
    /// Unconditionally invalidate the memo cache.
    ClearCache,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerResponse {
    VisionResult {
        request_id: u64,
        polygon: VisionPolygon,
    },
    MultiVisionResult {
        request_id: u64,
        polygons: HashMap<TokenId, VisionPolygon>,
    },
    Error { request_id: u64, error: String },
}
