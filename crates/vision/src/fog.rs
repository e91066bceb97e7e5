//! Fog-of-war state engine.
//!
//! Owns the session-authoritative set of revealed areas per scene. Multiple
//! peers (players and GM) reveal and conceal concurrently with no shared
//! memory, so every mutation is commutative and idempotent by area id:
//! last-writer-wins per area on the event timestamp, with conceal
//! tombstones so reveal/conceal arriving out of order converge to the same
//! visible set.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use veilcast_domain::{
    AreaId, ExplorationMode, FogOfWarData, RevealedArea, SceneId, TokenId, VisionPolygon,
};

use crate::error::VisionError;
use crate::ports::{ClockPort, FogStorePort, SystemClock};

/// Conceal markers kept per scene before the oldest is evicted. A dropped
/// tombstone only matters for a reveal older than everything still
/// retained, which at this horizon has already lost the merge anyway.
const TOMBSTONE_CAP: usize = 1024;

#[derive(Debug, Clone)]
struct SceneFog {
    enabled: bool,
    mode: ExplorationMode,
    areas: HashMap<AreaId, RevealedArea>,
    /// Conceal markers: an area id may not be re-revealed by an event older
    /// than its tombstone.
    tombstones: HashMap<AreaId, DateTime<Utc>>,
    /// Gradual mode: each token's current vision polygon, never persisted.
    live: HashMap<TokenId, VisionPolygon>,
}

impl SceneFog {
    fn from_data(data: FogOfWarData) -> Self {
        let areas = if data.reset_on_load.unwrap_or(false) {
            HashMap::new()
        } else {
            data.revealed_areas
                .into_iter()
                .map(|area| (area.id, area))
                .collect()
        };
        Self {
            enabled: data.enabled,
            mode: data.exploration_mode,
            areas,
            tombstones: HashMap::new(),
            live: HashMap::new(),
        }
    }

    fn record_tombstone(&mut self, id: AreaId, timestamp: DateTime<Utc>) {
        self.tombstones
            .entry(id)
            .and_modify(|ts| *ts = (*ts).max(timestamp))
            .or_insert(timestamp);
        if self.tombstones.len() > TOMBSTONE_CAP {
            let oldest = self
                .tombstones
                .iter()
                .min_by_key(|entry| *entry.1)
                .map(|entry| *entry.0);
            if let Some(oldest) = oldest {
                self.tombstones.remove(&oldest);
            }
        }
    }

    fn to_data(&self) -> FogOfWarData {
        FogOfWarData {
            enabled: self.enabled,
            revealed_areas: sorted_areas(&self.areas),
            exploration_mode: self.mode,
            reset_on_load: None,
        }
    }
}

fn sorted_areas(areas: &HashMap<AreaId, RevealedArea>) -> Vec<RevealedArea> {
    let mut out: Vec<RevealedArea> = areas.values().cloned().collect();
    out.sort_by(|a, b| {
        a.revealed_at
            .cmp(&b.revealed_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

/// Per-scene fog-of-war state, authoritative for the current session.
pub struct FogEngine {
    scenes: DashMap<SceneId, SceneFog>,
    clock: Arc<dyn ClockPort>,
}

impl FogEngine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            scenes: DashMap::new(),
            clock,
        }
    }

    /// Install a scene's fog state, honoring `reset_on_load`. Replaces any
    /// previously loaded state for the scene.
    pub fn load_scene(&self, scene_id: SceneId, data: FogOfWarData) {
        self.scenes.insert(scene_id, SceneFog::from_data(data));
    }

    /// Drop a scene, returning a final snapshot for persistence.
    pub fn unload_scene(&self, scene_id: SceneId) -> Option<FogOfWarData> {
        self.scenes.remove(&scene_id).map(|(_, fog)| fog.to_data())
    }

    /// Current snapshot for persistence or late-joining peers.
    pub fn snapshot(&self, scene_id: SceneId) -> Option<FogOfWarData> {
        self.scenes.get(&scene_id).map(|fog| fog.to_data())
    }

    pub fn is_enabled(&self, scene_id: SceneId) -> bool {
        self.scenes.get(&scene_id).map_or(false, |fog| fog.enabled)
    }

    pub fn set_enabled(&self, scene_id: SceneId, enabled: bool) {
        if let Some(mut fog) = self.scenes.get_mut(&scene_id) {
            fog.enabled = enabled;
        }
    }

    pub fn exploration_mode(&self, scene_id: SceneId) -> Option<ExplorationMode> {
        self.scenes.get(&scene_id).map(|fog| fog.mode)
    }

    /// Apply a newly computed vision polygon for a token.
    ///
    /// Returns the `RevealedArea` appended under permanent mode — the
    /// caller broadcasts it to peers and hands it to the store. Gradual
    /// mode replaces the token's live contribution without history; full
    /// mode (and disabled fog) is a no-op.
    pub fn reveal(
        &self,
        scene_id: SceneId,
        token_id: TokenId,
        polygon: VisionPolygon,
    ) -> Option<RevealedArea> {
        let mut fog = match self.scenes.get_mut(&scene_id) {
            Some(fog) => fog,
            None => {
                tracing::warn!(%scene_id, "reveal for unloaded scene ignored");
                return None;
            }
        };
        if !fog.enabled || polygon.is_empty() {
            return None;
        }

        match fog.mode {
            ExplorationMode::Full => None,
            ExplorationMode::Gradual => {
                fog.live.insert(token_id, polygon);
                None
            }
            ExplorationMode::Permanent => {
                let area = RevealedArea {
                    id: AreaId::new(),
                    points: polygon.points,
                    revealed_at: self.clock.now(),
                    revealed_by: Some(token_id),
                    is_permanent: true,
                };
                fog.areas.insert(area.id, area.clone());
                Some(area)
            }
        }
    }

    /// Explicit GM conceal override. Valid in every mode, including
    /// permanent. Returns the ids actually removed (for broadcast);
    /// unknown ids are skipped, not errors.
    pub fn conceal(&self, scene_id: SceneId, area_ids: &[AreaId]) -> Vec<AreaId> {
        let mut fog = match self.scenes.get_mut(&scene_id) {
            Some(fog) => fog,
            None => return Vec::new(),
        };
        let now = self.clock.now();
        let mut removed = Vec::new();
        for id in area_ids {
            fog.record_tombstone(*id, now);
            if fog.areas.remove(id).is_some() {
                removed.push(*id);
            }
        }
        removed
    }

    /// Merge reveal events from a peer (or from persisted state).
    ///
    /// Idempotent by id: the same area applied twice leaves one entry.
    /// Per-area last-writer-wins on `revealed_at`; a reveal older than an
    /// existing conceal tombstone for the id is dropped.
    pub fn apply_remote_reveal(&self, scene_id: SceneId, areas: Vec<RevealedArea>) {
        let mut fog = match self.scenes.get_mut(&scene_id) {
            Some(fog) => fog,
            None => {
                tracing::warn!(%scene_id, "remote reveal for unloaded scene ignored");
                return;
            }
        };
        for area in areas {
            if let Some(tombstone) = fog.tombstones.get(&area.id) {
                if *tombstone >= area.revealed_at {
                    continue;
                }
                fog.tombstones.remove(&area.id);
            }
            match fog.areas.get(&area.id) {
                Some(existing) if existing.revealed_at >= area.revealed_at => {}
                _ => {
                    fog.areas.insert(area.id, area);
                }
            }
        }
    }

    /// Merge conceal events from a peer. Concealing an id that is not
    /// present is a no-op on the visible set (the tombstone is still
    /// recorded so a slower reveal for the id cannot resurrect it).
    pub fn apply_remote_conceal(
        &self,
        scene_id: SceneId,
        area_ids: &[AreaId],
        timestamp: DateTime<Utc>,
    ) {
        let mut fog = match self.scenes.get_mut(&scene_id) {
            Some(fog) => fog,
            None => return,
        };
        for id in area_ids {
            let newer_reveal = fog
                .areas
                .get(id)
                .map_or(false, |area| area.revealed_at > timestamp);
            if newer_reveal {
                // The reveal won this round; drop the conceal.
                continue;
            }
            fog.areas.remove(id);
            fog.record_tombstone(*id, timestamp);
        }
    }

    /// The visible set, in a deterministic order every peer agrees on.
    pub fn revealed_areas(&self, scene_id: SceneId) -> Vec<RevealedArea> {
        self.scenes
            .get(&scene_id)
            .map(|fog| sorted_areas(&fog.areas))
            .unwrap_or_default()
    }

    /// Gradual mode: the current per-token vision polygons.
    pub fn live_vision(&self, scene_id: SceneId) -> Vec<(TokenId, VisionPolygon)> {
        self.scenes
            .get(&scene_id)
            .map(|fog| {
                let mut live: Vec<(TokenId, VisionPolygon)> =
                    fog.live.iter().map(|(k, v)| (*k, v.clone())).collect();
                live.sort_by_key(|(id, _)| *id);
                live
            })
            .unwrap_or_default()
    }

    /// Drop a token's live contribution (token removed or vision lost).
    pub fn clear_live(&self, scene_id: SceneId, token_id: TokenId) {
        if let Some(mut fog) = self.scenes.get_mut(&scene_id) {
            fog.live.remove(&token_id);
        }
    }

    /// Repair after a transport gap: pull the durable reveal set and merge
    /// it with remote-reveal semantics. Returns how many areas are visible
    /// afterwards.
    pub async fn reconcile(
        &self,
        scene_id: SceneId,
        store: &dyn FogStorePort,
    ) -> Result<usize, VisionError> {
        let persisted = store.load_revealed_areas(scene_id).await?;
        self.apply_remote_reveal(scene_id, persisted);
        Ok(self
            .scenes
            .get(&scene_id)
            .map_or(0, |fog| fog.areas.len()))
    }
}

impl Default for FogEngine {
    fn default() -> Self {
        Self::new()
    }
}
