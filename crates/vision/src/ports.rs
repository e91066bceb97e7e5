//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the vision engine. Ports exist for:
//! - Fog persistence (the durable copy of revealed areas lives elsewhere)
//! - Clock (last-writer-wins merges must be testable)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use veilcast_domain::{AreaId, RevealedArea, SceneId};

use crate::error::StoreError;

/// Time source for reveal timestamps.
#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Durable storage for revealed areas, owned by the persistence
/// collaborator. The fog engine reconciles against it after a transport
/// gap (reconnect/rejoin).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FogStorePort: Send + Sync {
    async fn load_revealed_areas(&self, scene_id: SceneId)
        -> Result<Vec<RevealedArea>, StoreError>;

    async fn save_revealed_area(
        &self,
        scene_id: SceneId,
        area: RevealedArea,
    ) -> Result<(), StoreError>;

    async fn delete_revealed_areas(
        &self,
        scene_id: SceneId,
        area_ids: Vec<AreaId>,
    ) -> Result<(), StoreError>;
}
