//! Veilcast domain layer.
//!
//! Value types, typed ids, and invariants for the vision / fog-of-war
//! subsystem. This crate is pure vocabulary: no I/O, no async, no engine
//! logic. The vision engine and sync transport build on it.

mod error;
mod fog;
mod geometry;
mod ids;
mod lod;
mod vision;

pub use error::DomainError;
pub use fog::{ExplorationMode, FogOfWarData, RevealedArea};
pub use geometry::{Point2D, Segment};
pub use ids::{AreaId, SceneId, TokenId, UserId, WallId};
pub use lod::{LodConfig, LodLevel, LodSettings};
pub use vision::{DoorState, Token, VisionBlocker, VisionConfig, VisionMode, VisionPolygon};
