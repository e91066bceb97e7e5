//! Veilcast vision subsystem: line-of-sight geometry, level-of-detail
//! policy, worker offload, and the fog-of-war state engine.
//!
//! The geometry kernel is pure and deterministic; everything stateful
//! (offload manager, fog engine) wraps it with explicit concurrency
//! boundaries.

pub mod error;
pub mod fog;
pub mod geometry;
pub mod lod;
pub mod offload;
pub mod ports;

pub use error::{StoreError, VisionError};
pub use fog::FogEngine;
pub use geometry::{calculate_vision_polygon, merge_vision_polygons};
pub use lod::LodPolicy;
pub use offload::{OffloadConfig, OffloadStats, VisionOffload};
pub use ports::{ClockPort, FogStorePort, SystemClock};
