//! Geometry kernel: pure, deterministic visibility computation.
//!
//! Everything in this module is a pure function over borrowed snapshots;
//! scene state is never mutated and no randomness is involved. The offload
//! worker wraps these functions; callers without worker support may invoke
//! them directly as the synchronous fallback path.

mod merge;
mod raycast;

pub use merge::merge_vision_polygons;
pub use raycast::calculate_vision_polygon;
