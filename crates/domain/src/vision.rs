//! Vision vocabulary: observers, obstacles, and the polygons the kernel
//! produces.
//!
//! These types are read-only snapshots from the perspective of the vision
//! engine; the persistence layer owns the durable copies.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::geometry::{Point2D, Segment};
use crate::ids::{TokenId, WallId};

/// State of a door embedded in a wall.
///
/// `Closed` and `Locked` block light identically to a solid wall; `Open`
/// does not block at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
    Locked,
}

impl DoorState {
    /// Whether a light-blocking wall in this door state actually occludes.
    pub fn occludes(&self) -> bool {
        !matches!(self, DoorState::Open)
    }
}

impl std::fmt::Display for DoorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoorState::Open => write!(f, "open"),
            DoorState::Closed => write!(f, "closed"),
            DoorState::Locked => write!(f, "locked"),
        }
    }
}

impl std::str::FromStr for DoorState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(DoorState::Open),
            "closed" => Ok(DoorState::Closed),
            "locked" => Ok(DoorState::Locked),
            _ => Err(DomainError::parse(format!("Invalid door state: {}", s))),
        }
    }
}

/// How a token perceives the scene. Drives the fill color/opacity the
/// renderer uses for that token's vision polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionMode {
    #[default]
    Normal,
    Darkvision,
    Blindsight,
    Tremorsense,
    Truesight,
}

impl VisionMode {
    /// Display fill color for this mode's vision polygon.
    ///
    /// The renderer has no other source of truth for this mapping.
    pub fn color(&self) -> &'static str {
        match self {
            VisionMode::Normal => "#ffff99",
            VisionMode::Darkvision => "#9999ff",
            VisionMode::Blindsight => "#99ff99",
            VisionMode::Tremorsense => "#ff9966",
            VisionMode::Truesight => "#ffffff",
        }
    }

    /// Display fill opacity for this mode's vision polygon.
    pub fn opacity(&self) -> f64 {
        match self {
            VisionMode::Normal => 0.25,
            VisionMode::Darkvision => 0.2,
            VisionMode::Blindsight => 0.15,
            VisionMode::Tremorsense => 0.15,
            VisionMode::Truesight => 0.3,
        }
    }
}

impl std::fmt::Display for VisionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisionMode::Normal => write!(f, "normal"),
            VisionMode::Darkvision => write!(f, "darkvision"),
            VisionMode::Blindsight => write!(f, "blindsight"),
            VisionMode::Tremorsense => write!(f, "tremorsense"),
            VisionMode::Truesight => write!(f, "truesight"),
        }
    }
}

impl std::str::FromStr for VisionMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" | "" => Ok(VisionMode::Normal),
            "darkvision" => Ok(VisionMode::Darkvision),
            "blindsight" => Ok(VisionMode::Blindsight),
            "tremorsense" => Ok(VisionMode::Tremorsense),
            "truesight" => Ok(VisionMode::Truesight),
            _ => Err(DomainError::parse(format!("Invalid vision mode: {}", s))),
        }
    }
}

/// A token's vision configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionConfig {
    pub enabled: bool,
    /// Vision range in pixels.
    pub range: f64,
    /// Cone width in degrees; >= 360 means omnidirectional.
    pub angle: f64,
    #[serde(default)]
    pub vision_mode: VisionMode,
}

impl VisionConfig {
    /// Omnidirectional vision (no cone restriction).
    pub fn omnidirectional(range: f64) -> Self {
        Self {
            enabled: true,
            range,
            angle: 360.0,
            vision_mode: VisionMode::Normal,
        }
    }

    pub fn is_omnidirectional(&self) -> bool {
        self.angle >= 360.0
    }
}

/// An observer token on the battle map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: TokenId,
    pub position: Point2D,
    /// Facing, in degrees; the vision cone is centered on this.
    pub rotation: f64,
    pub vision: VisionConfig,
}

/// One or more connected opaque line segments ("wall").
///
/// Only segments where `blocks_light` is true and the door (if any) is not
/// open participate in visibility ray casting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionBlocker {
    pub id: WallId,
    pub points: Vec<Point2D>,
    pub blocks_light: bool,
    pub blocks_movement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks_sound: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_state: Option<DoorState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrain_type: Option<String>,
}

impl VisionBlocker {
    /// Whether this wall currently occludes light.
    pub fn occludes_light(&self) -> bool {
        self.blocks_light && self.door_state.map_or(true, |d| d.occludes())
    }

    /// The segments of this wall that participate in ray casting.
    ///
    /// A wall with fewer than 2 points contributes no segments.
    pub fn light_segments(&self) -> Vec<Segment> {
        if !self.occludes_light() || self.points.len() < 2 {
            return Vec::new();
        }
        self.points
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
            .collect()
    }
}

/// Output of the geometry kernel: an ordered closed loop approximating the
/// visible region. Empty when vision is disabled or the range is zero.
///
/// A merged multi-observer polygon may hold several loops back to back; the
/// renderer fills the path with the even-odd rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionPolygon {
    pub points: Vec<Point2D>,
    #[serde(default)]
    pub vision_mode: VisionMode,
}

impl VisionPolygon {
    pub fn empty(mode: VisionMode) -> Self {
        Self {
            points: Vec::new(),
            vision_mode: mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
