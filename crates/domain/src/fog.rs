//! Fog-of-war vocabulary: disclosure events and per-scene fog configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::geometry::Point2D;
use crate::ids::{AreaId, TokenId};

/// One fog-of-war disclosure event's footprint, stored as a polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedArea {
    pub id: AreaId,
    pub points: Vec<Point2D>,
    pub revealed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revealed_by: Option<TokenId>,
    pub is_permanent: bool,
}

/// How fog is lifted as tokens explore a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorationMode {
    /// Whole map always visible; the fog engine is a no-op.
    Full,
    /// Only the current vision polygon is shown; no history accumulates.
    Gradual,
    /// Every computed vision polygon is added to the revealed set forever.
    #[default]
    Permanent,
}

impl std::fmt::Display for ExplorationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorationMode::Full => write!(f, "full"),
            ExplorationMode::Gradual => write!(f, "gradual"),
            ExplorationMode::Permanent => write!(f, "permanent"),
        }
    }
}

impl std::str::FromStr for ExplorationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(ExplorationMode::Full),
            "gradual" => Ok(ExplorationMode::Gradual),
            "permanent" | "" => Ok(ExplorationMode::Permanent),
            _ => Err(DomainError::parse(format!(
                "Invalid exploration mode: {}",
                s
            ))),
        }
    }
}

/// Per-scene fog configuration and accumulated reveal history.
///
/// Created with the scene; the in-session authoritative copy lives in the
/// fog engine, the durable copy with the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FogOfWarData {
    pub enabled: bool,
    #[serde(default)]
    pub revealed_areas: Vec<RevealedArea>,
    #[serde(default)]
    pub exploration_mode: ExplorationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_on_load: Option<bool>,
}

impl FogOfWarData {
    /// Fresh fog state for a new scene.
    pub fn new(exploration_mode: ExplorationMode) -> Self {
        Self {
            enabled: true,
            revealed_areas: Vec::new(),
            exploration_mode,
            reset_on_load: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_exploration_mode_roundtrip() {
        for s in ["full", "gradual", "permanent"] {
            let mode = ExplorationMode::from_str(s).expect("parse");
            assert_eq!(mode.to_string(), s);
        }
        assert!(ExplorationMode::from_str("fogless").is_err());
    }

    #[test]
    fn test_revealed_area_wire_shape() {
        let area = RevealedArea {
            id: AreaId::new(),
            points: vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 0.0)],
            revealed_at: Utc::now(),
            revealed_by: Some(TokenId::new()),
            is_permanent: true,
        };
        let json = serde_json::to_value(&area).expect("serialize");
        assert!(json.get("isPermanent").is_some());
        assert!(json.get("revealedAt").is_some());
        assert!(json.get("revealedBy").is_some());
    }

    #[test]
    fn test_fog_data_defaults() {
        let fog = FogOfWarData::new(ExplorationMode::Permanent);
        assert!(fog.enabled);
        assert!(fog.revealed_areas.is_empty());
        assert_eq!(fog.reset_on_load, None);
    }
}
