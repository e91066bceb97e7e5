//! Level-of-detail vocabulary.
//!
//! The LOD table is gameplay-visible behavior ("can I see health bars at
//! this range"), so the settings per level are a fixed contract, not a
//! tuning knob.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Discrete detail tier, totally ordered by increasing distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LodLevel {
    High,
    Medium,
    Low,
    Hidden,
}

impl std::fmt::Display for LodLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LodLevel::High => write!(f, "high"),
            LodLevel::Medium => write!(f, "medium"),
            LodLevel::Low => write!(f, "low"),
            LodLevel::Hidden => write!(f, "hidden"),
        }
    }
}

/// Rendering hints associated 1:1 with a [`LodLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodSettings {
    pub show_labels: bool,
    pub show_health_bars: bool,
    pub show_status_icons: bool,
    pub show_particles: bool,
    pub show_shadows: bool,
    pub texture_resolution: f64,
    pub geometry_detail: f64,
}

impl LodSettings {
    /// The fixed lookup table mapping each level to its rendering hints.
    pub fn for_level(level: LodLevel) -> Self {
        match level {
            LodLevel::High => Self {
                show_labels: true,
                show_health_bars: true,
                show_status_icons: true,
                show_particles: true,
                show_shadows: true,
                texture_resolution: 1.0,
                geometry_detail: 1.0,
            },
            LodLevel::Medium => Self {
                show_labels: true,
                show_health_bars: true,
                show_status_icons: true,
                show_particles: false,
                show_shadows: true,
                texture_resolution: 0.5,
                geometry_detail: 0.75,
            },
            LodLevel::Low => Self {
                show_labels: false,
                show_health_bars: false,
                show_status_icons: false,
                show_particles: false,
                show_shadows: false,
                texture_resolution: 0.25,
                geometry_detail: 0.5,
            },
            LodLevel::Hidden => Self {
                show_labels: false,
                show_health_bars: false,
                show_status_icons: false,
                show_particles: false,
                show_shadows: false,
                texture_resolution: 0.0,
                geometry_detail: 0.0,
            },
        }
    }
}

/// Four ascending distance thresholds (world units) bounding the tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodConfig {
    pub high_threshold: f64,
    pub medium_threshold: f64,
    pub low_threshold: f64,
    pub hidden_threshold: f64,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            high_threshold: 20.0,
            medium_threshold: 50.0,
            low_threshold: 100.0,
            hidden_threshold: 200.0,
        }
    }
}

impl LodConfig {
    /// Thresholds must be finite and strictly ascending.
    pub fn validate(&self) -> Result<(), DomainError> {
        let t = [
            self.high_threshold,
            self.medium_threshold,
            self.low_threshold,
            self.hidden_threshold,
        ];
        if t.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(DomainError::validation(
                "LOD thresholds must be finite and non-negative",
            ));
        }
        if !(self.high_threshold < self.medium_threshold
            && self.medium_threshold < self.low_threshold
            && self.low_threshold < self.hidden_threshold)
        {
            return Err(DomainError::validation(
                "LOD thresholds must be strictly ascending",
            ));
        }
        Ok(())
    }

    /// Strictly threshold-based tier selection, monotonic in distance.
    ///
    /// Distances past `medium_threshold` render at `Low` all the way to the
    /// hidden cutoff; anything at or beyond `hidden_threshold` is `Hidden`.
    pub fn level_for_distance(&self, distance: f64) -> LodLevel {
        if distance >= self.hidden_threshold {
            LodLevel::Hidden
        } else if distance >= self.medium_threshold {
            LodLevel::Low
        } else if distance >= self.high_threshold {
            LodLevel::Medium
        } else {
            LodLevel::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert!(LodLevel::High < LodLevel::Medium);
        assert!(LodLevel::Medium < LodLevel::Low);
        assert!(LodLevel::Low < LodLevel::Hidden);
    }

    #[test]
    fn test_default_threshold_boundaries() {
        let cfg = LodConfig::default();
        assert_eq!(cfg.level_for_distance(19.0), LodLevel::High);
        assert_eq!(cfg.level_for_distance(20.0), LodLevel::Medium);
        assert_eq!(cfg.level_for_distance(199.0), LodLevel::Low);
        assert_eq!(cfg.level_for_distance(200.0), LodLevel::Hidden);
    }

    #[test]
    fn test_level_monotonic_in_distance() {
        let cfg = LodConfig::default();
        let mut previous = LodLevel::High;
        for step in 0..2_500 {
            let level = cfg.level_for_distance(step as f64 * 0.1);
            assert!(level >= previous, "detail increased with distance");
            previous = level;
        }
        assert_eq!(previous, LodLevel::Hidden);
    }

    #[test]
    fn test_settings_table() {
        let high = LodSettings::for_level(LodLevel::High);
        assert!(high.show_particles && high.show_shadows);
        assert_eq!(high.texture_resolution, 1.0);

        let medium = LodSettings::for_level(LodLevel::Medium);
        assert!(!medium.show_particles);
        assert!(medium.show_labels && medium.show_health_bars);
        assert_eq!(medium.texture_resolution, 0.5);
        assert_eq!(medium.geometry_detail, 0.75);

        let low = LodSettings::for_level(LodLevel::Low);
        assert!(!low.show_labels && !low.show_health_bars && !low.show_status_icons);
        assert!(!low.show_particles && !low.show_shadows);
        assert_eq!(low.texture_resolution, 0.25);
        assert_eq!(low.geometry_detail, 0.5);

        let hidden = LodSettings::for_level(LodLevel::Hidden);
        assert_eq!(hidden.texture_resolution, 0.0);
        assert_eq!(hidden.geometry_detail, 0.0);
    }

    #[test]
    fn test_validate_rejects_unordered_thresholds() {
        let cfg = LodConfig {
            high_threshold: 50.0,
            medium_threshold: 20.0,
            ..LodConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = LodConfig {
            hidden_threshold: f64::NAN,
            ..LodConfig::default()
        };
        assert!(cfg.validate().is_err());

        assert!(LodConfig::default().validate().is_ok());
    }
}
