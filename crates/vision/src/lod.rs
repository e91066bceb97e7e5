//! Level-of-detail policy.
//!
//! Deterministic mapping from camera-to-object distance to a detail tier,
//! bounding rendering cost as token count grows. `should_render` doubles as
//! the cheap pre-filter that bounds how much synchronous vision work is
//! attempted per frame for far-away tokens.

use std::collections::HashMap;

use veilcast_domain::{DomainError, LodConfig, LodLevel, LodSettings, Point2D};

/// Stateful LOD policy holding the current threshold configuration.
#[derive(Debug, Clone, Default)]
pub struct LodPolicy {
    config: LodConfig,
}

impl LodPolicy {
    pub fn new(config: LodConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> LodConfig {
        self.config
    }

    /// Replace the thresholds; rejected (and unchanged) if not strictly
    /// ascending.
    pub fn update_config(&mut self, config: LodConfig) -> Result<(), DomainError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Detail tier for a camera distance. Monotonic: increasing distance
    /// never increases detail.
    pub fn calculate_level(&self, distance: f64) -> LodLevel {
        self.config.level_for_distance(distance)
    }

    /// The fixed rendering-hint bundle for a tier.
    pub fn settings_for_level(&self, level: LodLevel) -> LodSettings {
        LodSettings::for_level(level)
    }

    /// Cheap pre-filter: anything at or past the hidden threshold is not
    /// worth a vision calculation, let alone a draw call.
    pub fn should_render(&self, object: Point2D, camera: Point2D) -> bool {
        object.distance_to(camera) < self.config.hidden_threshold
    }

    /// Per-frame batch variant: tier per input index.
    pub fn batch_calculate(
        &self,
        objects: &[Point2D],
        camera: Point2D,
    ) -> HashMap<usize, LodLevel> {
        objects
            .iter()
            .enumerate()
            .map(|(index, object)| (index, self.calculate_level(object.distance_to(camera))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_boundaries() {
        let policy = LodPolicy::default();
        assert_eq!(policy.calculate_level(19.0), LodLevel::High);
        assert_eq!(policy.calculate_level(20.0), LodLevel::Medium);
        assert_eq!(policy.calculate_level(199.0), LodLevel::Low);
        assert_eq!(policy.calculate_level(200.0), LodLevel::Hidden);
    }

    #[test]
    fn test_update_config_rejects_bad_thresholds_and_keeps_old() {
        let mut policy = LodPolicy::default();
        let bad = LodConfig {
            high_threshold: 90.0,
            medium_threshold: 50.0,
            low_threshold: 100.0,
            hidden_threshold: 200.0,
        };
        assert!(policy.update_config(bad).is_err());
        assert_eq!(policy.config(), LodConfig::default());
    }

    #[test]
    fn test_update_config_applies_new_thresholds() {
        let mut policy = LodPolicy::default();
        let custom = LodConfig {
            high_threshold: 10.0,
            medium_threshold: 20.0,
            low_threshold: 30.0,
            hidden_threshold: 40.0,
        };
        policy.update_config(custom).expect("valid config");
        assert_eq!(policy.calculate_level(35.0), LodLevel::Low);
        assert_eq!(policy.calculate_level(40.0), LodLevel::Hidden);
    }

    #[test]
    fn test_should_render_uses_hidden_threshold() {
        let policy = LodPolicy::default();
        let camera = Point2D::new(0.0, 0.0);
        assert!(policy.should_render(Point2D::new(199.0, 0.0), camera));
        assert!(!policy.should_render(Point2D::new(200.0, 0.0), camera));
    }

    #[test]
    fn test_batch_matches_single_calculation() {
        let policy = LodPolicy::default();
        let camera = Point2D::new(0.0, 0.0);
        let objects = vec![
            Point2D::new(5.0, 0.0),
            Point2D::new(30.0, 0.0),
            Point2D::new(150.0, 0.0),
            Point2D::new(500.0, 0.0),
        ];
        let batch = policy.batch_calculate(&objects, camera);
        assert_eq!(batch.len(), objects.len());
        for (index, object) in objects.iter().enumerate() {
            let single = policy.calculate_level(object.distance_to(camera));
            assert_eq!(batch[&index], single);
        }
    }
}
