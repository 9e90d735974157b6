//! Tuning parameters for the fusion pipeline

use crate::error::{FusionError, Result};
use crate::ttc::RangeStatistic;
use roitrack::AssociationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Fraction of each box's width/height removed before point containment (0-1)
    pub shrink_factor: f64,

    /// Matches are kept only when their distance is below this multiple of the box mean
    pub distance_ratio: f64,

    /// Minimum current-frame pixel distance for a keypoint pair to vote on scale
    pub min_pair_distance: f64,

    /// Sensor frame rate in Hz
    pub frame_rate: f64,

    /// Half-width of the ego-lane corridor in metres
    pub lane_half_width: f64,

    /// Reduction applied to in-lane forward ranges
    pub range_statistic: RangeStatistic,

    pub association: AssociationConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            shrink_factor: 0.10,
            distance_ratio: 0.7,
            min_pair_distance: 100.0,
            frame_rate: 10.0,
            lane_half_width: 2.0,
            range_statistic: RangeStatistic::Mean,
            association: AssociationConfig::default(),
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.shrink_factor) {
            return Err(FusionError::config(format!(
                "shrink_factor must be within [0, 1], got {}",
                self.shrink_factor
            )));
        }
        if !(self.distance_ratio.is_finite() && self.distance_ratio > 0.0) {
            return Err(FusionError::config(format!(
                "distance_ratio must be positive, got {}",
                self.distance_ratio
            )));
        }
        if !(self.min_pair_distance.is_finite() && self.min_pair_distance >= 0.0) {
            return Err(FusionError::config(format!(
                "min_pair_distance must be non-negative, got {}",
                self.min_pair_distance
            )));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(FusionError::config(format!(
                "frame_rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !(self.lane_half_width.is_finite() && self.lane_half_width > 0.0) {
            return Err(FusionError::config(format!(
                "lane_half_width must be positive, got {}",
                self.lane_half_width
            )));
        }
        Ok(())
    }

    /// Parse and validate; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded fusion config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Seconds between two consecutive frames
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.frame_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roitrack::AssociationStrategy;

    #[test]
    fn test_defaults_are_valid() {
        let config = FusionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.distance_ratio, 0.7);
        assert_eq!(config.min_pair_distance, 100.0);
        assert_eq!(config.lane_half_width, 2.0);
        assert_eq!(config.range_statistic, RangeStatistic::Mean);
        assert_eq!(
            config.association.strategy,
            AssociationStrategy::GreedyMaxTally
        );
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "frame_rate": 20.0,
            "range_statistic": "minimum",
            "association": {"strategy": "bipartite"}
        }"#;
        let config = FusionConfig::from_json_str(json).unwrap();
        assert_eq!(config.frame_rate, 20.0);
        assert_eq!(config.frame_interval(), 0.05);
        assert_eq!(config.range_statistic, RangeStatistic::Minimum);
        assert_eq!(config.association.strategy, AssociationStrategy::Bipartite);
        assert_eq!(config.shrink_factor, 0.10);
    }

    #[test]
    fn test_rejects_bad_values() {
        for json in [
            r#"{"shrink_factor": 1.5}"#,
            r#"{"frame_rate": 0.0}"#,
            r#"{"lane_half_width": -2.0}"#,
            r#"{"distance_ratio": 0.0}"#,
        ] {
            assert!(matches!(
                FusionConfig::from_json_str(json),
                Err(FusionError::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            FusionConfig::from_json_str("{not json"),
            Err(FusionError::Serialization(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FusionConfig::from_json_file("/nonexistent/fusion.json"),
            Err(FusionError::Io(_))
        ));
    }
}
