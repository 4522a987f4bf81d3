//! Filter configuration and validation.

use serde::Deserialize;
use thiserror::Error;

use crate::direction::DirectionConfig;
use crate::matcher::MatcherConfig;

/// An option value outside its documented range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Candidate inclusion radius around the route, in metres.
    pub max_distance_from_route_m: f64,

    /// Interchange-to-route association radius, in metres.
    pub max_distance_from_ic_m: f64,

    /// Minimum share of the route (0–1) a highway must span.
    pub min_highway_coverage: f64,

    /// Minimum confidence for a detected highway to be kept.
    pub highway_confidence_threshold: f64,

    /// Run the direction stage.
    pub enable_direction_filter: bool,

    pub strict_mode: bool,

    /// Direction confidence required in strict mode.
    pub confidence_threshold: f64,

    pub include_unknown: bool,
    pub include_both: bool,

    /// Neutral direction confidence before any signal.
    pub direction_baseline: f64,

    /// Minimum spacing between results, in km.
    pub min_interval_km: f64,

    pub max_results: usize,

    /// Speed used for travel-time estimates.
    pub assumed_speed_kmh: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_distance_from_route_m: 1000.0,
            max_distance_from_ic_m: 2000.0,
            min_highway_coverage: 0.2,
            highway_confidence_threshold: 0.5,
            enable_direction_filter: true,
            strict_mode: false,
            confidence_threshold: 0.8,
            include_unknown: true,
            include_both: true,
            direction_baseline: 0.5,
            min_interval_km: 8.0,
            max_results: 20,
            assumed_speed_kmh: 80.0,
        }
    }
}

impl FilterConfig {
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_direction_filter(mut self, enabled: bool) -> Self {
        self.enable_direction_filter = enabled;
        self
    }

    pub fn with_min_interval_km(mut self, km: f64) -> Self {
        self.min_interval_km = km;
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Reject out-of-range values before they reach the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_distance_from_route_m", self.max_distance_from_route_m)?;
        positive("max_distance_from_ic_m", self.max_distance_from_ic_m)?;
        unit("min_highway_coverage", self.min_highway_coverage)?;
        unit("highway_confidence_threshold", self.highway_confidence_threshold)?;
        unit("confidence_threshold", self.confidence_threshold)?;
        unit("direction_baseline", self.direction_baseline)?;
        if !(self.min_interval_km.is_finite() && self.min_interval_km >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "min_interval_km",
                expected: "a non-negative number",
                value: self.min_interval_km,
            });
        }
        if self.max_results == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_results",
                expected: "at least 1",
                value: 0.0,
            });
        }
        positive("assumed_speed_kmh", self.assumed_speed_kmh)
    }

    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            max_distance_from_ic_m: self.max_distance_from_ic_m,
            min_highway_coverage: self.min_highway_coverage,
            confidence_threshold: self.highway_confidence_threshold,
            ..MatcherConfig::default()
        }
    }

    pub fn direction_config(&self) -> DirectionConfig {
        DirectionConfig {
            strict_mode: self.strict_mode,
            confidence_threshold: self.confidence_threshold,
            include_unknown: self.include_unknown,
            include_both: self.include_both,
            baseline: self.direction_baseline,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected: "a positive number",
            value,
        })
    }
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected: "between 0 and 1",
            value,
        })
    }
}

/// Per-request overrides; absent fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterOverrides {
    pub max_distance_from_route: Option<f64>,
    #[serde(rename = "maxDistanceFromIC")]
    pub max_distance_from_ic: Option<f64>,
    pub min_highway_coverage: Option<f64>,
    pub highway_confidence_threshold: Option<f64>,
    pub enable_direction_filter: Option<bool>,
    pub strict_mode: Option<bool>,
    pub confidence_threshold: Option<f64>,
    pub include_unknown: Option<bool>,
    pub include_both: Option<bool>,
    pub direction_baseline: Option<f64>,
    pub min_interval: Option<f64>,
    pub max_results: Option<usize>,
    pub assumed_speed_kmh: Option<f64>,
}

impl FilterOverrides {
    /// Apply to `base` and validate the result.
    pub fn apply(&self, base: &FilterConfig) -> Result<FilterConfig, ConfigError> {
        let config = FilterConfig {
            max_distance_from_route_m: self
                .max_distance_from_route
                .unwrap_or(base.max_distance_from_route_m),
            max_distance_from_ic_m: self.max_distance_from_ic.unwrap_or(base.max_distance_from_ic_m),
            min_highway_coverage: self.min_highway_coverage.unwrap_or(base.min_highway_coverage),
            highway_confidence_threshold: self
                .highway_confidence_threshold
                .unwrap_or(base.highway_confidence_threshold),
            enable_direction_filter: self
                .enable_direction_filter
                .unwrap_or(base.enable_direction_filter),
            strict_mode: self.strict_mode.unwrap_or(base.strict_mode),
            confidence_threshold: self.confidence_threshold.unwrap_or(base.confidence_threshold),
            include_unknown: self.include_unknown.unwrap_or(base.include_unknown),
            include_both: self.include_both.unwrap_or(base.include_both),
            direction_baseline: self.direction_baseline.unwrap_or(base.direction_baseline),
            min_interval_km: self.min_interval.unwrap_or(base.min_interval_km),
            max_results: self.max_results.unwrap_or(base.max_results),
            assumed_speed_kmh: self.assumed_speed_kmh.unwrap_or(base.assumed_speed_kmh),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = FilterConfig::default();

        assert_eq!(config.max_distance_from_route_m, 1000.0);
        assert_eq!(config.max_distance_from_ic_m, 2000.0);
        assert_eq!(config.min_interval_km, 8.0);
        assert_eq!(config.max_results, 20);
        assert!(config.enable_direction_filter);
        assert!(!config.strict_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = FilterConfig {
            min_highway_coverage: 1.5,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().starts_with("min_highway_coverage"));

        assert!(FilterConfig::default().with_max_results(0).validate().is_err());
        assert!(FilterConfig::default().with_min_interval_km(-1.0).validate().is_err());
        assert!(
            FilterConfig {
                assumed_speed_kmh: f64::NAN,
                ..Default::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            FilterConfig {
                confidence_threshold: f64::NAN,
                ..Default::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn overrides_from_json() {
        let overrides: FilterOverrides =
            serde_json::from_str(r#"{"strictMode": true, "minInterval": 15, "maxDistanceFromIC": 1500}"#)
                .unwrap();
        let config = overrides.apply(&FilterConfig::default()).unwrap();

        assert!(config.strict_mode);
        assert_eq!(config.min_interval_km, 15.0);
        assert_eq!(config.max_distance_from_ic_m, 1500.0);
        assert_eq!(config.max_results, 20);
    }

    #[test]
    fn invalid_override_names_the_field() {
        let overrides = FilterOverrides {
            confidence_threshold: Some(2.0),
            ..Default::default()
        };
        let ConfigError::OutOfRange { field, .. } =
            overrides.apply(&FilterConfig::default()).unwrap_err();
        assert_eq!(field, "confidence_threshold");
    }

    #[test]
    fn unknown_override_is_rejected() {
        assert!(serde_json::from_str::<FilterOverrides>(r#"{"maxResult": 3}"#).is_err());
    }

    #[test]
    fn derived_configs() {
        let config = FilterConfig::default().with_strict_mode(true);
        assert!(config.direction_config().strict_mode);
        assert_eq!(config.direction_config().baseline, 0.5);
        assert_eq!(config.matcher_config().confidence_threshold, 0.5);
        assert_eq!(config.matcher_config().segment_gap, MatcherConfig::default().segment_gap);
    }
}
