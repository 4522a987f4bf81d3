//! Results and diagnostics of a pipeline run.

use serde::Serialize;

use crate::domain::{Direction, RestAreaCandidate};
use crate::matcher::{HighwayMatchResult, MatchingQuality};

/// A candidate that survived every stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
    pub candidate: RestAreaCandidate,
    /// Route length up to the candidate's nearest vertex, in km.
    pub distance_from_route_start_km: f64,
    pub estimated_travel_time_min: f64,
    pub confidence: f64,
    pub reasons: Vec<String>,
    /// `distance_from_route_start_km` over the route length.
    pub route_position_ratio: f64,
    pub distance_from_route_m: f64,
    pub direction: Direction,
}

/// Surviving candidate counts after each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStages {
    pub initial: usize,
    pub after_highway_match: usize,
    pub after_distance_filter: usize,
    pub after_direction_filter: usize,
    pub after_interval_filter: usize,
    #[serde(rename = "final")]
    pub final_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighwaySummary {
    pub name: String,
    pub code: String,
    pub confidence: f64,
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDiagnostics {
    pub filter_stages: FilterStages,
    pub detected_highways: Vec<HighwaySummary>,
    pub matching_quality: MatchingQuality,
    pub primary_highway: Option<String>,
    pub route_coverage: f64,
    /// Highway matching was skipped because nothing was detected.
    pub degraded: bool,
}

impl FilterDiagnostics {
    pub(crate) fn new(stages: FilterStages, matched: &HighwayMatchResult, degraded: bool) -> Self {
        Self {
            filter_stages: stages,
            detected_highways: matched
                .detected_highways
                .iter()
                .map(|h| HighwaySummary {
                    name: h.highway_name.clone(),
                    code: h.highway_code.clone(),
                    confidence: h.confidence,
                    coverage: h.coverage_percentage,
                })
                .collect(),
            matching_quality: if degraded {
                MatchingQuality::Low
            } else {
                matched.matching_quality
            },
            primary_highway: matched
                .primary_highway
                .as_ref()
                .map(|h| h.highway_name.clone()),
            route_coverage: matched.route_coverage,
            degraded,
        }
    }
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    pub results: Vec<FilterResult>,
    pub diagnostics: FilterDiagnostics,
}

impl FilterOutcome {
    /// Keep only results between `start_km` and `end_km` from the route start.
    ///
    /// Diagnostics still describe the full run.
    pub fn within_section(mut self, start_km: f64, end_km: f64) -> Self {
        let (lo, hi) = if start_km <= end_km {
            (start_km, end_km)
        } else {
            (end_km, start_km)
        };
        self.results
            .retain(|r| (lo..=hi).contains(&r.distance_from_route_start_km));
        self
    }
}
