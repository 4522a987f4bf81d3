//! Highway detection from interchange geometry.
//!
//! Road names reported by routing providers are unreliable, so the highways
//! a route follows are inferred from which interchanges lie along it, how
//! close they are and how much of the route they span.

mod allowed;
mod score;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::domain::Coordinate;
use crate::geometry::haversine_distance;
use crate::interchanges::{CatalogSnapshot, NearbyInterchange};

pub use allowed::AllowedHighways;
pub use score::{HighwayEvidence, MatchingQuality, highway_confidence, matching_quality};

/// Configuration for highway detection.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Maximum interchange-to-route distance in metres.
    pub max_distance_from_ic_m: f64,

    /// Minimum share of the route (0–1) a highway must span to be kept.
    pub min_highway_coverage: f64,

    /// Minimum confidence for a highway to be kept.
    pub confidence_threshold: f64,

    /// A jump of more than this many route vertices between consecutive
    /// interchanges starts a new run.
    pub segment_gap: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_distance_from_ic_m: 2000.0,
            min_highway_coverage: 0.2,
            confidence_threshold: 0.5,
            segment_gap: 50,
        }
    }
}

/// A contiguous run of matched interchanges.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighwaySegment {
    pub start_ic: String,
    pub end_ic: String,
    pub length_km: f64,
}

/// A highway the route is believed to follow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedHighway {
    pub highway_name: String,
    pub highway_code: String,
    pub confidence: f64,
    pub coverage_percentage: f64,
    pub matched_ic_count: usize,
    pub average_distance_m: f64,
    pub segments: Vec<HighwaySegment>,
    #[serde(skip)]
    pub first_route_index: usize,
    #[serde(skip)]
    pub last_route_index: usize,
}

/// Result of highway detection.
#[derive(Debug, Clone, PartialEq)]
pub struct HighwayMatchResult {
    /// Kept highways, best first (by confidence × coverage).
    pub detected_highways: Vec<DetectedHighway>,
    pub primary_highway: Option<DetectedHighway>,
    /// Percentage of route vertices covered by any kept highway.
    pub route_coverage: f64,
    pub matching_quality: MatchingQuality,
    /// Every interchange found near the route, in route order.
    pub nearby: Vec<NearbyInterchange>,
}

impl HighwayMatchResult {
    pub fn empty() -> Self {
        Self {
            detected_highways: Vec::new(),
            primary_highway: None,
            route_coverage: 0.0,
            matching_quality: MatchingQuality::Low,
            nearby: Vec::new(),
        }
    }

    /// Look up a kept highway by code.
    pub fn highway(&self, code: &str) -> Option<&DetectedHighway> {
        self.detected_highways.iter().find(|h| h.highway_code == code)
    }
}

/// Detects highways along a route using an interchange snapshot.
#[derive(Debug, Clone, Default)]
pub struct HighwayRouteMatcher {
    config: MatcherConfig,
}

impl HighwayRouteMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Detect the highways `route` follows.
    ///
    /// Never fails: an empty route or snapshot yields an empty result with
    /// quality [`MatchingQuality::Low`].
    pub fn match_route(&self, snapshot: &CatalogSnapshot, route: &[Coordinate]) -> HighwayMatchResult {
        let total = route.len();
        let nearby = snapshot.find_nearby(route, self.config.max_distance_from_ic_m);
        if total == 0 || nearby.is_empty() {
            return HighwayMatchResult {
                nearby,
                ..HighwayMatchResult::empty()
            };
        }

        let mut groups: BTreeMap<(&str, &str), Vec<&NearbyInterchange>> = BTreeMap::new();
        for n in &nearby {
            let key = (
                n.interchange.highway_code.as_str(),
                n.interchange.highway_name.as_str(),
            );
            groups.entry(key).or_default().push(n);
        }

        let mut detected: Vec<DetectedHighway> = groups
            .into_iter()
            .filter_map(|((code, name), matches)| {
                let highway = self.evaluate(code, name, &matches, total);
                let kept = highway.confidence >= self.config.confidence_threshold
                    && highway.coverage_percentage >= self.config.min_highway_coverage * 100.0;
                debug!(
                    code,
                    name,
                    confidence = highway.confidence,
                    coverage = highway.coverage_percentage,
                    ics = highway.matched_ic_count,
                    kept,
                    "evaluated highway"
                );
                kept.then_some(highway)
            })
            .collect();

        detected.sort_by(|a, b| {
            let sa = a.confidence * a.coverage_percentage;
            let sb = b.confidence * b.coverage_percentage;
            sb.total_cmp(&sa)
                .then_with(|| a.highway_code.cmp(&b.highway_code))
        });

        let route_coverage = union_coverage(&detected, total);
        let primary_highway = detected.first().cloned();
        let matching_quality = primary_highway
            .as_ref()
            .map(|best| matching_quality(best.confidence, best.coverage_percentage, route_coverage))
            .unwrap_or(MatchingQuality::Low);

        HighwayMatchResult {
            detected_highways: detected,
            primary_highway,
            route_coverage,
            matching_quality,
            nearby,
        }
    }

    /// Score one highway from its nearby interchanges (already in route order).
    fn evaluate(
        &self,
        code: &str,
        name: &str,
        matches: &[&NearbyInterchange],
        total: usize,
    ) -> DetectedHighway {
        // Each physical interchange counts once, whichever carriageways matched
        let mut seen = HashSet::new();
        let ics: Vec<&NearbyInterchange> = matches
            .iter()
            .copied()
            .filter(|n| seen.insert(n.interchange.unit_code.as_str()))
            .collect();

        let runs = split_runs(&ics, self.config.segment_gap);
        let first = ics.first().map(|n| n.route_index).unwrap_or(0);
        let last = ics.last().map(|n| n.route_index).unwrap_or(0);
        let coverage_percentage = span_percentage(first, last, total);
        let average_distance_m = if ics.is_empty() {
            f64::INFINITY
        } else {
            ics.iter().map(|n| n.distance_m).sum::<f64>() / ics.len() as f64
        };

        let evidence = HighwayEvidence {
            ic_count: ics.len(),
            average_distance_m,
            coverage_percentage,
            run_count: runs.len(),
            longest_run: runs.iter().map(|r| r.len()).max().unwrap_or(0),
        };

        let segments = runs
            .iter()
            .filter(|run| run.len() >= 2)
            .filter_map(|run| {
                let (start, end) = (run.first()?, run.last()?);
                let length_km = run
                    .windows(2)
                    .map(|w| haversine_distance(w[0].interchange.coordinates, w[1].interchange.coordinates))
                    .sum();
                Some(HighwaySegment {
                    start_ic: start.interchange.name.clone(),
                    end_ic: end.interchange.name.clone(),
                    length_km,
                })
            })
            .collect();

        DetectedHighway {
            highway_name: name.to_string(),
            highway_code: code.to_string(),
            confidence: highway_confidence(&evidence),
            coverage_percentage,
            matched_ic_count: ics.len(),
            average_distance_m,
            segments,
            first_route_index: first,
            last_route_index: last,
        }
    }
}

/// Split route-ordered interchanges wherever the vertex gap exceeds `gap`.
fn split_runs<'a>(ics: &[&'a NearbyInterchange], gap: usize) -> Vec<Vec<&'a NearbyInterchange>> {
    let mut runs: Vec<Vec<&NearbyInterchange>> = Vec::new();
    for &ic in ics {
        match runs.last_mut() {
            Some(run)
                if run
                    .last()
                    .is_some_and(|prev| ic.route_index.saturating_sub(prev.route_index) <= gap) =>
            {
                run.push(ic)
            }
            _ => runs.push(vec![ic]),
        }
    }
    runs
}

fn span_percentage(first: usize, last: usize, total: usize) -> f64 {
    if total == 0 || last < first {
        return 0.0;
    }
    ((last - first + 1) as f64 / total as f64 * 100.0).min(100.0)
}

/// Percentage of route vertices inside any kept highway's span.
fn union_coverage(highways: &[DetectedHighway], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let mut spans: Vec<(usize, usize)> = highways
        .iter()
        .map(|h| (h.first_route_index, h.last_route_index))
        .collect();
    spans.sort_unstable();

    let mut covered = 0usize;
    let mut current: Option<(usize, usize)> = None;
    for (start, end) in spans {
        current = match current {
            Some((s, e)) if start <= e + 1 => Some((s, e.max(end))),
            Some((s, e)) => {
                covered += e - s + 1;
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((s, e)) = current {
        covered += e - s + 1;
    }
    (covered as f64 / total as f64 * 100.0).min(100.0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::interchanges::testing::raw;
    use proptest::prelude::*;

    fn point() -> impl Strategy<Value = Coordinate> {
        (35.0f64..37.5, 126.8f64..129.0).prop_map(|(lat, lng)| Coordinate::new(lat, lng))
    }

    proptest! {
        #[test]
        fn scores_stay_in_range(
            route in prop::collection::vec(point(), 1..40),
            ics in prop::collection::vec((point(), 0.0f64..400.0), 0..20),
        ) {
            let rows: Vec<_> = ics
                .iter()
                .enumerate()
                .map(|(i, (p, km))| raw(&i.to_string(), if i % 2 == 0 { "0010" } else { "0500" }, "노선", p.lat, p.lng, *km))
                .collect();
            let snapshot = CatalogSnapshot::from_raw(&rows);
            let result = HighwayRouteMatcher::default().match_route(&snapshot, &route);

            for h in &result.detected_highways {
                prop_assert!((0.0..=1.0).contains(&h.confidence));
                prop_assert!((0.0..=100.0).contains(&h.coverage_percentage));
            }
            prop_assert!((0.0..=100.0).contains(&result.route_coverage));
        }
    }
}
