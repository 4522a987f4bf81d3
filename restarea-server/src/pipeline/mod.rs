//! Candidate filter pipeline.
//!
//! Narrows a rest-area catalog to the candidates a driver on a route can
//! actually use. Stages run in a fixed order and only ever remove
//! candidates:
//!
//! 1. highway match (skipped when no highway is known)
//! 2. distance from the route
//! 3. direction (optional)
//! 4. minimum spacing
//! 5. truncation
//!
//! Every run is synchronous and works on an immutable catalog snapshot.

mod config;
mod diagnostics;
mod stages;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::direction::{DirectionResolver, RouteContext};
use crate::domain::{Coordinate, RestAreaCandidate, RouteError};
use crate::interchanges::CatalogSnapshot;
use crate::matcher::{AllowedHighways, HighwayRouteMatcher};
use crate::tables::DirectionTables;

pub use config::{ConfigError, FilterConfig, FilterOverrides};
pub use diagnostics::{FilterDiagnostics, FilterOutcome, FilterResult, FilterStages, HighwaySummary};

/// A validated, reusable pipeline.
#[derive(Debug, Clone)]
pub struct CandidateFilterPipeline {
    config: FilterConfig,
    matcher: HighwayRouteMatcher,
    resolver: DirectionResolver,
    tables: Arc<DirectionTables>,
}

impl CandidateFilterPipeline {
    pub fn new(config: FilterConfig, tables: Arc<DirectionTables>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            matcher: HighwayRouteMatcher::new(config.matcher_config()),
            resolver: DirectionResolver::new(Arc::clone(&tables), config.direction_config()),
            config,
            tables,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Run every stage for one route.
    ///
    /// `hints` are highway names (or numeric codes) reported by the routing
    /// provider. Only an empty route or an unusable route point is an
    /// error; missing catalog data degrades to distance-only filtering.
    pub fn run(
        &self,
        route: &[Coordinate],
        hints: &[String],
        candidates: &[RestAreaCandidate],
        snapshot: &CatalogSnapshot,
    ) -> Result<FilterOutcome, RouteError> {
        validate_route(route)?;

        let matched = self.matcher.match_route(snapshot, route);
        let ctx = RouteContext::new(route, snapshot, &matched);
        let mut counts = FilterStages {
            initial: candidates.len(),
            ..Default::default()
        };

        let degraded =
            matched.detected_highways.is_empty() && hints.iter().all(|h| h.trim().is_empty());
        let allowed = if degraded {
            if !candidates.is_empty() {
                warn!(
                    interchanges = snapshot.len(),
                    "no highway detected, skipping highway match"
                );
            }
            None
        } else {
            Some(AllowedHighways::new(&matched, hints, self.tables.aliases()))
        };

        let on_highway = stages::highway_match(candidates, allowed.as_ref());
        counts.after_highway_match = on_highway.len();

        let near = stages::distance(on_highway, &ctx, self.config.max_distance_from_route_m);
        counts.after_distance_filter = near.len();

        let accessible = if self.config.enable_direction_filter {
            stages::direction(near, &ctx, &self.resolver)
        } else {
            stages::highway_scores(
                near,
                &ctx,
                &self.tables,
                self.config.direction_baseline,
                self.config.include_both,
            )
        };
        counts.after_direction_filter = accessible.len();

        let mut spaced = stages::interval(accessible, self.config.min_interval_km);
        counts.after_interval_filter = spaced.len();

        spaced.truncate(self.config.max_results);
        counts.final_count = spaced.len();

        debug!(?counts, "filter stages");

        let length_km = ctx.length_km();
        let results: Vec<FilterResult> = spaced
            .into_iter()
            .map(|s| {
                let distance = s.distance_from_start_km;
                FilterResult {
                    candidate: s.candidate.clone(),
                    distance_from_route_start_km: distance,
                    estimated_travel_time_min: distance / self.config.assumed_speed_kmh * 60.0,
                    confidence: finite_unit(s.confidence),
                    reasons: s.reasons,
                    route_position_ratio: if length_km > 0.0 {
                        finite_unit(distance / length_km)
                    } else {
                        0.0
                    },
                    distance_from_route_m: s.distance_from_route_m,
                    direction: s.direction,
                }
            })
            .collect();

        info!(
            candidates = counts.initial,
            results = results.len(),
            highways = matched.detected_highways.len(),
            degraded,
            "filtered rest areas"
        );

        Ok(FilterOutcome {
            results,
            diagnostics: FilterDiagnostics::new(counts, &matched, degraded),
        })
    }
}

/// Reject routes that cannot be matched at all.
pub fn validate_route(route: &[Coordinate]) -> Result<(), RouteError> {
    if route.is_empty() {
        return Err(RouteError::Empty);
    }
    match route.iter().position(|p| !p.is_valid()) {
        Some(index) => Err(RouteError::InvalidPoint {
            index,
            lat: route[index].lat,
            lng: route[index].lng,
        }),
        None => Ok(()),
    }
}

fn finite_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use crate::interchanges::fixtures::gyeongbu_snapshot;
    use crate::matcher::MatchingQuality;

    const SEOUL_STATION: Coordinate = Coordinate::new(37.5547, 126.9706);
    const BUSAN: Coordinate = Coordinate::new(35.1796, 129.0756);

    fn tables() -> Arc<DirectionTables> {
        Arc::new(DirectionTables::korea().unwrap())
    }

    fn pipeline(config: FilterConfig) -> CandidateFilterPipeline {
        CandidateFilterPipeline::new(config, tables()).unwrap()
    }

    /// Straight line from `a` to `b` with `n` vertices.
    fn densify(a: Coordinate, b: Coordinate, n: usize) -> Vec<Coordinate> {
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                Coordinate::new(a.lat + (b.lat - a.lat) * t, a.lng + (b.lng - a.lng) * t)
            })
            .collect()
    }

    /// A point `t` of the way along the Seoul–Busan line, nudged to the
    /// right of southbound travel.
    fn beside(t: f64) -> Coordinate {
        Coordinate::new(
            SEOUL_STATION.lat + (BUSAN.lat - SEOUL_STATION.lat) * t - 0.0022,
            SEOUL_STATION.lng + (BUSAN.lng - SEOUL_STATION.lng) * t - 0.0027,
        )
    }

    #[test]
    fn empty_catalog_gives_empty_result() {
        let route = densify(SEOUL_STATION, BUSAN, 50);
        let outcome = pipeline(FilterConfig::default())
            .run(&route, &[], &[], &CatalogSnapshot::empty())
            .unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.diagnostics.filter_stages, FilterStages::default());
        assert_eq!(outcome.diagnostics.matching_quality, MatchingQuality::Low);
    }

    #[test]
    fn route_errors() {
        let p = pipeline(FilterConfig::default());
        let snapshot = CatalogSnapshot::empty();
        assert_eq!(p.run(&[], &[], &[], &snapshot).unwrap_err(), RouteError::Empty);

        let bad = [SEOUL_STATION, Coordinate::new(0.0, 0.0)];
        assert!(matches!(
            p.run(&bad, &[], &[], &snapshot).unwrap_err(),
            RouteError::InvalidPoint { index: 1, .. }
        ));
    }

    #[test]
    fn nearby_candidates_keep_the_more_confident() {
        let route = densify(SEOUL_STATION, BUSAN, 100);
        // About 3 km apart along the route
        let candidates = vec![
            RestAreaCandidate::new("plain", "X휴게소", beside(0.50)),
            RestAreaCandidate::new("ahead", "X(부산)", beside(0.51)),
        ];

        let outcome = pipeline(FilterConfig::default())
            .run(&route, &[], &candidates, &CatalogSnapshot::empty())
            .unwrap();

        let stages = outcome.diagnostics.filter_stages;
        assert_eq!(stages.after_direction_filter, 2);
        assert_eq!(stages.after_interval_filter, 1);
        assert_eq!(outcome.results[0].candidate.id, "ahead");
        assert!(outcome.diagnostics.degraded);
    }

    #[test]
    fn strict_mode_drops_opposing_destination() {
        let route = densify(SEOUL_STATION, BUSAN, 100);
        let candidates = vec![
            RestAreaCandidate::new("behind", "X(서울)", beside(0.3)),
            RestAreaCandidate::new("ahead", "X(부산)", beside(0.6)),
        ];

        let lenient = pipeline(FilterConfig::default())
            .run(&route, &[], &candidates, &CatalogSnapshot::empty())
            .unwrap();
        assert_eq!(lenient.results.len(), 2);
        assert!(lenient.results[0].confidence < lenient.results[1].confidence);

        let strict = pipeline(FilterConfig::default().with_strict_mode(true))
            .run(&route, &[], &candidates, &CatalogSnapshot::empty())
            .unwrap();
        let ids: Vec<&str> = strict.results.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["ahead"]);
    }

    #[test]
    fn far_and_invalid_candidates_fail_distance_stage() {
        let route = densify(SEOUL_STATION, BUSAN, 50);
        let candidates = vec![
            RestAreaCandidate::new("near", "X", beside(0.2)),
            RestAreaCandidate::new("far", "X", Coordinate::new(36.0, 126.5)),
            RestAreaCandidate::new("zero", "X", Coordinate::new(0.0, 0.0)),
            RestAreaCandidate::new("nan", "X", Coordinate::new(f64::NAN, 127.0)),
        ];

        let outcome = pipeline(FilterConfig::default())
            .run(&route, &[], &candidates, &CatalogSnapshot::empty())
            .unwrap();
        assert_eq!(outcome.diagnostics.filter_stages.after_highway_match, 4);
        assert_eq!(outcome.diagnostics.filter_stages.after_distance_filter, 1);
        assert_eq!(outcome.results[0].candidate.id, "near");
        assert!(outcome.results[0].distance_from_route_m < 1000.0);
    }

    #[test]
    fn highway_match_uses_detected_highways() {
        let snapshot = gyeongbu_snapshot();
        let route: Vec<Coordinate> = snapshot
            .carriageway("0010", crate::domain::Carriageway::Down)
            .iter()
            .map(|ic| ic.coordinates)
            .collect();
        let candidates = vec![
            RestAreaCandidate::new("gb", "A", route[1]).with_highway("0010", "경부고속도로"),
            RestAreaCandidate::new("other", "B", route[3]).with_highway("0500", "영동고속도로"),
            RestAreaCandidate::new("bare", "C", route[5]),
        ];

        let outcome = pipeline(FilterConfig::default().with_direction_filter(false))
            .run(&route, &[], &candidates, &snapshot)
            .unwrap();

        assert!(!outcome.diagnostics.degraded);
        assert_eq!(outcome.diagnostics.primary_highway.as_deref(), Some("경부선"));
        assert_eq!(outcome.diagnostics.filter_stages.after_highway_match, 2);
        let gb = &outcome.results[0];
        assert_eq!(gb.candidate.id, "gb");
        let detected = &outcome.diagnostics.detected_highways[0];
        assert_eq!(gb.confidence, detected.confidence);
    }

    #[test]
    fn hints_alone_enable_highway_match() {
        let route = densify(SEOUL_STATION, BUSAN, 50);
        let candidates = vec![
            RestAreaCandidate::new("gb", "A", beside(0.2)).with_highway("0010", "경부선"),
            RestAreaCandidate::new("yd", "B", beside(0.6)).with_highway("0500", "영동선"),
        ];

        let outcome = pipeline(FilterConfig::default())
            .run(&route, &["경부고속도로".to_string()], &candidates, &CatalogSnapshot::empty())
            .unwrap();
        assert!(!outcome.diagnostics.degraded);
        assert_eq!(outcome.diagnostics.filter_stages.after_highway_match, 1);
    }

    #[test]
    fn direction_filter_uses_interchange_order() {
        let snapshot = gyeongbu_snapshot();
        let route: Vec<Coordinate> = snapshot
            .carriageway("0010", crate::domain::Carriageway::Down)
            .iter()
            .map(|ic| ic.coordinates)
            .collect();
        let candidates = vec![
            RestAreaCandidate::new("down", "A", route[2])
                .with_highway("0010", "경부선")
                .with_direction_label("하행"),
            RestAreaCandidate::new("up", "B", route[4])
                .with_highway("0010", "경부선")
                .with_direction_label("상행"),
            RestAreaCandidate::new("both", "C", route[5])
                .with_highway("0010", "경부선")
                .with_direction_label("양방향"),
        ];

        let outcome = pipeline(FilterConfig::default())
            .run(&route, &[], &candidates, &snapshot)
            .unwrap();
        let got: Vec<(&str, Direction)> = outcome
            .results
            .iter()
            .map(|r| (r.candidate.id.as_str(), r.direction))
            .collect();
        assert_eq!(got, vec![("down", Direction::Down), ("both", Direction::Both)]);
    }

    #[test]
    fn result_fields() {
        let route = densify(SEOUL_STATION, BUSAN, 100);
        let candidates = vec![RestAreaCandidate::new("a", "X", beside(0.5))];
        let outcome = pipeline(FilterConfig::default())
            .run(&route, &[], &candidates, &CatalogSnapshot::empty())
            .unwrap();

        let r = &outcome.results[0];
        assert!((r.route_position_ratio - 0.5).abs() < 0.02);
        assert!(
            (r.estimated_travel_time_min - r.distance_from_route_start_km / 80.0 * 60.0).abs() < 1e-9
        );
    }

    #[test]
    fn truncates_and_filters_by_section() {
        let route = densify(SEOUL_STATION, BUSAN, 200);
        let candidates: Vec<RestAreaCandidate> = (0..10)
            .map(|i| RestAreaCandidate::new(format!("r{i}"), "X", beside(0.05 + i as f64 * 0.09)))
            .collect();

        let outcome = pipeline(FilterConfig::default().with_max_results(6))
            .run(&route, &[], &candidates, &CatalogSnapshot::empty())
            .unwrap();
        assert_eq!(outcome.diagnostics.filter_stages.after_interval_filter, 10);
        assert_eq!(outcome.results.len(), 6);

        let section = outcome.within_section(100.0, 50.0);
        assert!(!section.results.is_empty());
        assert!(
            section
                .results
                .iter()
                .all(|r| (50.0..=100.0).contains(&r.distance_from_route_start_km))
        );
    }

    #[test]
    fn single_point_route_is_accepted() {
        let candidates = vec![RestAreaCandidate::new("a", "X", SEOUL_STATION)];
        let outcome = pipeline(FilterConfig::default())
            .run(&[SEOUL_STATION], &[], &candidates, &CatalogSnapshot::empty())
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].route_position_ratio, 0.0);
    }
}
