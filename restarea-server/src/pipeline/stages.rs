//! The individual narrowing stages.

use tracing::debug;

use crate::direction::{DirectionResolver, RouteContext};
use crate::domain::{Direction, RestAreaCandidate};
use crate::geometry::min_distance_to_polyline;
use crate::matcher::AllowedHighways;
use crate::tables::DirectionTables;

/// A candidate carried between stages.
#[derive(Debug, Clone)]
pub(crate) struct Survivor<'c> {
    pub candidate: &'c RestAreaCandidate,
    pub distance_from_route_m: f64,
    pub distance_from_start_km: f64,
    pub confidence: f64,
    pub direction: Direction,
    pub reasons: Vec<String>,
}

/// Stage 1. `None` for `allowed` passes everything through.
pub(crate) fn highway_match<'c>(
    candidates: &'c [RestAreaCandidate],
    allowed: Option<&AllowedHighways>,
) -> Vec<&'c RestAreaCandidate> {
    match allowed {
        None => candidates.iter().collect(),
        Some(allowed) => candidates
            .iter()
            .filter(|c| {
                let keep = allowed.allows(c);
                if !keep {
                    debug!(id = %c.id, highway = ?c.highway_name, "dropped: not on a matched highway");
                }
                keep
            })
            .collect(),
    }
}

/// Stage 2. Candidates without a usable location are dropped here.
pub(crate) fn distance<'c>(
    candidates: Vec<&'c RestAreaCandidate>,
    ctx: &RouteContext<'_>,
    max_distance_m: f64,
) -> Vec<Survivor<'c>> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance_m = if candidate.coordinates.is_valid() {
                min_distance_to_polyline(candidate.coordinates, ctx.route()) * 1000.0
            } else {
                debug!(id = %candidate.id, "dropped: invalid coordinates");
                return None;
            };
            if !(distance_m <= max_distance_m) {
                debug!(id = %candidate.id, distance_m, "dropped: too far from route");
                return None;
            }
            Some(Survivor {
                candidate,
                distance_from_route_m: distance_m,
                distance_from_start_km: ctx.distance_from_start(candidate.coordinates),
                confidence: 0.0,
                direction: Direction::Unknown,
                reasons: Vec::new(),
            })
        })
        .collect()
}

/// Stage 3, direction filter on.
pub(crate) fn direction<'c>(
    survivors: Vec<Survivor<'c>>,
    ctx: &RouteContext<'_>,
    resolver: &DirectionResolver,
) -> Vec<Survivor<'c>> {
    survivors
        .into_iter()
        .filter_map(|mut s| {
            let assessment = resolver.assess(ctx, s.candidate);
            if !assessment.is_accessible {
                debug!(
                    id = %s.candidate.id,
                    confidence = assessment.confidence,
                    reasons = ?assessment.reasons,
                    "dropped: not accessible"
                );
                return None;
            }
            s.confidence = assessment.confidence;
            s.direction = assessment.direction;
            s.reasons = assessment.reasons;
            Some(s)
        })
        .collect()
}

/// Stage 3, direction filter off: score by highway confidence instead.
pub(crate) fn highway_scores<'c>(
    survivors: Vec<Survivor<'c>>,
    ctx: &RouteContext<'_>,
    tables: &DirectionTables,
    baseline: f64,
    include_both: bool,
) -> Vec<Survivor<'c>> {
    survivors
        .into_iter()
        .map(|mut s| {
            let highway = ctx
                .highway_for(s.candidate)
                .and_then(|code| ctx.matched().highway(code));
            s.confidence = highway.map(|h| h.confidence).unwrap_or(baseline).clamp(0.0, 1.0);
            s.direction = s
                .candidate
                .direction_label
                .as_deref()
                .map(|label| tables.normalize_label(label, include_both))
                .unwrap_or(Direction::Unknown);
            s.reasons.push(match highway {
                Some(h) => format!("on detected highway {}", h.highway_name),
                None => "direction filter disabled".to_string(),
            });
            s
        })
        .collect()
}

/// Stage 4. Sort by distance from the route start and enforce spacing.
///
/// Within one window the higher confidence wins; ties keep the earlier.
pub(crate) fn interval(mut survivors: Vec<Survivor<'_>>, min_interval_km: f64) -> Vec<Survivor<'_>> {
    survivors.sort_by(|a, b| a.distance_from_start_km.total_cmp(&b.distance_from_start_km));

    let mut kept: Vec<Survivor<'_>> = Vec::with_capacity(survivors.len());
    for s in survivors {
        match kept.last_mut() {
            Some(last) if s.distance_from_start_km - last.distance_from_start_km < min_interval_km => {
                if s.confidence > last.confidence {
                    debug!(kept = %s.candidate.id, dropped = %last.candidate.id, "interval: replaced");
                    *last = s;
                } else {
                    debug!(kept = %last.candidate.id, dropped = %s.candidate.id, "interval: dropped");
                }
            }
            _ => kept.push(s),
        }
    }
    kept
}
