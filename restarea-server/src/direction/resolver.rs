//! Combines direction signals into a per-candidate verdict.

use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::domain::{Carriageway, Direction, RestAreaCandidate};
use crate::tables::DirectionTables;

use super::context::RouteContext;
use super::signals::{explicit_field, family_direction, geometric_bearing, highway_family, name_hint};

/// A candidate's own nearest interchange must be within this many km.
const NEAREST_IC_KM: f64 = 5.0;

/// Configuration for direction resolution.
#[derive(Debug, Clone)]
pub struct DirectionConfig {
    /// Require a confident match, and never accept an UNKNOWN candidate on a known route.
    pub strict_mode: bool,

    /// Minimum confidence under strict mode.
    pub confidence_threshold: f64,

    /// Accept candidates when the route direction cannot be resolved.
    pub include_unknown: bool,

    /// Trust "both directions" labels.
    pub include_both: bool,

    /// Confidence before any signal fires.
    pub baseline: f64,
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            confidence_threshold: 0.8,
            include_unknown: true,
            include_both: true,
            baseline: 0.5,
        }
    }
}

/// Direction verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionAssessment {
    /// The candidate's resolved direction.
    pub direction: Direction,
    /// Direction of travel the candidate was judged against.
    pub route_direction: Direction,
    pub is_accessible: bool,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

/// Decides whether candidates can be reached without crossing carriageways.
#[derive(Debug, Clone)]
pub struct DirectionResolver {
    tables: Arc<DirectionTables>,
    config: DirectionConfig,
}

impl DirectionResolver {
    pub fn new(tables: Arc<DirectionTables>, config: DirectionConfig) -> Self {
        Self { tables, config }
    }

    pub fn config(&self) -> &DirectionConfig {
        &self.config
    }

    /// Assess one candidate against the route.
    ///
    /// The route direction comes from interchange order on the candidate's
    /// highway, or from the highway's axis convention when interchanges are
    /// too sparse. The candidate direction comes from its label, or from the
    /// interchange order towards the destination in its name.
    pub fn assess(&self, ctx: &RouteContext<'_>, candidate: &RestAreaCandidate) -> DirectionAssessment {
        let heading = ctx.heading_at(candidate.coordinates);
        let code = ctx.highway_for(candidate);
        let from_interchanges = code
            .map(|c| ctx.route_direction(c))
            .unwrap_or(Direction::Unknown);

        let family_name = candidate.highway_name.as_deref().or_else(|| {
            code.and_then(|c| ctx.matched().highway(c))
                .map(|h| h.highway_name.as_str())
        });
        let family_code = candidate.highway_code.as_deref().or(code);
        let inferred = family_direction(&self.tables, family_code, family_name, heading);

        let route_direction = if from_interchanges.is_carriageway() {
            from_interchanges
        } else {
            inferred.unwrap_or(Direction::Unknown)
        };

        let mut reasons = Vec::new();
        let (direction, direction_reason) = self.candidate_direction(ctx, candidate, code);
        reasons.extend(direction_reason);

        let signals = [
            name_hint(&self.tables, candidate, heading),
            explicit_field(direction, route_direction),
            highway_family(inferred, from_interchanges),
            geometric_bearing(candidate.coordinates, ctx.route()),
        ];
        let mut confidence = self.config.baseline;
        for signal in signals.into_iter().flatten() {
            confidence += signal.delta;
            reasons.push(signal.reason);
        }
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            self.config.baseline.clamp(0.0, 1.0)
        };

        let is_accessible = self.is_accessible(direction, route_direction, confidence);
        if !is_accessible {
            reasons.push(if self.config.strict_mode && confidence < self.config.confidence_threshold {
                format!("confidence {confidence:.2} below strict threshold")
            } else {
                format!("not reachable from route direction {route_direction}")
            });
        }

        trace!(
            id = %candidate.id,
            %direction,
            %route_direction,
            confidence,
            is_accessible,
            "assessed candidate direction"
        );

        DirectionAssessment {
            direction,
            route_direction,
            is_accessible,
            confidence,
            reasons,
        }
    }

    /// Acceptance rule.
    ///
    /// BOTH is always reachable. Otherwise the candidate must match the
    /// route direction, or be excused by an unresolved route
    /// (`include_unknown`) or an unresolved candidate (non-strict). Strict
    /// mode also requires `confidence_threshold`.
    pub fn is_accessible(&self, candidate: Direction, route: Direction, confidence: f64) -> bool {
        if candidate == Direction::Both {
            return true;
        }

        let by_rule = (candidate.is_carriageway() && candidate == route)
            || (route == Direction::Unknown && self.config.include_unknown)
            || (!self.config.strict_mode && candidate == Direction::Unknown);

        by_rule && (!self.config.strict_mode || confidence >= self.config.confidence_threshold)
    }

    /// The candidate's own direction and why.
    fn candidate_direction(
        &self,
        ctx: &RouteContext<'_>,
        candidate: &RestAreaCandidate,
        code: Option<&str>,
    ) -> (Direction, Option<String>) {
        if let Some(label) = candidate.direction_label.as_deref() {
            let direction = self.tables.normalize_label(label, self.config.include_both);
            if direction != Direction::Unknown {
                return (direction, Some(format!("label {label:?} reads as {direction}")));
            }
        }

        let (Some(code), Some(hint)) = (code, candidate.destination_hint()) else {
            return (Direction::Unknown, None);
        };

        let snapshot = ctx.snapshot();
        let Some((own, km)) = snapshot.nearest_on_highway(code, Carriageway::Up, candidate.coordinates)
        else {
            return (Direction::Unknown, None);
        };
        let Some(dest) = snapshot.find_by_name_prefix(code, Carriageway::Up, hint) else {
            return (Direction::Unknown, None);
        };
        if km > NEAREST_IC_KM || dest.unit_code == own.unit_code {
            return (Direction::Unknown, None);
        }

        // Heading towards a lower UP weight means moving away from the origin
        let direction = if own.weight > dest.weight {
            Direction::Down
        } else {
            Direction::Up
        };
        (
            direction,
            Some(format!(
                "heads from {} towards {} ({direction} by interchange order)",
                own.name, dest.name
            )),
        )
    }
}
