//! Per-query view of a route used by direction resolution.

use std::collections::{HashMap, HashSet};

use crate::domain::{Carriageway, Coordinate, Direction, RestAreaCandidate, same_highway};
use crate::geometry::{
    RouteProjection, bearing, cumulative_distances, local_bearing, nearest_vertex_index,
    project_onto_polyline,
};
use crate::interchanges::{CatalogSnapshot, NearbyInterchange};
use crate::matcher::HighwayMatchResult;

/// Half-width of the window used to measure the local route heading, in km.
const HEADING_WINDOW_KM: f64 = 1.0;

/// A route together with everything derived from it once per query.
#[derive(Debug)]
pub struct RouteContext<'a> {
    route: &'a [Coordinate],
    cumulative: Vec<f64>,
    coarse_bearing: Option<f64>,
    snapshot: &'a CatalogSnapshot,
    matched: &'a HighwayMatchResult,
    /// Route direction per highway code, from interchange weights.
    directions: HashMap<String, Direction>,
}

impl<'a> RouteContext<'a> {
    pub fn new(
        route: &'a [Coordinate],
        snapshot: &'a CatalogSnapshot,
        matched: &'a HighwayMatchResult,
    ) -> Self {
        let coarse_bearing = match (route.first(), route.last()) {
            (Some(a), Some(b)) if a != b => Some(bearing(*a, *b)),
            _ => None,
        };

        let cumulative = cumulative_distances(route);
        let codes: HashSet<&str> = matched
            .nearby
            .iter()
            .map(|n| n.interchange.highway_code.as_str())
            .collect();
        let directions = codes
            .into_iter()
            .map(|code| {
                (
                    code.to_string(),
                    route_direction_from_weights(&matched.nearby, code, route, &cumulative),
                )
            })
            .collect();

        Self {
            route,
            cumulative,
            coarse_bearing,
            snapshot,
            matched,
            directions,
        }
    }

    pub fn route(&self) -> &[Coordinate] {
        self.route
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        self.snapshot
    }

    pub fn matched(&self) -> &HighwayMatchResult {
        self.matched
    }

    /// Total route length in km.
    pub fn length_km(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Cumulative route length in km up to the vertex nearest `p`.
    pub fn distance_from_start(&self, p: Coordinate) -> f64 {
        nearest_vertex_index(p, self.route)
            .and_then(|i| self.cumulative.get(i).copied())
            .unwrap_or(0.0)
    }

    /// Where a point projects onto the route.
    pub fn project(&self, p: Coordinate) -> Option<RouteProjection> {
        project_onto_polyline(p, self.route, &self.cumulative)
    }

    /// Heading of travel near `p`: the local heading around the nearest
    /// vertex, or the start-to-end bearing when that is undefined.
    pub fn heading_at(&self, p: Coordinate) -> Option<f64> {
        nearest_vertex_index(p, self.route)
            .and_then(|i| local_bearing(self.route, i, HEADING_WINDOW_KM))
            .or(self.coarse_bearing)
    }

    /// Route direction on a highway as derived from interchange weights.
    pub fn route_direction(&self, highway_code: &str) -> Direction {
        self.directions
            .get(highway_code)
            .copied()
            .unwrap_or(Direction::Unknown)
    }

    /// The highway a candidate is judged against.
    ///
    /// Its own code when interchanges of that highway were found along the
    /// route; otherwise a detected highway with the same name; otherwise the
    /// primary highway.
    pub fn highway_for(&self, candidate: &RestAreaCandidate) -> Option<&str> {
        if let Some(code) = candidate.highway_code.as_deref()
            && let Some((known, _)) = self.directions.get_key_value(code)
        {
            return Some(known.as_str());
        }

        if let Some(name) = candidate.highway_name.as_deref() {
            let by_name = self
                .matched
                .detected_highways
                .iter()
                .map(|h| (h.highway_code.as_str(), h.highway_name.as_str()))
                .chain(self.matched.nearby.iter().map(|n| {
                    (
                        n.interchange.highway_code.as_str(),
                        n.interchange.highway_name.as_str(),
                    )
                }))
                .find(|(_, n)| same_highway(n, name));
            if let Some((code, _)) = by_name {
                return Some(code);
            }
        }

        self.matched
            .primary_highway
            .as_ref()
            .map(|h| h.highway_code.as_str())
    }
}

/// Direction of travel on a highway, from the UP-carriageway weights of the
/// first and last distinct interchanges along the route.
///
/// Interchanges are ordered by their projected distance along `route`, so
/// several sharing one nearest vertex still come out in travel order.
/// `cumulative` must come from [`cumulative_distances`] for `route`.
///
/// UP weights fall with distance from the highway origin, so a falling
/// weight means the route travels away from the origin (DOWN). Fewer than
/// two distinct interchanges, or equal weights, give UNKNOWN.
pub fn route_direction_from_weights(
    nearby: &[NearbyInterchange],
    highway_code: &str,
    route: &[Coordinate],
    cumulative: &[f64],
) -> Direction {
    let mut seen = HashSet::new();
    let mut up: Vec<(f64, &NearbyInterchange)> = nearby
        .iter()
        .filter(|n| {
            n.interchange.highway_code == highway_code
                && n.interchange.direction == Carriageway::Up
        })
        .filter(|n| seen.insert(n.interchange.unit_code.as_str()))
        .map(|n| {
            let along = project_onto_polyline(n.interchange.coordinates, route, cumulative)
                .map(|p| p.along_km)
                .unwrap_or(0.0);
            (along, n)
        })
        .collect();
    if up.len() < 2 {
        return Direction::Unknown;
    }
    up.sort_by(|(a_km, a), (b_km, b)| {
        a_km.total_cmp(b_km)
            .then_with(|| a.route_index.cmp(&b.route_index))
    });

    let (Some((_, start)), Some((_, end))) = (up.first(), up.last()) else {
        return Direction::Unknown;
    };

    match start.interchange.weight.cmp(&end.interchange.weight) {
        std::cmp::Ordering::Greater => Direction::Down,
        std::cmp::Ordering::Less => Direction::Up,
        std::cmp::Ordering::Equal => Direction::Unknown,
    }
}
