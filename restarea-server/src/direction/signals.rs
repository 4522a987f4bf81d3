//! Individual direction signals.
//!
//! Each signal looks at one kind of evidence and returns a bounded
//! confidence delta with a human-readable reason, or `None` when it has
//! nothing to say. The resolver adds the deltas to a baseline.

use crate::domain::{Coordinate, Direction, RestAreaCandidate};
use crate::geometry::{Side, angle_difference, bearing, haversine_distance, side_of_route};
use crate::tables::DirectionTables;

/// A destination closer than this (km) says nothing about direction.
const MIN_DESTINATION_KM: f64 = 10.0;

/// Heading differences at or below this are "towards".
const COMPATIBLE_DEG: f64 = 60.0;

/// Heading differences at or above this are "away from".
const OPPOSED_DEG: f64 = 120.0;

/// Family inference needs the route heading within this many degrees of the axis.
const FAMILY_AXIS_TOLERANCE_DEG: f64 = 70.0;

/// Distance (km) from the route line within which the side is ambiguous.
const SIDE_TOLERANCE_KM: f64 = 0.03;

pub const NAME_HINT_COMPATIBLE: f64 = 0.30;
pub const NAME_HINT_OPPOSED: f64 = -0.35;
pub const EXPLICIT_BOTH: f64 = 0.20;
pub const EXPLICIT_MATCH: f64 = 0.30;
pub const EXPLICIT_MISMATCH: f64 = -0.40;
pub const FAMILY_AGREE: f64 = 0.15;
pub const FAMILY_DISAGREE: f64 = -0.20;
pub const SIDE_RIGHT: f64 = 0.10;
pub const SIDE_LEFT: f64 = -0.05;

/// A fired signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub delta: f64,
    pub reason: String,
}

impl Signal {
    fn new(delta: f64, reason: impl Into<String>) -> Self {
        Self {
            delta,
            reason: reason.into(),
        }
    }
}

/// Destination named in the candidate, e.g. `"망향(부산)"`.
///
/// Compares the bearing from the candidate to the destination city with the
/// heading of travel. A destination ahead is positive evidence, one behind
/// is strong negative evidence, and a lateral one only adds a reason.
pub fn name_hint(
    tables: &DirectionTables,
    candidate: &RestAreaCandidate,
    heading: Option<f64>,
) -> Option<Signal> {
    let hint = candidate.destination_hint()?;
    let city = tables.city(hint)?;
    let heading = heading?;
    if haversine_distance(candidate.coordinates, city) < MIN_DESTINATION_KM {
        return None;
    }

    let expected = bearing(candidate.coordinates, city);
    let diff = angle_difference(expected, heading);
    let signal = if diff <= COMPATIBLE_DEG {
        Signal::new(
            NAME_HINT_COMPATIBLE,
            format!("destination {hint} is ahead ({diff:.0}° off heading)"),
        )
    } else if diff >= OPPOSED_DEG {
        Signal::new(
            NAME_HINT_OPPOSED,
            format!("destination {hint} is behind the direction of travel ({diff:.0}° off heading)"),
        )
    } else {
        Signal::new(0.0, format!("destination {hint} is lateral to the route"))
    };
    Some(signal)
}

/// The candidate's own direction compared with the route direction.
pub fn explicit_field(candidate: Direction, route: Direction) -> Option<Signal> {
    match (candidate, route) {
        (Direction::Both, _) => Some(Signal::new(EXPLICIT_BOTH, "serves both directions")),
        (Direction::Unknown, _) | (_, Direction::Unknown | Direction::Both) => None,
        (c, r) if c == r => Some(Signal::new(
            EXPLICIT_MATCH,
            format!("direction {c} matches route direction"),
        )),
        (c, r) => Some(Signal::new(
            EXPLICIT_MISMATCH,
            format!("direction {c} opposes route direction {r}"),
        )),
    }
}

/// Direction implied by a highway family's axis convention and a heading.
///
/// `None` when the highway has no known family or the heading runs across
/// the family's axis.
pub fn family_direction(
    tables: &DirectionTables,
    code: Option<&str>,
    name: Option<&str>,
    heading: Option<f64>,
) -> Option<Direction> {
    let family = tables.family(code, name)?;
    let diff = angle_difference(heading?, family.up_heading);
    if diff <= FAMILY_AXIS_TOLERANCE_DEG {
        Some(Direction::Up)
    } else if diff >= 180.0 - FAMILY_AXIS_TOLERANCE_DEG {
        Some(Direction::Down)
    } else {
        None
    }
}

/// Family convention compared with the interchange-derived route direction.
///
/// With no interchange direction available the family direction stands in
/// for it; the signal then only records that.
pub fn highway_family(inferred: Option<Direction>, from_interchanges: Direction) -> Option<Signal> {
    let inferred = inferred?;
    if !from_interchanges.is_carriageway() {
        return Some(Signal::new(
            0.0,
            format!("route direction {inferred} inferred from highway convention"),
        ));
    }
    if inferred == from_interchanges {
        Some(Signal::new(
            FAMILY_AGREE,
            format!("highway convention agrees with interchange order ({inferred})"),
        ))
    } else {
        Some(Signal::new(
            FAMILY_DISAGREE,
            format!("highway convention ({inferred}) disagrees with interchange order ({from_interchanges})"),
        ))
    }
}

/// Which side of the road the candidate is on, for right-hand traffic.
pub fn geometric_bearing(candidate: Coordinate, route: &[Coordinate]) -> Option<Signal> {
    match side_of_route(candidate, route, SIDE_TOLERANCE_KM) {
        Side::Right => Some(Signal::new(SIDE_RIGHT, "on the right-hand side of travel")),
        Side::Left => Some(Signal::new(SIDE_LEFT, "on the left-hand side of travel")),
        Side::On => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> DirectionTables {
        DirectionTables::korea().unwrap()
    }

    fn candidate(name: &str) -> RestAreaCandidate {
        RestAreaCandidate::new("R", name, Coordinate::new(36.4, 128.0))
    }

    // Seoul station to Busan heads roughly 144°
    const SOUTHBOUND: f64 = 144.0;

    #[test]
    fn name_hint_towards_destination() {
        let s = name_hint(&tables(), &candidate("X(부산)"), Some(SOUTHBOUND)).unwrap();
        assert_eq!(s.delta, NAME_HINT_COMPATIBLE);
        assert!(s.reason.contains("부산"));
    }

    #[test]
    fn name_hint_away_from_destination() {
        let s = name_hint(&tables(), &candidate("X(서울)"), Some(SOUTHBOUND)).unwrap();
        assert_eq!(s.delta, NAME_HINT_OPPOSED);
    }

    #[test]
    fn name_hint_lateral_destination() {
        // 목포 lies south-west of the candidate, across a south-east heading
        let s = name_hint(&tables(), &candidate("X(목포)"), Some(SOUTHBOUND)).unwrap();
        assert_eq!(s.delta, 0.0);
    }

    #[test]
    fn name_hint_silent_without_evidence() {
        let t = tables();
        assert!(name_hint(&t, &candidate("X휴게소"), Some(SOUTHBOUND)).is_none());
        assert!(name_hint(&t, &candidate("X(평양)"), Some(SOUTHBOUND)).is_none());
        assert!(name_hint(&t, &candidate("X(부산)"), None).is_none());

        let near_busan = RestAreaCandidate::new("R", "X(부산)", Coordinate::new(35.18, 129.07));
        assert!(name_hint(&t, &near_busan, Some(SOUTHBOUND)).is_none());
    }

    #[test]
    fn explicit_field_cases() {
        assert_eq!(explicit_field(Direction::Both, Direction::Up).unwrap().delta, EXPLICIT_BOTH);
        assert_eq!(explicit_field(Direction::Down, Direction::Down).unwrap().delta, EXPLICIT_MATCH);
        assert_eq!(explicit_field(Direction::Up, Direction::Down).unwrap().delta, EXPLICIT_MISMATCH);
        assert!(explicit_field(Direction::Unknown, Direction::Down).is_none());
        assert!(explicit_field(Direction::Up, Direction::Unknown).is_none());
    }

    #[test]
    fn family_direction_from_heading() {
        let t = tables();
        assert_eq!(
            family_direction(&t, Some("0010"), None, Some(SOUTHBOUND)),
            Some(Direction::Down)
        );
        assert_eq!(
            family_direction(&t, None, Some("경부선"), Some(10.0)),
            Some(Direction::Up)
        );
        // Eastbound on 영동 is away from Seoul
        assert_eq!(
            family_direction(&t, None, Some("영동고속도로"), Some(80.0)),
            Some(Direction::Down)
        );
        assert_eq!(family_direction(&t, Some("0010"), None, Some(90.0)), None);
        assert_eq!(family_direction(&t, None, Some("남해선"), Some(90.0)), None);
    }

    #[test]
    fn highway_family_signal() {
        assert_eq!(
            highway_family(Some(Direction::Down), Direction::Down).unwrap().delta,
            FAMILY_AGREE
        );
        assert_eq!(
            highway_family(Some(Direction::Up), Direction::Down).unwrap().delta,
            FAMILY_DISAGREE
        );
        assert_eq!(
            highway_family(Some(Direction::Up), Direction::Unknown).unwrap().delta,
            0.0
        );
        assert!(highway_family(None, Direction::Down).is_none());
    }

    #[test]
    fn geometric_side() {
        let route = [Coordinate::new(37.0, 127.0), Coordinate::new(36.0, 127.0)];
        let right = geometric_bearing(Coordinate::new(36.5, 126.99), &route).unwrap();
        assert_eq!(right.delta, SIDE_RIGHT);
        let left = geometric_bearing(Coordinate::new(36.5, 127.01), &route).unwrap();
        assert_eq!(left.delta, SIDE_LEFT);
        assert!(geometric_bearing(Coordinate::new(36.5, 127.0), &route).is_none());
    }
}
