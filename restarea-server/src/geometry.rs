//! Spherical geometry helpers for routes and points.
//!
//! Distances are in kilometres and bearings in degrees clockwise from true
//! north. Every function is pure; degenerate inputs produce a defined value
//! (usually `f64::INFINITY` or `None`) rather than panicking.

use crate::domain::Coordinate;

/// Mean earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in km.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * c
}

/// Initial bearing from `a` to `b`, normalised to `[0, 360)`.
pub fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    let deg = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if deg >= 360.0 { 0.0 } else { deg }
}

/// Smallest absolute difference between two bearings, in `[0, 180]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Closest point to `p` on segment `a`–`b` and its segment parameter.
///
/// The projection is planar in degree space (x = lng, y = lat) with the
/// parameter clamped to `[0, 1]`. A zero-length segment projects to `a`.
fn project_onto_segment(p: Coordinate, a: Coordinate, b: Coordinate) -> (Coordinate, f64) {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 || !len_sq.is_finite() {
        return (a, 0.0);
    }

    let t = (((p.lng - a.lng) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0);
    (Coordinate::new(a.lat + t * dy, a.lng + t * dx), t)
}

/// Distance in km from `p` to the segment `a`–`b`.
pub fn point_to_segment_distance(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    let (closest, _) = project_onto_segment(p, a, b);
    haversine_distance(p, closest)
}

/// Minimum distance in km from `p` to any segment of `polyline`.
///
/// A single-point polyline degenerates to the distance to that point; an
/// empty polyline is infinitely far away.
pub fn min_distance_to_polyline(p: Coordinate, polyline: &[Coordinate]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [only] => haversine_distance(p, *only),
        _ => polyline
            .windows(2)
            .map(|w| point_to_segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Index of the polyline vertex closest to `p`.
pub fn nearest_vertex_index(p: Coordinate, polyline: &[Coordinate]) -> Option<usize> {
    polyline
        .iter()
        .enumerate()
        .map(|(i, v)| (i, haversine_distance(p, *v)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Cumulative distance in km from the first vertex to each vertex.
///
/// The result has the same length as `polyline`; its first element is 0.
pub fn cumulative_distances(polyline: &[Coordinate]) -> Vec<f64> {
    let mut out = Vec::with_capacity(polyline.len());
    let mut total = 0.0;
    for (i, v) in polyline.iter().enumerate() {
        if i > 0 {
            total += haversine_distance(polyline[i - 1], *v);
        }
        out.push(total);
    }
    out
}

/// Total length of a polyline in km.
pub fn polyline_length(polyline: &[Coordinate]) -> f64 {
    polyline
        .windows(2)
        .map(|w| haversine_distance(w[0], w[1]))
        .sum()
}

/// Where a point projects onto a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteProjection {
    /// Index of the segment start vertex.
    pub segment: usize,
    /// Closest point on the route.
    pub closest: Coordinate,
    /// Distance from the point to the route in km.
    pub offset_km: f64,
    /// Distance along the route from its first vertex to `closest`, in km.
    pub along_km: f64,
}

/// Project `p` onto the nearest segment of `polyline`.
///
/// `cumulative` must come from [`cumulative_distances`] for the same
/// polyline. Returns `None` for an empty polyline.
pub fn project_onto_polyline(
    p: Coordinate,
    polyline: &[Coordinate],
    cumulative: &[f64],
) -> Option<RouteProjection> {
    match polyline {
        [] => None,
        [only] => Some(RouteProjection {
            segment: 0,
            closest: *only,
            offset_km: haversine_distance(p, *only),
            along_km: 0.0,
        }),
        _ => polyline
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let (closest, _) = project_onto_segment(p, w[0], w[1]);
                let start = cumulative.get(i).copied().unwrap_or(0.0);
                RouteProjection {
                    segment: i,
                    closest,
                    offset_km: haversine_distance(p, closest),
                    along_km: start + haversine_distance(w[0], closest),
                }
            })
            .min_by(|a, b| a.offset_km.total_cmp(&b.offset_km)),
    }
}

/// Heading of the route around vertex `index`.
///
/// Walks up to `window_km` backwards and forwards from the vertex and
/// returns the bearing between the two ends reached. Always spans at least
/// one segment when the polyline has one. Returns `None` when the window
/// collapses to a single point.
pub fn local_bearing(polyline: &[Coordinate], index: usize, window_km: f64) -> Option<f64> {
    if polyline.len() < 2 || index >= polyline.len() {
        return None;
    }

    let mut start = index;
    let mut walked = 0.0;
    while start > 0 && walked < window_km {
        walked += haversine_distance(polyline[start - 1], polyline[start]);
        start -= 1;
    }

    let mut end = index;
    walked = 0.0;
    while end + 1 < polyline.len() && (walked < window_km || end == start) {
        walked += haversine_distance(polyline[end], polyline[end + 1]);
        end += 1;
    }

    if end == start {
        return None;
    }
    let (a, b) = (polyline[start], polyline[end]);
    (haversine_distance(a, b) > 0.0).then(|| bearing(a, b))
}

/// Which side of the direction of travel a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    /// Within the tolerance of the route line.
    On,
}

/// Side of the route on which `p` lies, relative to the direction of travel.
///
/// Uses the nearest segment. Points within `tolerance_km` of the route, or
/// near a single-point route, are [`Side::On`].
pub fn side_of_route(p: Coordinate, polyline: &[Coordinate], tolerance_km: f64) -> Side {
    let cumulative = cumulative_distances(polyline);
    let Some(proj) = project_onto_polyline(p, polyline, &cumulative) else {
        return Side::On;
    };
    if proj.offset_km <= tolerance_km || polyline.len() < 2 {
        return Side::On;
    }

    let a = polyline[proj.segment];
    let b = polyline[proj.segment + 1];
    // Scale longitude so the cross product is taken in a locally isotropic frame
    let k = a.lat.to_radians().cos();
    let (dx, dy) = ((b.lng - a.lng) * k, b.lat - a.lat);
    let (px, py) = ((p.lng - a.lng) * k, p.lat - a.lat);
    let cross = dx * py - dy * px;

    if cross > 0.0 {
        Side::Left
    } else if cross < 0.0 {
        Side::Right
    } else {
        Side::On
    }
}
