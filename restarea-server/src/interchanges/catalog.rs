//! Interchange catalog snapshots and their TTL cache.
//!
//! A [`CatalogSnapshot`] is built once from the raw feed and never mutated.
//! [`InterchangeCatalog`] keeps the current snapshot behind an `Arc` in a
//! single-entry moka cache; a refresh builds a whole new snapshot and swaps
//! it in, so a reader holding the old `Arc` is never affected.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{Carriageway, Coordinate, Interchange, normalize_highway_name};
use crate::geometry::{haversine_distance, min_distance_to_polyline, nearest_vertex_index};

use super::client::RawInterchange;
use super::error::CatalogError;
use super::source::InterchangeSource;

/// Latitude range of the expressway network.
const SERVICE_LAT: std::ops::RangeInclusive<f64> = 33.0..=39.0;

/// Longitude range of the expressway network.
const SERVICE_LNG: std::ops::RangeInclusive<f64> = 125.0..=132.0;

/// Degrees of latitude per km, for bounding-box prefilters.
const DEG_PER_KM: f64 = 1.0 / 111.0;

/// An interchange close to a route.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyInterchange {
    pub interchange: Interchange,
    /// Distance from the route polyline in metres.
    pub distance_m: f64,
    /// Index of the nearest route vertex; a proxy for route order.
    pub route_index: usize,
}

/// Immutable, partitioned interchange catalog.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Entries keyed by (highway code, carriageway), ordered by distance
    /// from the highway origin.
    partitions: HashMap<(String, Carriageway), Vec<Interchange>>,
    built_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// A snapshot with no interchanges.
    pub fn empty() -> Self {
        Self {
            partitions: HashMap::new(),
            built_at: Utc::now(),
        }
    }

    /// Build a snapshot from the raw feed.
    pub fn from_raw(rows: &[RawInterchange]) -> Self {
        Self::from_entries(build_entries(rows))
    }

    /// Build a snapshot from already-constructed entries.
    pub fn from_entries(entries: Vec<Interchange>) -> Self {
        let mut partitions: HashMap<(String, Carriageway), Vec<Interchange>> = HashMap::new();
        for ic in entries {
            partitions
                .entry((ic.highway_code.clone(), ic.direction))
                .or_default()
                .push(ic);
        }
        for list in partitions.values_mut() {
            list.sort_by(|a, b| a.distance_from_start.total_cmp(&b.distance_from_start));
        }

        Self {
            partitions,
            built_at: Utc::now(),
        }
    }

    /// Number of carriageway entries (two per physical interchange).
    pub fn len(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(Vec::is_empty)
    }

    /// Number of distinct highways.
    pub fn highway_count(&self) -> usize {
        self.partitions
            .keys()
            .map(|(code, _)| code.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Entries of one carriageway, ordered by distance from the highway origin.
    pub fn carriageway(&self, highway_code: &str, direction: Carriageway) -> &[Interchange] {
        self.partitions
            .get(&(highway_code.to_string(), direction))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over every entry.
    pub fn iter(&self) -> impl Iterator<Item = &Interchange> {
        self.partitions.values().flatten()
    }

    /// Entries whose distance to `route` is at most `max_distance_m`.
    ///
    /// Results are tagged with the nearest route vertex and sorted by it.
    pub fn find_nearby(&self, route: &[Coordinate], max_distance_m: f64) -> Vec<NearbyInterchange> {
        let Some(bbox) = BoundingBox::around(route, max_distance_m / 1000.0) else {
            return Vec::new();
        };

        let mut nearby: Vec<NearbyInterchange> = self
            .iter()
            .filter(|ic| bbox.contains(ic.coordinates))
            .filter_map(|ic| {
                let distance_m = min_distance_to_polyline(ic.coordinates, route) * 1000.0;
                if distance_m > max_distance_m {
                    return None;
                }
                let route_index = nearest_vertex_index(ic.coordinates, route)?;
                Some(NearbyInterchange {
                    interchange: ic.clone(),
                    distance_m,
                    route_index,
                })
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.route_index
                .cmp(&b.route_index)
                .then_with(|| a.interchange.id.cmp(&b.interchange.id))
        });
        debug!(count = nearby.len(), max_distance_m, "interchanges near route");
        nearby
    }

    /// The entry of one carriageway closest to `point`, with its distance in km.
    pub fn nearest_on_highway(
        &self,
        highway_code: &str,
        direction: Carriageway,
        point: Coordinate,
    ) -> Option<(&Interchange, f64)> {
        self.carriageway(highway_code, direction)
            .iter()
            .map(|ic| (ic, haversine_distance(point, ic.coordinates)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// The first entry of one carriageway whose name starts with `name`.
    pub fn find_by_name_prefix(
        &self,
        highway_code: &str,
        direction: Carriageway,
        name: &str,
    ) -> Option<&Interchange> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.carriageway(highway_code, direction)
            .iter()
            .find(|ic| ic.name.starts_with(name))
    }
}

/// Latitude/longitude box used to skip far-away entries cheaply.
struct BoundingBox {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl BoundingBox {
    fn around(points: &[Coordinate], margin_km: f64) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lng: first.lng,
            max_lng: first.lng,
        };
        for p in points {
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.max_lat = bbox.max_lat.max(p.lat);
            bbox.min_lng = bbox.min_lng.min(p.lng);
            bbox.max_lng = bbox.max_lng.max(p.lng);
        }

        let lat_margin = margin_km * DEG_PER_KM;
        // Longitude degrees shrink towards the poles
        let cos_lat = bbox.max_lat.abs().max(bbox.min_lat.abs()).to_radians().cos().max(0.01);
        let lng_margin = lat_margin / cos_lat;
        bbox.min_lat -= lat_margin;
        bbox.max_lat += lat_margin;
        bbox.min_lng -= lng_margin;
        bbox.max_lng += lng_margin;
        Some(bbox)
    }

    fn contains(&self, p: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lng..=self.max_lng).contains(&p.lng)
    }
}

/// Turn raw feed rows into carriageway entries.
///
/// Rows are grouped per highway code and ordered by distance from the
/// highway origin. Rows without a usable in-network coordinate, and repeated
/// unit codes, are dropped before numbering, so the weights of each
/// carriageway are strictly monotonic: DOWN weights run `1..=n`, UP weights
/// run `n..=1`.
pub fn build_entries(rows: &[RawInterchange]) -> Vec<Interchange> {
    let mut groups: BTreeMap<&str, Vec<(&RawInterchange, Coordinate, f64)>> = BTreeMap::new();
    let mut dropped = 0usize;

    for row in rows {
        let Some(coords) = parse_coordinates(row) else {
            dropped += 1;
            continue;
        };
        let km = row
            .start_value
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);
        groups.entry(row.route_code.as_str()).or_default().push((row, coords, km));
    }

    let mut entries = Vec::new();
    for (route_code, mut group) in groups {
        group.sort_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.unit_code.cmp(&b.0.unit_code)));
        let mut seen = HashSet::new();
        group.retain(|(row, _, _)| seen.insert(row.unit_code.as_str()));

        let count = group.len();
        for (index, (row, coords, km)) in group.iter().enumerate() {
            let prev_unit = index
                .checked_sub(1)
                .map(|i| group[i].0.unit_code.clone());
            let next_unit = group.get(index + 1).map(|next| next.0.unit_code.clone());

            for direction in Carriageway::ALL {
                let weight = match direction {
                    Carriageway::Down => index + 1,
                    Carriageway::Up => count - index,
                };
                entries.push(Interchange {
                    id: Interchange::make_id(&row.unit_code, direction),
                    unit_code: row.unit_code.clone(),
                    name: row.unit_name.trim().to_string(),
                    highway_name: normalize_highway_name(&row.route_name),
                    highway_code: route_code.to_string(),
                    direction,
                    weight: weight as u32,
                    distance_from_start: *km,
                    coordinates: *coords,
                    prev_unit: prev_unit.clone(),
                    next_unit: next_unit.clone(),
                });
            }
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped interchanges without usable coordinates");
    }
    entries
}

fn parse_coordinates(row: &RawInterchange) -> Option<Coordinate> {
    let lat = row.y_value.trim().parse::<f64>().ok()?;
    let lng = row.x_value.trim().parse::<f64>().ok()?;
    let coords = Coordinate::new(lat, lng);
    (coords.is_valid() && SERVICE_LAT.contains(&lat) && SERVICE_LNG.contains(&lng))
        .then_some(coords)
}

/// Configuration for the catalog cache.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// How long a snapshot is served before it is rebuilt.
    pub ttl: Duration,
}

impl CatalogConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Interchange catalog with a TTL-cached snapshot.
///
/// Concurrent loads of an expired snapshot are coalesced into one fetch.
/// If a rebuild fails, the last good snapshot keeps being served.
pub struct InterchangeCatalog<S> {
    source: S,
    snapshot: MokaCache<(), Arc<CatalogSnapshot>>,
    last_good: RwLock<Option<Arc<CatalogSnapshot>>>,
}

impl<S: InterchangeSource> InterchangeCatalog<S> {
    pub fn new(source: S, config: &CatalogConfig) -> Self {
        let snapshot = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(1)
            .build();

        Self {
            source,
            snapshot,
            last_good: RwLock::new(None),
        }
    }

    /// The current snapshot, building one if none is cached.
    pub async fn load(&self) -> Result<Arc<CatalogSnapshot>, Arc<CatalogError>> {
        match self.snapshot.try_get_with((), self.build()).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                let last = self.last_good.read().await.clone();
                match last {
                    Some(snapshot) => {
                        warn!(error = %e, "interchange catalog rebuild failed, serving last good snapshot");
                        // Serve it for another TTL instead of retrying on every request
                        self.snapshot.insert((), snapshot.clone()).await;
                        Ok(snapshot)
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Build a new snapshot and swap it in.
    ///
    /// The old snapshot keeps being served until the new one is ready, and
    /// stays in place if the rebuild fails. Returns the number of entries
    /// in the snapshot now being served.
    pub async fn refresh(&self) -> Result<usize, Arc<CatalogError>> {
        match self.build().await {
            Ok(snapshot) => {
                let count = snapshot.len();
                self.snapshot.insert((), snapshot).await;
                Ok(count)
            }
            Err(e) => match self.current().await {
                Some(snapshot) => {
                    warn!(error = %e, "interchange catalog refresh failed, keeping current snapshot");
                    Ok(snapshot.len())
                }
                None => Err(Arc::new(e)),
            },
        }
    }

    /// The snapshot being served, without triggering a load.
    pub async fn current(&self) -> Option<Arc<CatalogSnapshot>> {
        match self.snapshot.get(&()).await {
            Some(s) => Some(s),
            None => self.last_good.read().await.clone(),
        }
    }

    async fn build(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let rows = self.source.fetch().await?;
        let snapshot = CatalogSnapshot::from_raw(&rows);
        if snapshot.is_empty() {
            return Err(CatalogError::Empty);
        }

        info!(
            entries = snapshot.len(),
            highways = snapshot.highway_count(),
            "built interchange catalog snapshot"
        );
        let snapshot = Arc::new(snapshot);
        *self.last_good.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }
}
