//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, RestAreaCandidate};
use crate::facilities::EnrichedResult;
use crate::pipeline::{FilterDiagnostics, FilterOverrides};

/// Request to find rest areas along a route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestAreaRequest {
    /// Route polyline, in travel order
    pub route: Vec<Coordinate>,

    /// Highway names reported by the routing provider
    #[serde(default)]
    pub highways: Vec<String>,

    /// Overrides of the server's filter defaults
    #[serde(default)]
    pub options: Option<FilterOverrides>,

    /// Only return results inside this stretch of the route
    #[serde(default)]
    pub section: Option<Section>,

    /// Attach facility details to each result
    #[serde(default)]
    pub include_facilities: bool,

    /// Candidates to filter instead of the loaded rest-area catalog
    #[serde(default)]
    pub candidates: Option<Vec<RestAreaCandidate>>,
}

/// A stretch of the route, in km from its start.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub start_km: f64,
    pub end_km: f64,
}

/// Rest areas found along a route.
#[derive(Debug, Serialize)]
pub struct RestAreaResponse {
    pub results: Vec<EnrichedResult>,
    pub diagnostics: FilterDiagnostics,
}

/// State of the loaded reference data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    /// Whether an interchange snapshot is being served
    pub loaded: bool,
    pub interchanges: usize,
    pub highways: usize,
    pub built_at: Option<DateTime<Utc>>,
    pub rest_areas: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
