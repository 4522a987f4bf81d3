//! Per-rest-area facility details.
//!
//! Enrichment runs after filtering and never fails a request: a rest area
//! whose lookup fails is returned without details.

mod client;
mod error;

use std::future::Future;

use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use tracing::{info, warn};

use crate::pipeline::FilterResult;

pub use client::{Facility, FacilityClient, FacilityClientConfig};
pub use error::FacilityError;

/// Default number of lookups in flight.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Upper bound on lookups in flight.
const MAX_CONCURRENT_LIMIT: usize = 5;

/// Trait for looking up facilities by rest-area code.
pub trait FacilityLookup: Send + Sync {
    fn facilities(
        &self,
        rest_area_code: &str,
    ) -> impl Future<Output = Result<Vec<Facility>, FacilityError>> + Send;
}

impl FacilityLookup for FacilityClient {
    async fn facilities(&self, rest_area_code: &str) -> Result<Vec<Facility>, FacilityError> {
        self.fetch(rest_area_code).await
    }
}

/// A filter result with facility details attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub result: FilterResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_details: Option<Vec<Facility>>,
}

impl From<FilterResult> for EnrichedResult {
    fn from(result: FilterResult) -> Self {
        Self {
            result,
            facility_details: None,
        }
    }
}

/// Look up facilities for every result, at most `max_concurrent` at a time
/// (clamped to 1–5). Order is preserved.
pub async fn enrich<L: FacilityLookup>(
    results: Vec<FilterResult>,
    lookup: &L,
    max_concurrent: usize,
) -> Vec<EnrichedResult> {
    let limit = max_concurrent.clamp(1, MAX_CONCURRENT_LIMIT);
    let total = results.len();

    let enriched: Vec<EnrichedResult> = stream::iter(results)
        .map(|result| async move {
            let facility_details = match lookup.facilities(&result.candidate.id).await {
                Ok(facilities) => Some(facilities),
                Err(e) => {
                    warn!(id = %result.candidate.id, error = %e, "facility lookup failed");
                    None
                }
            };
            EnrichedResult {
                result,
                facility_details,
            }
        })
        .buffered(limit)
        .collect()
        .await;

    let found = enriched.iter().filter(|r| r.facility_details.is_some()).count();
    info!(total, found, "enriched rest areas with facilities");
    enriched
}
