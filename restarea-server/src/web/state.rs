//! Application state for the web layer.

use std::sync::Arc;

use crate::facilities::FacilityClient;
use crate::finder::RestAreaFinder;
use crate::rest_areas::RestAreaCatalog;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<S> {
    /// Catalog-backed rest-area finder
    pub finder: Arc<RestAreaFinder<S>>,

    /// Rest areas filtered when a request brings none
    pub rest_areas: Arc<RestAreaCatalog>,

    /// Facility lookups, when an API key is configured
    pub facilities: Option<Arc<FacilityClient>>,

    /// Facility lookups in flight per request
    pub facility_concurrency: usize,
}

impl<S> AppState<S> {
    /// Create a new app state.
    pub fn new(finder: RestAreaFinder<S>, rest_areas: RestAreaCatalog) -> Self {
        Self {
            finder: Arc::new(finder),
            rest_areas: Arc::new(rest_areas),
            facilities: None,
            facility_concurrency: crate::facilities::DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn with_facilities(mut self, client: FacilityClient, max_concurrent: usize) -> Self {
        self.facilities = Some(Arc::new(client));
        self.facility_concurrency = max_concurrent;
        self
    }
}

// Manual impl: the source type itself need not be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            finder: Arc::clone(&self.finder),
            rest_areas: Arc::clone(&self.rest_areas),
            facilities: self.facilities.clone(),
            facility_concurrency: self.facility_concurrency,
        }
    }
}
