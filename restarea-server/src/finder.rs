//! Rest-area lookup service: catalog loading plus the filter pipeline.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::domain::{Coordinate, RestAreaCandidate, RouteError};
use crate::interchanges::{CatalogError, CatalogSnapshot, InterchangeCatalog, InterchangeSource};
use crate::pipeline::{CandidateFilterPipeline, ConfigError, FilterConfig, FilterOutcome, FilterOverrides};
use crate::tables::DirectionTables;

/// Default time allowed for loading the interchange catalog.
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors the caller can fix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FindError {
    #[error("invalid options: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid route: {0}")]
    Route(#[from] RouteError),
}

/// Finds usable rest areas along a route.
///
/// Owns the shared interchange catalog. A slow or failing catalog never
/// fails a query; the pipeline then runs without interchange data.
pub struct RestAreaFinder<S> {
    catalog: Arc<InterchangeCatalog<S>>,
    tables: Arc<DirectionTables>,
    pipeline: CandidateFilterPipeline,
    catalog_timeout: Duration,
}

impl<S: InterchangeSource> RestAreaFinder<S> {
    pub fn new(
        catalog: Arc<InterchangeCatalog<S>>,
        tables: Arc<DirectionTables>,
        config: FilterConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            pipeline: CandidateFilterPipeline::new(config, Arc::clone(&tables))?,
            catalog,
            tables,
            catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
        })
    }

    pub fn with_catalog_timeout(mut self, timeout: Duration) -> Self {
        self.catalog_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &Arc<InterchangeCatalog<S>> {
        &self.catalog
    }

    pub fn config(&self) -> &FilterConfig {
        self.pipeline.config()
    }

    /// The catalog snapshot.
    ///
    /// If a fresh one cannot be had in time, the last good snapshot is
    /// used, and failing that an empty one.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let loaded = tokio::time::timeout(self.catalog_timeout, self.catalog.load())
            .await
            .unwrap_or_else(|_| Err(Arc::new(CatalogError::Timeout)));

        match loaded {
            Ok(snapshot) => snapshot,
            Err(e) => match self.catalog.current().await {
                Some(snapshot) => {
                    warn!(error = %e, "interchange catalog not ready, using previous snapshot");
                    snapshot
                }
                None => {
                    warn!(error = %e, "interchange catalog unavailable, filtering without it");
                    Arc::new(CatalogSnapshot::empty())
                }
            },
        }
    }

    /// Run the pipeline for one route.
    ///
    /// `overrides` are applied on top of the configured defaults and
    /// validated before any work is done.
    pub async fn find(
        &self,
        route: &[Coordinate],
        hints: &[String],
        candidates: &[RestAreaCandidate],
        overrides: Option<&FilterOverrides>,
    ) -> Result<FilterOutcome, FindError> {
        let custom = overrides
            .map(|o| o.apply(self.pipeline.config()))
            .transpose()?
            .map(|config| CandidateFilterPipeline::new(config, Arc::clone(&self.tables)))
            .transpose()?;
        let pipeline = custom.as_ref().unwrap_or(&self.pipeline);

        let snapshot = self.snapshot().await;
        Ok(pipeline.run(route, hints, candidates, &snapshot)?)
    }
}
