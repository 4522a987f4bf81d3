use std::error::Error;
use std::sync::Arc;

use tracing::{info, warn};

use restarea_server::config::ServerConfig;
use restarea_server::facilities::{FacilityClient, FacilityClientConfig};
use restarea_server::finder::RestAreaFinder;
use restarea_server::interchanges::{
    CatalogConfig, DiskCache, DiskCacheConfig, DiskCachedSource, FileSource, InterchangeCatalog,
    InterchangeClient, InterchangeClientConfig, InterchangeSource, StaticSource,
};
use restarea_server::pipeline::FilterConfig;
use restarea_server::rest_areas::RestAreaCatalog;
use restarea_server::tables::DirectionTables;
use restarea_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restarea_server=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // Pick the interchange feed
    if let Some(path) = &config.interchange_data {
        info!(path = %path.display(), "using interchange file");
        serve(config.clone(), FileSource::new(path)).await
    } else if let Some(key) = &config.api_key {
        let client = InterchangeClient::new(InterchangeClientConfig::new(key))?;
        let cache = DiskCache::new(
            DiskCacheConfig::new(&config.ic_cache_path).with_ttl(config.ic_cache_ttl),
        );
        serve(config.clone(), DiskCachedSource::new(client, cache)).await
    } else {
        warn!("neither INTERCHANGE_DATA nor HIGHWAY_API_KEY set; highway matching is disabled");
        serve(config, StaticSource::default()).await
    }
}

async fn serve<S: InterchangeSource + 'static>(
    config: ServerConfig,
    source: S,
) -> Result<(), Box<dyn Error>> {
    let tables = Arc::new(DirectionTables::korea()?);

    let catalog_config = CatalogConfig::default();
    let catalog = Arc::new(InterchangeCatalog::new(source, &catalog_config));
    match catalog.load().await {
        Ok(snapshot) => info!(
            interchanges = snapshot.len(),
            highways = snapshot.highway_count(),
            "loaded interchange catalog"
        ),
        Err(e) => warn!(error = %e, "interchange catalog unavailable at startup"),
    }

    // Rebuild at half the TTL so the swap lands before the cached snapshot expires
    let refresh_catalog = Arc::clone(&catalog);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(catalog_config.ttl / 2);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match refresh_catalog.refresh().await {
                Ok(count) => info!(count, "refreshed interchange catalog"),
                Err(e) => warn!(error = %e, "failed to refresh interchange catalog"),
            }
        }
    });

    let rest_areas = match &config.rest_area_data {
        Some(path) => RestAreaCatalog::load(path)?,
        None => {
            warn!("REST_AREA_DATA not set; requests must bring their own candidates");
            RestAreaCatalog::default()
        }
    };

    let finder = RestAreaFinder::new(catalog, tables, FilterConfig::default())?
        .with_catalog_timeout(config.catalog_timeout);
    let mut state = AppState::new(finder, rest_areas);
    if let Some(key) = &config.api_key {
        let client = FacilityClient::new(FacilityClientConfig::new(key))?;
        state = state.with_facilities(client, restarea_server::facilities::DEFAULT_MAX_CONCURRENT);
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "rest-area server listening");
    info!("  GET  /health            - Health check");
    info!("  GET  /catalog/status    - Loaded reference data");
    info!("  POST /route/rest-areas  - Rest areas along a route");

    axum::serve(listener, app).await?;
    Ok(())
}
