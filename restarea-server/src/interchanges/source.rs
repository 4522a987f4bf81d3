//! Where raw interchange records come from.

use std::future::Future;
use std::path::PathBuf;

use tracing::warn;

use super::cache::DiskCache;
use super::client::{InterchangeClient, RawInterchange};
use super::error::CatalogError;

/// Trait for providing the raw interchange feed.
///
/// This abstraction lets the catalog be tested and run offline with
/// fixed data.
pub trait InterchangeSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Vec<RawInterchange>, CatalogError>> + Send;
}

impl InterchangeSource for InterchangeClient {
    async fn fetch(&self) -> Result<Vec<RawInterchange>, CatalogError> {
        self.fetch_all().await
    }
}

/// Feed read from a JSON array on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InterchangeSource for FileSource {
    async fn fetch(&self) -> Result<Vec<RawInterchange>, CatalogError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&contents).map_err(|e| CatalogError::Json {
            message: format!("{}: {}", self.path.display(), e),
        })
    }
}

/// Fixed in-memory feed.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    rows: Vec<RawInterchange>,
}

impl StaticSource {
    pub fn new(rows: Vec<RawInterchange>) -> Self {
        Self { rows }
    }
}

impl InterchangeSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<RawInterchange>, CatalogError> {
        Ok(self.rows.clone())
    }
}

/// Wraps a source with an on-disk copy of its last successful fetch.
///
/// A fresh disk copy is returned without touching the inner source. When
/// the inner source fails, an expired disk copy is served instead of the
/// error.
#[derive(Debug, Clone)]
pub struct DiskCachedSource<S> {
    inner: S,
    cache: DiskCache,
}

impl<S> DiskCachedSource<S> {
    pub fn new(inner: S, cache: DiskCache) -> Self {
        Self { inner, cache }
    }
}

impl<S: InterchangeSource> InterchangeSource for DiskCachedSource<S> {
    async fn fetch(&self) -> Result<Vec<RawInterchange>, CatalogError> {
        if let Some(rows) = self.cache.load() {
            return Ok(rows);
        }

        match self.inner.fetch().await {
            Ok(rows) => {
                if let Err(e) = self.cache.save(&rows) {
                    warn!(path = %self.cache.path().display(), error = %e, "failed to write interchange cache");
                }
                Ok(rows)
            }
            Err(e) => match self.cache.load_stale() {
                Some(rows) => {
                    warn!(error = %e, "interchange feed unavailable, serving expired disk cache");
                    Ok(rows)
                }
                None => Err(e),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{CountingSource, raw};
    use super::*;
    use crate::interchanges::DiskCacheConfig;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_source_reads_json_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ics.json");
        let rows = vec![raw("101", "0010", "경부선", 37.4, 127.0, 0.0)];
        std::fs::write(&path, serde_json::to_string(&rows).unwrap()).unwrap();

        let loaded = FileSource::new(&path).fetch().await.unwrap();
        assert_eq!(loaded, rows);
    }

    #[tokio::test]
    async fn file_source_missing_file() {
        let err = FileSource::new("/nonexistent/ics.json").fetch().await.unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }

    #[tokio::test]
    async fn disk_cached_source_uses_fresh_cache() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(DiskCacheConfig::new(dir.path().join("ic.json")));
        let inner = CountingSource::new(vec![raw("101", "0010", "경부선", 37.4, 127.0, 0.0)]);
        let source = DiskCachedSource::new(inner, cache);

        assert_eq!(source.fetch().await.unwrap().len(), 1);
        assert_eq!(source.fetch().await.unwrap().len(), 1);
        assert_eq!(source.inner.calls(), 1);
    }

    #[tokio::test]
    async fn disk_cached_source_falls_back_to_stale_copy() {
        let dir = tempdir().unwrap();
        let config = DiskCacheConfig::new(dir.path().join("ic.json")).with_ttl(Duration::ZERO);
        let inner = CountingSource::new(vec![raw("101", "0010", "경부선", 37.4, 127.0, 0.0)]);
        let source = DiskCachedSource::new(inner, DiskCache::new(config));

        assert_eq!(source.fetch().await.unwrap().len(), 1);
        source.inner.set_failing(true);
        assert_eq!(source.fetch().await.unwrap().len(), 1);
        assert_eq!(source.inner.calls(), 2);
    }

    #[tokio::test]
    async fn disk_cached_source_without_cache_propagates_error() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::new(DiskCacheConfig::new(dir.path().join("ic.json")));
        let inner = CountingSource::default();
        inner.set_failing(true);
        let source = DiskCachedSource::new(inner, cache);

        assert!(source.fetch().await.is_err());
    }
}
