//! Disk-based cache for the raw interchange feed.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::client::RawInterchange;
use super::error::CatalogError;

/// Default cache TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached feed with metadata.
#[derive(Debug, Serialize, Deserialize)]
struct CachedInterchanges {
    /// Unix timestamp when the cache was written.
    cached_at_secs: u64,
    interchanges: Vec<RawInterchange>,
}

/// Configuration for the interchange disk cache.
#[derive(Debug, Clone)]
pub struct DiskCacheConfig {
    /// Path to the cache file.
    pub path: PathBuf,
    /// How long the cache remains valid.
    pub ttl: Duration,
}

impl DiskCacheConfig {
    /// Create a new cache config with the given path and default TTL (24 hours).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self::new("interchanges_cache.json")
    }
}

/// Disk cache for the interchange feed.
#[derive(Debug, Clone)]
pub struct DiskCache {
    config: DiskCacheConfig,
}

impl DiskCache {
    pub fn new(config: DiskCacheConfig) -> Self {
        Self { config }
    }

    /// Load the cached feed if it exists and has not expired.
    pub fn load(&self) -> Option<Vec<RawInterchange>> {
        let cached = self.read()?;
        let age_secs = now_secs().ok()?.saturating_sub(cached.cached_at_secs);
        if age_secs >= self.config.ttl.as_secs() {
            return None;
        }
        Some(cached.interchanges)
    }

    /// Load the cached feed regardless of its age.
    ///
    /// Used as a last resort when the live feed is unreachable.
    pub fn load_stale(&self) -> Option<Vec<RawInterchange>> {
        self.read().map(|c| c.interchanges)
    }

    fn read(&self) -> Option<CachedInterchanges> {
        let contents = std::fs::read_to_string(&self.config.path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Save the feed, creating parent directories if needed.
    pub fn save(&self, interchanges: &[RawInterchange]) -> Result<(), CatalogError> {
        let cached = CachedInterchanges {
            cached_at_secs: now_secs()?,
            interchanges: interchanges.to_vec(),
        };

        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::Cache {
                message: format!("failed to create cache directory: {}", e),
            })?;
        }

        let json = serde_json::to_string(&cached).map_err(|e| CatalogError::Cache {
            message: format!("failed to serialize cache: {}", e),
        })?;

        std::fs::write(&self.config.path, json).map_err(|e| CatalogError::Cache {
            message: format!("failed to write cache file: {}", e),
        })?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

fn now_secs() -> Result<u64, CatalogError> {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| CatalogError::Cache {
            message: "system time before unix epoch".to_string(),
        })
}
