//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::finder::DEFAULT_CATALOG_TIMEOUT;

const DEFAULT_IC_CACHE_PATH: &str = "interchanges_cache.json";
const DEFAULT_IC_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{var}={value:?}: {reason}")]
pub struct ServerConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Settings for the server binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `HIGHWAY_API_KEY`; used for interchange and facility lookups
    pub api_key: Option<String>,
    /// `INTERCHANGE_DATA`; a JSON interchange feed used instead of the API
    pub interchange_data: Option<PathBuf>,
    /// `REST_AREA_DATA`; the rest-area candidate catalog
    pub rest_area_data: Option<PathBuf>,
    /// `IC_CACHE_PATH`
    pub ic_cache_path: PathBuf,
    /// `IC_CACHE_TTL_SECS`
    pub ic_cache_ttl: Duration,
    /// `CATALOG_TIMEOUT_SECS`
    pub catalog_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => v.parse().map_err(|e: std::net::AddrParseError| ServerConfigError {
                var: "BIND_ADDR",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        Ok(Self {
            bind_addr,
            api_key: get("HIGHWAY_API_KEY"),
            interchange_data: get("INTERCHANGE_DATA").map(PathBuf::from),
            rest_area_data: get("REST_AREA_DATA").map(PathBuf::from),
            ic_cache_path: get("IC_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IC_CACHE_PATH)),
            ic_cache_ttl: secs("IC_CACHE_TTL_SECS", get("IC_CACHE_TTL_SECS"))?
                .unwrap_or(DEFAULT_IC_CACHE_TTL),
            catalog_timeout: secs("CATALOG_TIMEOUT_SECS", get("CATALOG_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_CATALOG_TIMEOUT),
        })
    }
}

fn secs(var: &'static str, value: Option<String>) -> Result<Option<Duration>, ServerConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ServerConfigError {
                    var,
                    value: v.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}
