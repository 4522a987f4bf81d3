//! Highway interchange catalog.
//!
//! Interchanges are fetched from the Korea Expressway Corporation feed (or a
//! local file), turned into per-carriageway entries with ordering weights,
//! and cached as an immutable snapshot with a TTL.

mod cache;
mod catalog;
mod client;
mod error;
mod source;

pub use cache::{DiskCache, DiskCacheConfig};
pub use catalog::{
    CatalogConfig, CatalogSnapshot, InterchangeCatalog, NearbyInterchange, build_entries,
};
pub use client::{InterchangeClient, InterchangeClientConfig, RawInterchange};
pub use error::CatalogError;
pub use source::{DiskCachedSource, FileSource, InterchangeSource, StaticSource};

#[cfg(test)]
pub(crate) use catalog::fixtures;
#[cfg(test)]
pub(crate) use source::testing;
