//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

use crate::error::CacheError;

/// A request that can be cached.
///
/// Two logically identical requests must produce the same `cache_hash`,
/// and requests differing in any parameter must produce different ones.
pub trait QueryKey {
  /// Stable, fixed-length key used by the storage backend.
  fn cache_hash(&self) -> String;

  /// Human readable form for logs.
  fn description(&self) -> String;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from freshly fetched data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from the source repository on this call
  Network,
  /// Served from a live cache entry
  Cache,
}

/// Outcome of reading a key from the cache.
///
/// `Unavailable` is handled like `Miss`, except that the fetched value
/// is not written back.
#[derive(Debug)]
pub enum CacheLookup<T> {
  Hit { data: T, cached_at: DateTime<Utc> },
  Miss,
  Unavailable(CacheError),
}
