//! Cache layer that orchestrates the cache-aside read path.

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::{CacheLookup, CacheResult, QueryKey};
use crate::error::{CacheError, StorageResult};

/// Cache layer that manages caching logic around a fetcher.
///
/// Backend failures never fail a request: an unreadable cache is
/// treated as a miss and the fetched value is not written back.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// How long a stored entry stays live
  ttl: Duration,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      ttl: Duration::minutes(5),
    }
  }

  /// Set the time-to-live for stored entries.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Read a key, decoding the stored JSON.
  pub fn lookup<T: DeserializeOwned>(&self, hash: &str) -> CacheLookup<T> {
    match self.storage.get(hash) {
      Ok(Some(entry)) => match serde_json::from_slice(&entry.data) {
        Ok(data) => CacheLookup::Hit {
          data,
          cached_at: entry.cached_at,
        },
        Err(e) => CacheLookup::Unavailable(CacheError::Corrupt(e)),
      },
      Ok(None) => CacheLookup::Miss,
      Err(e) => CacheLookup::Unavailable(e),
    }
  }

  fn store<T: Serialize>(&self, hash: &str, data: &T) -> StorageResult<()> {
    let bytes = serde_json::to_vec(data).map_err(CacheError::Encode)?;
    self.storage.set(hash, bytes, self.ttl)
  }

  /// Fetch with cache-aside strategy.
  ///
  /// 1. Check cache - if live, return immediately
  /// 2. On miss, call the fetcher and store its result
  /// 3. If the cache could not be read, call the fetcher and skip the store
  ///
  /// Fetcher errors are returned as-is and never stored.
  pub async fn fetch<K, T, E, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<T>, E>
  where
    K: QueryKey,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let hash = key.cache_hash();

    let writable = match self.lookup::<T>(&hash) {
      CacheLookup::Hit { data, cached_at } => {
        debug!(key = %key.description(), "cache hit");
        return Ok(CacheResult::from_cache(data, cached_at));
      }
      CacheLookup::Miss => {
        debug!(key = %key.description(), "cache miss");
        true
      }
      CacheLookup::Unavailable(err) => {
        warn!(key = %key.description(), error = %err, "cache unavailable, bypassing");
        false
      }
    };

    let data = fetcher().await?;

    if writable {
      if let Err(err) = self.store(&hash, &data) {
        warn!(key = %key.description(), error = %err, "failed to store cache entry");
      }
    }

    Ok(CacheResult::from_network(data))
  }

  /// Remove the entry for a single key.
  pub fn invalidate<K: QueryKey>(&self, key: &K) -> StorageResult<bool> {
    self.storage.remove(&key.cache_hash())
  }

  /// Remove every entry.
  pub fn flush(&self) -> StorageResult<()> {
    self.storage.flush()
  }

  /// Hashes of all live entries.
  pub fn keys(&self) -> StorageResult<Vec<String>> {
    self.storage.keys()
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
    }
  }
}
