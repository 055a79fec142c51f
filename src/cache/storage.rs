//! Cache storage trait and in-memory TTL implementation.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::error::{CacheError, StorageResult};

/// A single live cache entry.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// Serialized JSON value
  pub data: Vec<u8>,
  /// When the entry was stored
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Backends store opaque serialized values; (de)serialization is the
/// caller's concern. Expired entries must never be returned.
pub trait CacheStorage: Send + Sync {
  /// Get a live entry by key.
  fn get(&self, key: &str) -> StorageResult<Option<CachedEntry>>;

  /// Store an entry that expires after `ttl`.
  fn set(&self, key: &str, data: Vec<u8>, ttl: Duration) -> StorageResult<()>;

  /// Remove a single entry. Returns whether a live entry was removed.
  fn remove(&self, key: &str) -> StorageResult<bool>;

  /// Remove every entry.
  fn flush(&self) -> StorageResult<()>;

  /// Keys of all live entries.
  fn keys(&self) -> StorageResult<Vec<String>>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> StorageResult<Option<CachedEntry>> {
    Ok(None) // Always miss
  }

  fn set(&self, _key: &str, _data: Vec<u8>, _ttl: Duration) -> StorageResult<()> {
    Ok(()) // Discard
  }

  fn remove(&self, _key: &str) -> StorageResult<bool> {
    Ok(false)
  }

  fn flush(&self) -> StorageResult<()> {
    Ok(())
  }

  fn keys(&self) -> StorageResult<Vec<String>> {
    Ok(Vec::new())
  }
}

#[derive(Debug, Clone)]
struct StoredEntry {
  data: Vec<u8>,
  cached_at: DateTime<Utc>,
  expires_at: DateTime<Utc>,
}

impl StoredEntry {
  fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now >= self.expires_at
  }
}

/// How often a write also drops expired entries under other keys.
pub const DEFAULT_SWEEP_INTERVAL_SECS: i64 = 60;

struct Entries {
  map: HashMap<String, StoredEntry>,
  last_sweep: DateTime<Utc>,
}

impl Entries {
  fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
    let before = self.map.len();
    self.map.retain(|_, entry| !entry.is_expired(now));
    self.last_sweep = now;
    before - self.map.len()
  }
}

/// Process-local cache with per-entry expiry.
///
/// Expired entries are dropped when read, by a sweep piggybacked on writes
/// at most once per sweep interval, or by [`MemoryStorage::purge_expired`].
/// Nothing survives a restart.
pub struct MemoryStorage {
  entries: Mutex<Entries>,
  sweep_interval: Duration,
}

impl Default for MemoryStorage {
  fn default() -> Self {
    Self {
      entries: Mutex::new(Entries {
        map: HashMap::new(),
        last_sweep: Utc::now(),
      }),
      sweep_interval: Duration::seconds(DEFAULT_SWEEP_INTERVAL_SECS),
    }
  }
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the minimum time between write-time sweeps. Zero sweeps on every write.
  pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
    self.sweep_interval = interval;
    self
  }

  fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Entries>> {
    self
      .entries
      .lock()
      .map_err(|e| CacheError::Poisoned(e.to_string()))
  }

  /// Drop every expired entry. Returns how many were removed.
  pub fn purge_expired(&self) -> StorageResult<usize> {
    Ok(self.lock()?.purge_expired(Utc::now()))
  }

  /// Entries held in memory, including expired ones not yet dropped.
  pub fn stored_count(&self) -> StorageResult<usize> {
    Ok(self.lock()?.map.len())
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> StorageResult<Option<CachedEntry>> {
    let mut entries = self.lock()?;
    let now = Utc::now();

    match entries.map.get(key) {
      Some(entry) if entry.is_expired(now) => {
        entries.map.remove(key);
        Ok(None)
      }
      Some(entry) => Ok(Some(CachedEntry {
        data: entry.data.clone(),
        cached_at: entry.cached_at,
      })),
      None => Ok(None),
    }
  }

  fn set(&self, key: &str, data: Vec<u8>, ttl: Duration) -> StorageResult<()> {
    let mut entries = self.lock()?;
    let cached_at = Utc::now();

    if cached_at - entries.last_sweep >= self.sweep_interval {
      let removed = entries.purge_expired(cached_at);
      if removed > 0 {
        debug!(removed, "swept expired cache entries");
      }
    }

    // Last writer wins
    entries.map.insert(
      key.to_string(),
      StoredEntry {
        data,
        cached_at,
        expires_at: cached_at + ttl,
      },
    );

    Ok(())
  }

  fn remove(&self, key: &str) -> StorageResult<bool> {
    let mut entries = self.lock()?;
    let now = Utc::now();
    Ok(matches!(entries.map.remove(key), Some(entry) if !entry.is_expired(now)))
  }

  fn flush(&self) -> StorageResult<()> {
    self.lock()?.map.clear();
    Ok(())
  }

  fn keys(&self) -> StorageResult<Vec<String>> {
    let entries = self.lock()?;
    let now = Utc::now();
    let mut keys: Vec<String> = entries
      .map
      .iter()
      .filter(|(_, entry)| !entry.is_expired(now))
      .map(|(key, _)| key.clone())
      .collect();
    keys.sort();
    Ok(keys)
  }
}
