//! Generic caching layer for query results.
//!
//! This module provides a domain-agnostic cache-aside mechanism that:
//! - Stores serialized results under a canonical query hash
//! - Expires entries after a configurable time-to-live
//! - Falls back to the fetcher when the backend cannot be read
//!
//! Entries live in process memory only.

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, CachedEntry, MemoryStorage, NoopStorage};
pub use traits::{CacheLookup, CacheResult, CacheSource, QueryKey};
