//! Cache-aside repository that wraps any CountryRepository with transparent caching.

use async_trait::async_trait;

use crate::cache::{CacheLayer, CacheStorage};
use crate::error::{RepositoryResult, StorageResult};

use super::cache::CountryQueryKey;
use super::repository::CountryRepository;
use super::types::{
  Country, CountryCode, CountryFilter, CountryListResult, CountrySortBy, PaginationParams,
};

/// Country repository with a read-through cache.
///
/// Results, including "not found", are stored for the layer's TTL. Errors
/// from the wrapped repository are passed through and never stored.
pub struct CachedCountryRepository<R, S: CacheStorage> {
  inner: R,
  cache: CacheLayer<S>,
}

impl<R: CountryRepository, S: CacheStorage> CachedCountryRepository<R, S> {
  pub fn new(inner: R, cache: CacheLayer<S>) -> Self {
    Self { inner, cache }
  }

  pub fn inner(&self) -> &R {
    &self.inner
  }

  pub fn cache(&self) -> &CacheLayer<S> {
    &self.cache
  }

  /// Drop the cached listing for these parameters.
  pub fn invalidate_list(
    &self,
    filter: Option<&CountryFilter>,
    pagination: Option<PaginationParams>,
    sort_by: Option<CountrySortBy>,
  ) -> StorageResult<bool> {
    self
      .cache
      .invalidate(&CountryQueryKey::list(filter, pagination, sort_by))
  }

  /// Drop the cached lookup for a code. Blank codes were never cached.
  pub fn invalidate_code(&self, code: &str) -> StorageResult<bool> {
    match CountryCode::parse(code) {
      Ok(code) => self.cache.invalidate(&CountryQueryKey::by_code(code)),
      Err(_) => Ok(false),
    }
  }

  /// Drop every cached result.
  pub fn flush(&self) -> StorageResult<()> {
    self.cache.flush()
  }

  /// Hashed keys of all live entries.
  pub fn cached_keys(&self) -> StorageResult<Vec<String>> {
    self.cache.keys()
  }
}

#[async_trait]
impl<R: CountryRepository, S: CacheStorage> CountryRepository for CachedCountryRepository<R, S> {
  async fn find_all(
    &self,
    filter: Option<&CountryFilter>,
    pagination: Option<PaginationParams>,
    sort_by: Option<CountrySortBy>,
  ) -> RepositoryResult<CountryListResult> {
    if let Some(p) = &pagination {
      p.validate()?;
    }

    let key = CountryQueryKey::list(filter, pagination, sort_by);
    let result = self
      .cache
      .fetch(&key, || self.inner.find_all(filter, pagination, sort_by))
      .await?;

    Ok(result.data)
  }

  async fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Country>> {
    let code = CountryCode::parse(code)?;
    let key = CountryQueryKey::by_code(code.clone());
    let result = self
      .cache
      .fetch(&key, || self.inner.find_by_code(code.as_str()))
      .await?;

    Ok(result.data)
  }
}
