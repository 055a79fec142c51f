//! Repository contract and the upstream-backed implementation.

use async_trait::async_trait;
use tracing::debug;

use super::api_types::{normalize, normalize_all};
use super::client::CountryUpstream;
use super::engine::run_query;
use super::types::{
  Country, CountryCode, CountryFilter, CountryListResult, CountrySortBy, PaginationParams,
};
use crate::error::RepositoryResult;

/// Read access to countries.
#[async_trait]
pub trait CountryRepository: Send + Sync {
  /// List countries. Missing pagination means page 1 with 20 items.
  async fn find_all(
    &self,
    filter: Option<&CountryFilter>,
    pagination: Option<PaginationParams>,
    sort_by: Option<CountrySortBy>,
  ) -> RepositoryResult<CountryListResult>;

  /// Look a country up by alpha-2 or alpha-3 code, in any case.
  /// `Ok(None)` means the provider reported it does not exist.
  async fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Country>>;
}

/// Repository that goes to the provider on every call.
pub struct SourceRepository<U> {
  upstream: U,
}

impl<U: CountryUpstream> SourceRepository<U> {
  pub fn new(upstream: U) -> Self {
    Self { upstream }
  }

  pub fn upstream(&self) -> &U {
    &self.upstream
  }
}

#[async_trait]
impl<U: CountryUpstream> CountryRepository for SourceRepository<U> {
  async fn find_all(
    &self,
    filter: Option<&CountryFilter>,
    pagination: Option<PaginationParams>,
    sort_by: Option<CountrySortBy>,
  ) -> RepositoryResult<CountryListResult> {
    let pagination = pagination.unwrap_or_default();
    pagination.validate()?;

    let raw = self.upstream.fetch_all().await?;
    let countries = normalize_all(raw)?;
    let fetched = countries.len();

    let result = run_query(countries, filter, pagination, sort_by);
    debug!(fetched, matched = result.total, "listed countries");

    Ok(result)
  }

  async fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Country>> {
    let code = CountryCode::parse(code)?;

    match self.upstream.fetch_by_code(&code).await? {
      Some(raw) => Ok(Some(normalize(raw)?)),
      None => {
        debug!(%code, "country not found upstream");
        Ok(None)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{NormalizationError, RepositoryError, ValidationError};
  use crate::test_support::{api_record, brazil, germany, portugal, united_states, FakeUpstream};
  use serde_json::json;

  fn repository(countries: Vec<Country>) -> SourceRepository<FakeUpstream> {
    SourceRepository::new(FakeUpstream::new(countries.iter().map(api_record).collect()))
  }

  #[tokio::test]
  async fn test_find_all_defaults() {
    let countries: Vec<Country> = (0..25)
      .map(|i| crate::test_support::country("XX", "XXX", &format!("C{}", i), i))
      .collect();
    let repo = repository(countries);

    let result = repo.find_all(None, None, None).await.unwrap();
    assert_eq!(result.items.len(), 20);
    assert_eq!(result.total, 25);
    assert_eq!(result.page, 1);
    assert_eq!(result.per_page, 20);
  }

  #[tokio::test]
  async fn test_find_all_population_desc_scenario() {
    let repo = repository(vec![brazil(), united_states(), portugal()]);

    let result = repo
      .find_all(
        None,
        Some(PaginationParams::new(1, 2)),
        Some(CountrySortBy::PopulationDesc),
      )
      .await
      .unwrap();

    let populations: Vec<u64> = result.items.iter().map(|c| c.population).collect();
    assert_eq!(populations, vec![329484123, 212559417]);
    assert_eq!(result.total, 3);
  }

  #[tokio::test]
  async fn test_find_all_region_scenario() {
    let repo = repository(vec![brazil(), germany(), united_states()]);
    let filter = CountryFilter::default().with_region("Europe");

    let result = repo.find_all(Some(&filter), None, None).await.unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].code2, "DE");
  }

  #[tokio::test]
  async fn test_invalid_pagination_skips_upstream() {
    let repo = repository(vec![brazil()]);

    let err = repo
      .find_all(None, Some(PaginationParams::new(1, 0)), None)
      .await
      .unwrap_err();
    assert_eq!(
      err,
      RepositoryError::Validation(ValidationError::InvalidPerPage(0))
    );
    assert_eq!(repo.upstream().calls(), 0);
  }

  #[tokio::test]
  async fn test_find_by_code_is_case_insensitive() {
    let repo = repository(vec![brazil(), united_states()]);

    let lower = repo.find_by_code("br").await.unwrap().unwrap();
    let alpha3 = repo.find_by_code(" usa ").await.unwrap().unwrap();
    assert_eq!(lower.code3, "BRA");
    assert_eq!(alpha3.code2, "US");
    assert_eq!(repo.upstream().requested_codes(), vec!["BR", "USA"]);
  }

  #[tokio::test]
  async fn test_find_by_code_not_found_is_none() {
    let repo = repository(vec![brazil()]);
    assert_eq!(repo.find_by_code("XX").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_blank_code_is_rejected() {
    let repo = repository(vec![brazil()]);
    assert_eq!(
      repo.find_by_code("  ").await.unwrap_err(),
      RepositoryError::Validation(ValidationError::EmptyCode)
    );
    assert_eq!(repo.upstream().calls(), 0);
  }

  #[tokio::test]
  async fn test_upstream_error_propagates() {
    let repo = SourceRepository::new(FakeUpstream::failing("connection refused"));

    let err = repo.find_all(None, None, None).await.unwrap_err();
    assert_eq!(err, RepositoryError::upstream("connection refused"));

    let err = repo.find_by_code("BR").await.unwrap_err();
    assert_eq!(err, RepositoryError::upstream("connection refused"));
  }

  #[tokio::test]
  async fn test_bad_record_fails_the_listing() {
    let mut records = vec![api_record(&brazil())];
    records.push(json!({ "cca2": "ZZ", "cca3": "ZZZ" }));
    let repo = SourceRepository::new(FakeUpstream::new(records));

    let err = repo.find_all(None, None, None).await.unwrap_err();
    assert!(matches!(
      err,
      RepositoryError::Normalization(NormalizationError::MissingField { field: "name", .. })
    ));
  }
}
