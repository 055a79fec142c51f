//! Canonical country record and the request/result shapes around it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Normalized country record.
///
/// `None` means the provider did not supply the value; an empty string is
/// kept as an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
  pub code2: String,
  pub code3: String,
  pub name: CountryName,
  pub capital: Option<String>,
  pub region: String,
  pub subregion: Option<String>,
  pub population: u64,
  pub area: Option<f64>,
  pub currencies: Vec<Currency>,
  pub languages: Vec<String>,
  pub timezones: Vec<String>,
  pub flags: Option<Flags>,
  pub maps: Option<Maps>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryName {
  pub common: String,
  pub official: String,
  pub native: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
  pub code: String,
  pub name: Option<String>,
  pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
  pub svg: Option<String>,
  pub png: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maps {
  pub google_maps: Option<String>,
  pub open_street_maps: Option<String>,
}

/// Optional predicates combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountryFilter {
  /// Case-insensitive substring of the common name
  pub name: Option<String>,
  pub region: Option<String>,
  pub subregion: Option<String>,
  /// Currency code, matched against any entry
  pub currency: Option<String>,
  /// Language name, matched against any entry
  pub language: Option<String>,
}

impl CountryFilter {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.region.is_none()
      && self.subregion.is_none()
      && self.currency.is_none()
      && self.language.is_none()
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_region(mut self, region: impl Into<String>) -> Self {
    self.region = Some(region.into());
    self
  }

  pub fn with_subregion(mut self, subregion: impl Into<String>) -> Self {
    self.subregion = Some(subregion.into());
    self
  }

  pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
    self.currency = Some(currency.into());
    self
  }

  pub fn with_language(mut self, language: impl Into<String>) -> Self {
    self.language = Some(language.into());
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
  pub page: u32,
  pub per_page: u32,
}

impl Default for PaginationParams {
  fn default() -> Self {
    Self {
      page: DEFAULT_PAGE,
      per_page: DEFAULT_PER_PAGE,
    }
  }
}

impl PaginationParams {
  pub fn new(page: u32, per_page: u32) -> Self {
    Self { page, per_page }
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.page < 1 {
      return Err(ValidationError::InvalidPage(self.page));
    }
    if self.per_page < 1 || self.per_page > MAX_PER_PAGE {
      return Err(ValidationError::InvalidPerPage(self.per_page));
    }
    Ok(())
  }

  /// Index of the first item on this page, saturating at `usize::MAX`.
  pub fn offset(&self) -> usize {
    let offset = u64::from(self.page.saturating_sub(1)).saturating_mul(u64::from(self.per_page));
    usize::try_from(offset).unwrap_or(usize::MAX)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountrySortBy {
  Name,
  NameDesc,
  Population,
  PopulationDesc,
}

impl CountrySortBy {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Name => "name",
      Self::NameDesc => "name_desc",
      Self::Population => "population",
      Self::PopulationDesc => "population_desc",
    }
  }
}

impl fmt::Display for CountrySortBy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for CountrySortBy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "name" => Ok(Self::Name),
      "name_desc" => Ok(Self::NameDesc),
      "population" => Ok(Self::Population),
      "population_desc" => Ok(Self::PopulationDesc),
      other => Err(format!(
        "unknown sort order '{}' (expected name, name_desc, population or population_desc)",
        other
      )),
    }
  }
}

/// One page of a filtered, sorted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryListResult {
  pub items: Vec<Country>,
  /// Matching records before pagination
  pub total: usize,
  pub page: u32,
  pub per_page: u32,
}

/// A trimmed, uppercased lookup code (alpha-2 or alpha-3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
  pub fn parse(raw: &str) -> Result<Self, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(ValidationError::EmptyCode);
    }
    Ok(Self(trimmed.to_uppercase()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CountryCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pagination_bounds() {
    assert!(PaginationParams::default().validate().is_ok());
    assert!(PaginationParams::new(3, 100).validate().is_ok());
    assert_eq!(
      PaginationParams::new(0, 20).validate(),
      Err(ValidationError::InvalidPage(0))
    );
    assert_eq!(
      PaginationParams::new(1, 0).validate(),
      Err(ValidationError::InvalidPerPage(0))
    );
    assert_eq!(
      PaginationParams::new(1, 101).validate(),
      Err(ValidationError::InvalidPerPage(101))
    );
  }

  #[test]
  fn test_offset() {
    assert_eq!(PaginationParams::new(1, 20).offset(), 0);
    assert_eq!(PaginationParams::new(3, 10).offset(), 20);
    assert_eq!(PaginationParams::new(0, 20).offset(), 0);
  }

  #[test]
  fn test_offset_for_huge_page_does_not_overflow() {
    let params = PaginationParams::new(u32::MAX, MAX_PER_PAGE);
    let expected = (u64::from(u32::MAX) - 1) * u64::from(MAX_PER_PAGE);
    assert_eq!(params.offset(), usize::try_from(expected).unwrap_or(usize::MAX));
  }

  #[test]
  fn test_country_code_normalization() {
    assert_eq!(CountryCode::parse(" br ").unwrap().as_str(), "BR");
    assert_eq!(CountryCode::parse("usa").unwrap().as_str(), "USA");
    assert_eq!(CountryCode::parse("   "), Err(ValidationError::EmptyCode));
    assert_eq!(CountryCode::parse(""), Err(ValidationError::EmptyCode));
  }

  #[test]
  fn test_sort_by_round_trips_through_str() {
    for sort in [
      CountrySortBy::Name,
      CountrySortBy::NameDesc,
      CountrySortBy::Population,
      CountrySortBy::PopulationDesc,
    ] {
      assert_eq!(sort.as_str().parse::<CountrySortBy>(), Ok(sort));
      assert_eq!(
        serde_json::to_value(sort).unwrap(),
        serde_json::json!(sort.as_str())
      );
    }
    assert!("populacao".parse::<CountrySortBy>().is_err());
  }

  #[test]
  fn test_filter_is_empty() {
    assert!(CountryFilter::default().is_empty());
    assert!(!CountryFilter::default().with_region("Europe").is_empty());
  }

  #[test]
  fn test_list_result_uses_camel_case() {
    let result = CountryListResult {
      items: vec![],
      total: 0,
      page: 1,
      per_page: 20,
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["perPage"], 20);
  }
}
