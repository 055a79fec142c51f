//! Filter, sort and paginate over normalized countries.
//!
//! The pipeline order is fixed: filter, then sort, then paginate, so that
//! `total` always counts every matching record.

use std::cmp::Reverse;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::types::{Country, CountryFilter, CountryListResult, CountrySortBy, PaginationParams};

/// Keep the countries matching every predicate set on `filter`.
pub fn apply_filter(countries: Vec<Country>, filter: &CountryFilter) -> Vec<Country> {
  if filter.is_empty() {
    return countries;
  }

  let name = filter.name.as_ref().map(|n| n.to_lowercase());

  countries
    .into_iter()
    .filter(|country| {
      if let Some(name) = &name {
        if !country.name.common.to_lowercase().contains(name.as_str()) {
          return false;
        }
      }
      if let Some(region) = &filter.region {
        if &country.region != region {
          return false;
        }
      }
      if let Some(subregion) = &filter.subregion {
        if country.subregion.as_ref() != Some(subregion) {
          return false;
        }
      }
      if let Some(currency) = &filter.currency {
        if !country.currencies.iter().any(|c| &c.code == currency) {
          return false;
        }
      }
      if let Some(language) = &filter.language {
        if !country.languages.iter().any(|l| l == language) {
          return false;
        }
      }
      true
    })
    .collect()
}

/// Collation key for names: decomposed, accents dropped, lowercased, with
/// the raw text as tie-break.
fn name_key(name: &str) -> (String, String) {
  let folded = name
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
    .collect();
  (folded, name.to_string())
}

/// Stable sort; equal elements keep their input order in both directions.
pub fn apply_sort(mut countries: Vec<Country>, sort_by: Option<CountrySortBy>) -> Vec<Country> {
  let Some(sort_by) = sort_by else {
    return countries;
  };

  match sort_by {
    CountrySortBy::Name => countries.sort_by_cached_key(|c| name_key(&c.name.common)),
    CountrySortBy::NameDesc => countries.sort_by_cached_key(|c| Reverse(name_key(&c.name.common))),
    CountrySortBy::Population => countries.sort_by_key(|c| c.population),
    CountrySortBy::PopulationDesc => countries.sort_by_key(|c| Reverse(c.population)),
  }

  countries
}

/// Slice out one page. `total` is the length before slicing and the
/// requested page/per_page are echoed back even past the end of the data.
pub fn paginate(countries: Vec<Country>, pagination: PaginationParams) -> CountryListResult {
  let total = countries.len();
  let items = countries
    .into_iter()
    .skip(pagination.offset())
    .take(pagination.per_page as usize)
    .collect();

  CountryListResult {
    items,
    total,
    page: pagination.page,
    per_page: pagination.per_page,
  }
}

/// Filter, sort and paginate in that order.
pub fn run_query(
  countries: Vec<Country>,
  filter: Option<&CountryFilter>,
  pagination: PaginationParams,
  sort_by: Option<CountrySortBy>,
) -> CountryListResult {
  let filtered = match filter {
    Some(filter) => apply_filter(countries, filter),
    None => countries,
  };
  let sorted = apply_sort(filtered, sort_by);
  paginate(sorted, pagination)
}
