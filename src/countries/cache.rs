//! Cache keys for country queries.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::types::{CountryCode, CountryFilter, CountrySortBy, PaginationParams};
use crate::cache::QueryKey;

/// Query key types for repository calls.
///
/// Construct through [`CountryQueryKey::list`] and [`CountryQueryKey::by_code`]
/// so equivalent requests collapse to the same key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CountryQueryKey {
  /// Filtered, sorted, paginated listing
  List {
    filter: Option<CountryFilter>,
    pagination: PaginationParams,
    sort_by: Option<CountrySortBy>,
  },
  /// Single country lookup
  ByCode { code: CountryCode },
}

impl CountryQueryKey {
  /// An empty filter is the same request as no filter, and missing
  /// pagination is the same request as the default page.
  pub fn list(
    filter: Option<&CountryFilter>,
    pagination: Option<PaginationParams>,
    sort_by: Option<CountrySortBy>,
  ) -> Self {
    Self::List {
      filter: filter.filter(|f| !f.is_empty()).cloned(),
      pagination: pagination.unwrap_or_default(),
      sort_by,
    }
  }

  pub fn by_code(code: CountryCode) -> Self {
    Self::ByCode { code }
  }

  /// Pre-hash form: operation prefix plus parameters as JSON with sorted keys.
  pub fn canonical(&self) -> String {
    match self {
      Self::List {
        filter,
        pagination,
        sort_by,
      } => format!(
        "country:all:{}",
        canonical_json(json!({
          "filter": filter,
          "pagination": pagination,
          "sortBy": sort_by,
        }))
      ),
      Self::ByCode { code } => format!("country:code:{}", canonical_json(json!({ "code": code }))),
    }
  }
}

impl QueryKey for CountryQueryKey {
  fn cache_hash(&self) -> String {
    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::List {
        filter,
        pagination,
        sort_by,
      } => {
        let mut parts = Vec::new();
        if let Some(f) = filter {
          let predicates = [
            ("name", &f.name),
            ("region", &f.region),
            ("subregion", &f.subregion),
            ("currency", &f.currency),
            ("language", &f.language),
          ];
          for (field, value) in predicates {
            if let Some(v) = value {
              parts.push(format!("{}={}", field, v));
            }
          }
        }
        if let Some(s) = sort_by {
          parts.push(format!("sort={}", s));
        }
        parts.push(format!("page={}/{}", pagination.page, pagination.per_page));
        format!("countries [{}]", parts.join(", "))
      }
      Self::ByCode { code } => format!("country {}", code),
    }
  }
}

/// Serialize with object keys sorted at every level.
fn canonical_json(value: Value) -> String {
  sort_keys(value).to_string()
}

fn sort_keys(value: Value) -> Value {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(String, Value)> = map.into_iter().collect();
      entries.sort_by(|(a, _), (b, _)| a.cmp(b));
      Value::Object(
        entries
          .into_iter()
          .map(|(k, v)| (k, sort_keys(v)))
          .collect::<Map<String, Value>>(),
      )
    }
    Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
    other => other,
  }
}
