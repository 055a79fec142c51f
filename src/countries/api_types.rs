//! Serde-deserializable types matching REST Countries responses.
//!
//! Every field is optional here; `ApiCountry::into_country` is the single
//! place where mandatory fields are enforced and the canonical shape is built.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::types::{Country, CountryName, Currency, Flags, Maps};
use crate::error::NormalizationError;

/// Decode an optional field, reading a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let value = Value::deserialize(deserializer)?;
  Ok(serde_json::from_value(value).ok())
}

// ============================================================================
// Nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiNativeName {
  #[serde(default, deserialize_with = "lenient")]
  pub common: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub official: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiName {
  pub common: Option<String>,
  pub official: Option<String>,
  /// Keyed by language code; which entry is "first" is not meaningful
  #[serde(default, deserialize_with = "lenient")]
  pub native_name: Option<BTreeMap<String, ApiNativeName>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCurrency {
  #[serde(default, deserialize_with = "lenient")]
  pub name: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiFlags {
  #[serde(default, deserialize_with = "lenient")]
  pub svg: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub png: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMaps {
  #[serde(default, deserialize_with = "lenient")]
  pub google_maps: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub open_street_maps: Option<String>,
}

// ============================================================================
// Country record - used by both /all and /alpha endpoints
// ============================================================================

/// Mandatory fields decode strictly; a wrong type there fails the record.
/// Optional fields of the wrong type are read as absent.
#[derive(Debug, Deserialize, Default)]
pub struct ApiCountry {
  pub cca2: Option<String>,
  pub cca3: Option<String>,
  pub name: Option<ApiName>,
  #[serde(default, deserialize_with = "lenient")]
  pub capital: Option<Vec<String>>,
  pub region: Option<String>,
  #[serde(default, deserialize_with = "lenient")]
  pub subregion: Option<String>,
  pub population: Option<serde_json::Number>,
  #[serde(default, deserialize_with = "lenient")]
  pub area: Option<f64>,
  #[serde(default, deserialize_with = "lenient")]
  pub currencies: Option<BTreeMap<String, ApiCurrency>>,
  #[serde(default, deserialize_with = "lenient")]
  pub languages: Option<BTreeMap<String, String>>,
  #[serde(default, deserialize_with = "lenient")]
  pub timezones: Option<Vec<String>>,
  #[serde(default, deserialize_with = "lenient")]
  pub flags: Option<ApiFlags>,
  #[serde(default, deserialize_with = "lenient")]
  pub maps: Option<ApiMaps>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiCountry {
  /// Best available identifier for error messages.
  fn label(&self) -> String {
    self
      .cca3
      .as_deref()
      .or(self.cca2.as_deref())
      .unwrap_or("<unknown>")
      .to_string()
  }

  pub fn into_country(self) -> Result<Country, NormalizationError> {
    let record = self.label();
    let missing = |field: &'static str| NormalizationError::MissingField {
      field,
      record: record.clone(),
    };

    let code2 = self.cca2.ok_or_else(|| missing("cca2"))?;
    let code3 = self.cca3.ok_or_else(|| missing("cca3"))?;
    let name = self.name.ok_or_else(|| missing("name"))?;
    let common = name.common.ok_or_else(|| missing("name.common"))?;
    let official = name.official.ok_or_else(|| missing("name.official"))?;
    let region = self.region.ok_or_else(|| missing("region"))?;
    let population = self.population.ok_or_else(|| missing("population"))?;

    let population = population
      .as_u64()
      .ok_or_else(|| NormalizationError::InvalidField {
        field: "population",
        record: record.clone(),
        reason: format!("expected a non-negative integer, got {}", population),
      })?;

    if let Some(area) = self.area {
      if area < 0.0 {
        return Err(NormalizationError::InvalidField {
          field: "area",
          record,
          reason: format!("expected a non-negative number, got {}", area),
        });
      }
    }

    let native = name
      .native_name
      .and_then(|names| names.into_values().next())
      .and_then(|n| n.common);

    let currencies = self
      .currencies
      .map(|map| {
        map
          .into_iter()
          .map(|(code, c)| Currency {
            code,
            name: c.name,
            symbol: c.symbol,
          })
          .collect()
      })
      .unwrap_or_default();

    let languages = self
      .languages
      .map(|map| map.into_values().collect())
      .unwrap_or_default();

    Ok(Country {
      code2: code2.to_uppercase(),
      code3: code3.to_uppercase(),
      name: CountryName {
        common,
        official,
        native,
      },
      capital: self.capital.and_then(|c| c.into_iter().next()),
      region,
      subregion: self.subregion,
      population,
      area: self.area,
      currencies,
      languages,
      timezones: self.timezones.unwrap_or_default(),
      flags: self.flags.map(|f| Flags {
        svg: f.svg,
        png: f.png,
      }),
      maps: self.maps.map(|m| Maps {
        google_maps: m.google_maps,
        open_street_maps: m.open_street_maps,
      }),
    })
  }
}

/// Normalize one raw provider document.
pub fn normalize(value: Value) -> Result<Country, NormalizationError> {
  let raw: ApiCountry =
    serde_json::from_value(value).map_err(|e| NormalizationError::Malformed(e.to_string()))?;
  raw.into_country()
}

/// Normalize every document, failing on the first bad record. Nothing is skipped.
pub fn normalize_all(values: Vec<Value>) -> Result<Vec<Country>, NormalizationError> {
  values.into_iter().map(normalize).collect()
}
