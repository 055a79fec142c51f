//! Fixtures and fakes shared by unit tests.

use async_trait::async_trait;
use chrono::Duration;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cache::{CacheStorage, CachedEntry};
use crate::countries::client::CountryUpstream;
use crate::countries::types::{Country, CountryCode, CountryName, Currency};
use crate::error::{CacheError, RepositoryError, RepositoryResult, StorageResult};

// ============================================================================
// Country fixtures
// ============================================================================

/// Minimal valid country. Every optional field that a filter can look at is set.
pub fn country(code2: &str, code3: &str, name: &str, population: u64) -> Country {
  Country {
    code2: code2.to_string(),
    code3: code3.to_string(),
    name: CountryName {
      common: name.to_string(),
      official: format!("Republic of {}", name),
      native: Some(name.to_string()),
    },
    capital: Some(format!("{} City", name)),
    region: "Oceania".to_string(),
    subregion: Some("Polynesia".to_string()),
    population,
    area: Some(100.0),
    currencies: vec![],
    languages: vec![],
    timezones: vec!["UTC".to_string()],
    flags: None,
    maps: None,
  }
}

fn currency(code: &str, name: &str, symbol: &str) -> Currency {
  Currency {
    code: code.to_string(),
    name: Some(name.to_string()),
    symbol: Some(symbol.to_string()),
  }
}

fn located(mut c: Country, region: &str, subregion: &str) -> Country {
  c.region = region.to_string();
  c.subregion = Some(subregion.to_string());
  c
}

pub fn brazil() -> Country {
  let mut c = located(
    country("BR", "BRA", "Brazil", 212559417),
    "Americas",
    "South America",
  );
  c.name.official = "Federative Republic of Brazil".to_string();
  c.name.native = Some("Brasil".to_string());
  c.capital = Some("Brasília".to_string());
  c.currencies = vec![currency("BRL", "Brazilian real", "R$")];
  c.languages = vec!["Portuguese".to_string()];
  c
}

pub fn united_states() -> Country {
  let mut c = located(
    country("US", "USA", "United States", 329484123),
    "Americas",
    "North America",
  );
  c.name.official = "United States of America".to_string();
  c.capital = Some("Washington, D.C.".to_string());
  c.currencies = vec![currency("USD", "United States dollar", "$")];
  c.languages = vec!["English".to_string()];
  c
}

pub fn germany() -> Country {
  let mut c = located(
    country("DE", "DEU", "Germany", 83240525),
    "Europe",
    "Western Europe",
  );
  c.name.official = "Federal Republic of Germany".to_string();
  c.name.native = Some("Deutschland".to_string());
  c.capital = Some("Berlin".to_string());
  c.currencies = vec![currency("EUR", "Euro", "€")];
  c.languages = vec!["German".to_string()];
  c
}

pub fn portugal() -> Country {
  let mut c = located(
    country("PT", "PRT", "Portugal", 10276617),
    "Europe",
    "Southern Europe",
  );
  c.name.official = "Portuguese Republic".to_string();
  c.capital = Some("Lisbon".to_string());
  c.currencies = vec![currency("EUR", "Euro", "€")];
  c.languages = vec!["Portuguese".to_string()];
  c
}

/// Render a country the way the provider sends it.
pub fn api_record(c: &Country) -> Value {
  let mut record = Map::new();
  record.insert("cca2".into(), json!(c.code2));
  record.insert("cca3".into(), json!(c.code3));

  let mut name = json!({ "common": c.name.common, "official": c.name.official });
  if let Some(native) = &c.name.native {
    name["nativeName"] = json!({ "xxx": { "common": native, "official": native } });
  }
  record.insert("name".into(), name);

  if let Some(capital) = &c.capital {
    record.insert("capital".into(), json!([capital]));
  }
  record.insert("region".into(), json!(c.region));
  if let Some(subregion) = &c.subregion {
    record.insert("subregion".into(), json!(subregion));
  }
  record.insert("population".into(), json!(c.population));
  if let Some(area) = c.area {
    record.insert("area".into(), json!(area));
  }

  let currencies: Map<String, Value> = c
    .currencies
    .iter()
    .map(|cur| (cur.code.clone(), json!({ "name": cur.name, "symbol": cur.symbol })))
    .collect();
  record.insert("currencies".into(), Value::Object(currencies));

  let languages: Map<String, Value> = c
    .languages
    .iter()
    .enumerate()
    .map(|(i, lang)| (format!("l{:02}", i), json!(lang)))
    .collect();
  record.insert("languages".into(), Value::Object(languages));

  record.insert("timezones".into(), json!(c.timezones));
  if let Some(flags) = &c.flags {
    record.insert("flags".into(), json!({ "svg": flags.svg, "png": flags.png }));
  }
  if let Some(maps) = &c.maps {
    record.insert(
      "maps".into(),
      json!({ "googleMaps": maps.google_maps, "openStreetMaps": maps.open_street_maps }),
    );
  }

  Value::Object(record)
}

// ============================================================================
// Fake provider
// ============================================================================

/// In-memory provider that records how it was called.
pub struct FakeUpstream {
  records: Vec<Value>,
  failure: Mutex<Option<String>>,
  calls: AtomicUsize,
  requested: Mutex<Vec<String>>,
}

impl FakeUpstream {
  pub fn new(records: Vec<Value>) -> Self {
    Self {
      records,
      failure: Mutex::new(None),
      calls: AtomicUsize::new(0),
      requested: Mutex::new(Vec::new()),
    }
  }

  /// Provider that fails every call with an upstream error.
  pub fn failing(message: &str) -> Self {
    let upstream = Self::new(Vec::new());
    upstream.fail_with(message);
    upstream
  }

  pub fn fail_with(&self, message: &str) {
    *self.failure.lock().unwrap() = Some(message.to_string());
  }

  pub fn recover(&self) {
    *self.failure.lock().unwrap() = None;
  }

  /// Total fetches, successful or not.
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn requested_codes(&self) -> Vec<String> {
    self.requested.lock().unwrap().clone()
  }

  fn begin(&self) -> RepositoryResult<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    match self.failure.lock().unwrap().as_deref() {
      Some(message) => Err(RepositoryError::upstream(message)),
      None => Ok(()),
    }
  }
}

#[async_trait]
impl CountryUpstream for FakeUpstream {
  async fn fetch_all(&self) -> RepositoryResult<Vec<Value>> {
    self.begin()?;
    Ok(self.records.clone())
  }

  async fn fetch_by_code(&self, code: &CountryCode) -> RepositoryResult<Option<Value>> {
    self.requested.lock().unwrap().push(code.to_string());
    self.begin()?;

    let matches = |field: &str, record: &Value| {
      record[field]
        .as_str()
        .is_some_and(|c| c.eq_ignore_ascii_case(code.as_str()))
    };

    Ok(
      self
        .records
        .iter()
        .find(|r| matches("cca2", r) || matches("cca3", r))
        .cloned(),
    )
  }
}

// ============================================================================
// Broken cache backend
// ============================================================================

/// Storage whose every operation fails, counting attempts.
#[derive(Default)]
pub struct FailingStorage {
  reads: AtomicUsize,
  writes: AtomicUsize,
}

impl FailingStorage {
  pub fn reads(&self) -> usize {
    self.reads.load(Ordering::SeqCst)
  }

  pub fn writes(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  fn down<T>() -> StorageResult<T> {
    Err(CacheError::Backend("connection reset".to_string()))
  }
}

impl CacheStorage for FailingStorage {
  fn get(&self, _key: &str) -> StorageResult<Option<CachedEntry>> {
    self.reads.fetch_add(1, Ordering::SeqCst);
    Self::down()
  }

  fn set(&self, _key: &str, _data: Vec<u8>, _ttl: Duration) -> StorageResult<()> {
    self.writes.fetch_add(1, Ordering::SeqCst);
    Self::down()
  }

  fn remove(&self, _key: &str) -> StorageResult<bool> {
    Self::down()
  }

  fn flush(&self) -> StorageResult<()> {
    Self::down()
  }

  fn keys(&self) -> StorageResult<Vec<String>> {
    Self::down()
  }
}
