use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::types::CountryCode;
use crate::config::UpstreamConfig;
use crate::error::{RepositoryError, RepositoryResult};

const USER_AGENT: &str = concat!("countries-bff/", env!("CARGO_PKG_VERSION"));

/// Raw access to the country provider.
///
/// Implementations return provider documents untouched; normalization
/// happens in the repository.
#[async_trait]
pub trait CountryUpstream: Send + Sync {
  /// Every country the provider knows about.
  async fn fetch_all(&self) -> RepositoryResult<Vec<Value>>;

  /// A single country by alpha-2 or alpha-3 code; `None` when the
  /// provider reports that it does not exist.
  async fn fetch_by_code(&self, code: &CountryCode) -> RepositoryResult<Option<Value>>;
}

/// REST Countries HTTP client
#[derive(Clone)]
pub struct HttpUpstream {
  client: reqwest::Client,
  base_url: Url,
  fields: Vec<String>,
}

impl HttpUpstream {
  pub fn new(config: &UpstreamConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid upstream base URL {}: {}", config.base_url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("Upstream base URL {} cannot be a base", base_url));
    }

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(USER_AGENT)
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base_url,
      fields: config.fields.clone(),
    })
  }

  /// Build `{base}/{segments...}?fields=...`. Segments are percent-encoded.
  fn endpoint(&self, segments: &[&str]) -> RepositoryResult<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| RepositoryError::upstream(format!("{} cannot be a base", self.base_url)))?
      .pop_if_empty()
      .extend(segments);

    if !self.fields.is_empty() {
      url
        .query_pairs_mut()
        .append_pair("fields", &self.fields.join(","));
    }

    Ok(url)
  }

  /// GET a JSON document; `None` on 404.
  async fn get_json(&self, url: Url) -> RepositoryResult<Option<Value>> {
    debug!(%url, "upstream request");

    let response = self.client.get(url.clone()).send().await?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      return Err(RepositoryError::upstream(format!(
        "GET {} returned {}",
        url.path(),
        status
      )));
    }

    let body = response
      .json::<Value>()
      .await
      .map_err(|e| RepositoryError::upstream(format!("Malformed response body: {}", e)))?;

    Ok(Some(body))
  }
}

#[async_trait]
impl CountryUpstream for HttpUpstream {
  async fn fetch_all(&self) -> RepositoryResult<Vec<Value>> {
    let url = self.endpoint(&["all"])?;

    match self.get_json(url).await? {
      Some(Value::Array(items)) => {
        debug!(count = items.len(), "fetched countries");
        Ok(items)
      }
      Some(other) => Err(RepositoryError::upstream(format!(
        "Expected a JSON array of countries, got {}",
        json_kind(&other)
      ))),
      None => Err(RepositoryError::upstream("Country list endpoint returned 404")),
    }
  }

  async fn fetch_by_code(&self, code: &CountryCode) -> RepositoryResult<Option<Value>> {
    let url = self.endpoint(&["alpha", code.as_str()])?;

    // The alpha endpoint answers with either an array or a single object
    match self.get_json(url).await? {
      Some(Value::Array(items)) => Ok(items.into_iter().next()),
      Some(record @ Value::Object(_)) => Ok(Some(record)),
      Some(other) => Err(RepositoryError::upstream(format!(
        "Expected a country document, got {}",
        json_kind(&other)
      ))),
      None => Ok(None),
    }
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
