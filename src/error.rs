//! Typed failures surfaced by the repositories and the cache backends.

use thiserror::Error;

/// Request rejected before any cache or upstream access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("page must be greater than 0 (got {0})")]
  InvalidPage(u32),
  #[error("per_page must be between 1 and 100 (got {0})")]
  InvalidPerPage(u32),
  #[error("country code is required")]
  EmptyCode,
}

/// A fetched provider record could not be turned into a `Country`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
  #[error("record {record} is missing mandatory field `{field}`")]
  MissingField {
    field: &'static str,
    record: String,
  },
  #[error("record {record} has an invalid `{field}`: {reason}")]
  InvalidField {
    field: &'static str,
    record: String,
    reason: String,
  },
  #[error("record could not be decoded: {0}")]
  Malformed(String),
}

/// Failure of a repository operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error("upstream request failed: {message}")]
  Upstream { message: String },
  #[error(transparent)]
  Normalization(#[from] NormalizationError),
}

impl RepositoryError {
  pub fn upstream(message: impl Into<String>) -> Self {
    Self::Upstream {
      message: message.into(),
    }
  }
}

impl From<reqwest::Error> for RepositoryError {
  fn from(err: reqwest::Error) -> Self {
    let message = if err.is_timeout() {
      format!("request timed out: {}", err)
    } else {
      err.to_string()
    };
    Self::Upstream { message }
  }
}

/// Failure of a cache storage backend.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache lock poisoned: {0}")]
  Poisoned(String),
  #[error("cache entry could not be encoded: {0}")]
  Encode(#[source] serde_json::Error),
  #[error("cache entry is corrupt: {0}")]
  Corrupt(#[source] serde_json::Error),
  #[error("cache backend unavailable: {0}")]
  Backend(String),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;
pub type StorageResult<T> = std::result::Result<T, CacheError>;
