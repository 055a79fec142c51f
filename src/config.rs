use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://restcountries.com/v3.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// The provider caps `/all` projections at ten fields.
const DEFAULT_FIELDS: &[&str] = &[
  "name",
  "cca2",
  "cca3",
  "capital",
  "region",
  "subregion",
  "population",
  "currencies",
  "languages",
  "flags",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub upstream: UpstreamConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Projection passed as the `fields` query parameter; empty means all fields
  #[serde(default = "default_fields", deserialize_with = "deserialize_fields")]
  pub fields: Vec<String>,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
      fields: default_fields(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      ttl_secs: default_ttl_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// `tracing` filter directive, overridden by `RUST_LOG`
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Write logs to this file instead of stderr
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  DEFAULT_TIMEOUT_SECS
}

fn default_fields() -> Vec<String> {
  DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_true() -> bool {
  true
}

fn default_ttl_secs() -> u64 {
  DEFAULT_CACHE_TTL_SECS
}

fn default_log_level() -> String {
  "info".to_string()
}

fn deserialize_fields<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let v: Vec<String> = Vec::deserialize(deserializer)?;
  Ok(
    v.into_iter()
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect(),
  )
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./countries-bff.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/countries-bff/config.yaml
  ///
  /// Built-in defaults are used when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    config.with_env_overrides(|name| std::env::var(name).ok())
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("countries-bff.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("countries-bff").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    config.validate()?;
    Ok(config)
  }

  /// Apply `COUNTRIES_BFF_BASE_URL` and `COUNTRIES_BFF_CACHE_TTL`.
  fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    if let Some(url) = lookup("COUNTRIES_BFF_BASE_URL") {
      self.upstream.base_url = url;
    }

    if let Some(ttl) = lookup("COUNTRIES_BFF_CACHE_TTL") {
      self.cache.ttl_secs = ttl
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid COUNTRIES_BFF_CACHE_TTL '{}': {}", ttl, e))?;
    }

    self.validate()?;
    Ok(self)
  }

  pub fn validate(&self) -> Result<()> {
    if self.cache.ttl_secs == 0 {
      return Err(eyre!("cache.ttl_secs must be greater than 0"));
    }
    // Expiry timestamps must stay representable
    if self.cache.ttl_secs > 365 * 24 * 60 * 60 {
      return Err(eyre!("cache.ttl_secs must be at most one year"));
    }
    if self.upstream.timeout_secs == 0 {
      return Err(eyre!("upstream.timeout_secs must be greater than 0"));
    }
    Ok(())
  }
}
