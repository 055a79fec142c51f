use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use countries_bff::cache::{CacheLayer, CacheStorage, MemoryStorage, NoopStorage};
use countries_bff::config::Config;
use countries_bff::countries::types::{DEFAULT_PAGE, DEFAULT_PER_PAGE};
use countries_bff::countries::{
  CachedCountryRepository, CountryFilter, CountryRepository, CountrySortBy, HttpUpstream,
  PaginationParams, SourceRepository,
};
use countries_bff::logging;

#[derive(Parser, Debug)]
#[command(name = "countries-bff")]
#[command(about = "Cached query front end for the REST Countries API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/countries-bff/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Override the upstream base URL
  #[arg(long, global = true)]
  base_url: Option<String>,

  /// Always go to the upstream provider
  #[arg(long, global = true)]
  no_cache: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List countries, optionally filtered, sorted and paginated
  List(ListArgs),
  /// Show a single country by alpha-2 or alpha-3 code
  Get { code: String },
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
  /// Case-insensitive substring of the common name
  #[arg(long)]
  name: Option<String>,
  #[arg(long)]
  region: Option<String>,
  #[arg(long)]
  subregion: Option<String>,
  /// Currency code, e.g. EUR
  #[arg(long)]
  currency: Option<String>,
  /// Language name, e.g. Portuguese
  #[arg(long)]
  language: Option<String>,
  /// name, name_desc, population or population_desc
  #[arg(long)]
  sort: Option<CountrySortBy>,
  #[arg(long)]
  page: Option<u32>,
  #[arg(long)]
  per_page: Option<u32>,
}

impl ListArgs {
  fn filter(&self) -> CountryFilter {
    CountryFilter {
      name: self.name.clone(),
      region: self.region.clone(),
      subregion: self.subregion.clone(),
      currency: self.currency.clone(),
      language: self.language.clone(),
    }
  }

  fn pagination(&self) -> Option<PaginationParams> {
    if self.page.is_none() && self.per_page.is_none() {
      return None;
    }
    Some(PaginationParams::new(
      self.page.unwrap_or(DEFAULT_PAGE),
      self.per_page.unwrap_or(DEFAULT_PER_PAGE),
    ))
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration, then let flags win over file and environment
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.upstream.base_url = base_url;
  }
  if args.no_cache {
    config.cache.enabled = false;
  }

  let _guard = logging::init(&config.log)?;

  let source = SourceRepository::new(HttpUpstream::new(&config.upstream)?);
  let ttl = chrono::Duration::seconds(config.cache.ttl_secs as i64);

  if config.cache.enabled {
    info!(ttl_secs = config.cache.ttl_secs, "caching enabled");
    let cache = CacheLayer::new(MemoryStorage::new()).with_ttl(ttl);
    run(args.command, CachedCountryRepository::new(source, cache)).await
  } else {
    info!("caching disabled");
    run(args.command, CachedCountryRepository::new(source, CacheLayer::new(NoopStorage))).await
  }
}

async fn run<R, S>(command: Command, repository: CachedCountryRepository<R, S>) -> Result<()>
where
  R: CountryRepository,
  S: CacheStorage,
{
  match command {
    Command::List(list) => {
      let filter = list.filter();
      let result = repository
        .find_all(Some(&filter), list.pagination(), list.sort)
        .await?;
      print_json(&result)
    }
    Command::Get { code } => match repository.find_by_code(&code).await? {
      Some(country) => print_json(&country),
      None => Err(eyre!("No country found for code '{}'", code.trim())),
    },
  }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  let json = serde_json::to_string_pretty(value)
    .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
  println!("{}", json);
  Ok(())
}
