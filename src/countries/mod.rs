//! Country data: provider access, normalization, querying and caching.
//!
//! Requests flow through [`CachedCountryRepository`] into a
//! [`SourceRepository`], which fetches raw documents from a
//! [`CountryUpstream`], normalizes them and runs the query in memory.

pub mod api_types;
pub mod cache;
pub mod cached_repository;
pub mod client;
pub mod engine;
pub mod repository;
pub mod types;

pub use cache::CountryQueryKey;
pub use cached_repository::CachedCountryRepository;
pub use client::{CountryUpstream, HttpUpstream};
pub use repository::{CountryRepository, SourceRepository};
pub use types::{
  Country, CountryCode, CountryFilter, CountryListResult, CountryName, CountrySortBy, Currency,
  Flags, Maps, PaginationParams,
};
