//! Cached query façade over the REST Countries API.

pub mod cache;
pub mod config;
pub mod countries;
pub mod error;
pub mod logging;

#[cfg(test)]
mod test_support;
