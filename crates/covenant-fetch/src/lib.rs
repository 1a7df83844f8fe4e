//! Spec acquisition for contract test runs.
//!
//! Probes the service's health endpoint, then fetches its OpenAPI document and
//! checks the minimal shape before handing it on. Every failure is terminal
//! for the run; nothing is retried.

pub mod config;
pub mod error;
pub mod fetcher;

pub use config::FetchConfig;
pub use error::FetchError;
pub use fetcher::SpecFetcher;
