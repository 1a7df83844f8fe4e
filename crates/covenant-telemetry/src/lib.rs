//! Logging infrastructure for the Covenant harness.
//!
//! Sets up a `tracing` subscriber (JSON or pretty) and defines the standard
//! event names emitted while fetching specs and validating exchanges.
//!
//! # Usage
//!
//! ```ignore
//! use covenant_telemetry::{LogFormat, TelemetryConfig};
//!
//! let config = TelemetryConfig::new()
//!     .with_log_level("debug")
//!     .with_log_format(LogFormat::Pretty);
//!
//! covenant_telemetry::init_logging(&config)?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::{events, init_logging};

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}
