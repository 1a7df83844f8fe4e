//! Structured logging with JSON or pretty output.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// Health probe against the service under test succeeded.
    pub const HEALTH_CHECK_PASSED: &str = "health_check_passed";

    /// OpenAPI document fetched and shape-checked.
    pub const SPEC_FETCHED: &str = "spec_fetched";

    /// A component schema could not be registered and was skipped.
    pub const SCHEMA_REGISTRATION_SKIPPED: &str = "schema_registration_skipped";

    /// A payload did not conform to its schema.
    pub const VALIDATION_FAILURE: &str = "validation_failure";

    /// An HTTP exchange with the service under test completed.
    pub const EXCHANGE_COMPLETED: &str = "exchange_completed";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_health_check_passed {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::HEALTH_CHECK_PASSED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_spec_fetched {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SPEC_FETCHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_schema_registration_skipped {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::SCHEMA_REGISTRATION_SKIPPED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_validation_failure {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::VALIDATION_FAILURE,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_exchange_completed {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::EXCHANGE_COMPLETED,
            $($field)*
        )
    };
}
