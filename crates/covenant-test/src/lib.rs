//! Test harness for contract checks against a running service.
//!
//! `ContractContext` fetches the service's OpenAPI document once per run and
//! exposes an `ApiClient` plus schema assertions over the captured exchanges.

#[cfg(test)]
mod calendar;
#[cfg(test)]
pub mod cli;
pub mod client;
pub mod context;

pub use client::{ApiClient, ApiResponse};
pub use context::{ContractContext, SchemaMatch, TestError};

/// Assert that a response body matches the schema declared for
/// `path` + `method` + `status`. Panics with the failure details otherwise.
///
/// ```ignore
/// let resp = ctx.client().get("/health").await?;
/// assert_matches_schema!(ctx, resp.body, "/health", "get", resp.status);
/// ```
#[macro_export]
macro_rules! assert_matches_schema {
    ($ctx:expr, $body:expr, $path:expr, $method:expr, $status:expr $(,)?) => {{
        let outcome = $ctx.check_response($path, $method, $status, &$body);
        if !outcome.pass {
            panic!(
                "Expected response to match OpenAPI schema: {}",
                outcome.message
            );
        }
        outcome
    }};
}

/// Request-side counterpart of [`assert_matches_schema!`].
#[macro_export]
macro_rules! assert_request_matches_schema {
    ($ctx:expr, $body:expr, $path:expr, $method:expr $(,)?) => {{
        let outcome = $ctx.check_request($path, $method, &$body);
        if !outcome.pass {
            panic!(
                "Expected request to match OpenAPI schema: {}",
                outcome.message
            );
        }
        outcome
    }};
}
