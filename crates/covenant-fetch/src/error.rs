use thiserror::Error;

/// Spec acquisition failures. All of them abort the run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The service refused the connection.
    #[error("cannot connect to {url}; ensure the service under test is running")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with an unexpected status.
    #[error("{url} responded with status {status}")]
    Upstream { url: String, status: u16 },

    /// The body is not a JSON object carrying `openapi` or `swagger`.
    #[error("malformed OpenAPI document from {url}: {reason}")]
    MalformedSpec { url: String, reason: String },

    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u128 },

    /// Any other transport failure (TLS, protocol, body read).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FetchError {
    /// Acquisition is fail-fast: nothing can be checked without a document.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// The URL the failure relates to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Unreachable { url, .. }
            | FetchError::Upstream { url, .. }
            | FetchError::MalformedSpec { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Transport { url, .. } => Some(url),
            FetchError::ClientInit(_) | FetchError::Config(_) => None,
        }
    }
}
