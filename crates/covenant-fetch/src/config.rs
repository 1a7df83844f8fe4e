//! Harness configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Where the service under test lives and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    /// Base URL of the service (default: "http://localhost:3000").
    pub server_url: String,

    /// Applied to every outbound call, serialized in milliseconds (default: 10s).
    #[serde(with = "duration_ms")]
    pub timeout: Duration,

    /// Path of the OpenAPI document (default: "/api/openapi.json").
    #[serde(rename = "openApiEndpoint")]
    pub openapi_endpoint: String,

    /// Path of the liveness probe (default: "/health").
    pub health_endpoint: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_millis(10_000),
            openapi_endpoint: "/api/openapi.json".to_string(),
            health_endpoint: "/health".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a YAML (or JSON) config body. Missing keys keep defaults.
    pub fn from_yaml_str(input: &str) -> Result<Self, FetchError> {
        serde_yaml::from_str(input).map_err(|e| FetchError::Config(e.to_string()))
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_openapi_endpoint(mut self, path: impl Into<String>) -> Self {
        self.openapi_endpoint = path.into();
        self
    }

    pub fn with_health_endpoint(mut self, path: impl Into<String>) -> Self {
        self.health_endpoint = path.into();
        self
    }

    /// Join a request path onto the server URL.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn health_url(&self) -> String {
        self.url_for(&self.health_endpoint)
    }

    pub fn openapi_url(&self) -> String {
        self.url_for(&self.openapi_endpoint)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
