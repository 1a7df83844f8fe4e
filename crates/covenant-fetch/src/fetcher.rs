//! Health-gated OpenAPI document acquisition.

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use covenant_spec::{DocumentError, OpenApiDocument};
use covenant_telemetry::{log_health_check_passed, log_spec_fetched};

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Fetches the OpenAPI document of the service under test.
#[derive(Debug, Clone)]
pub struct SpecFetcher {
    config: FetchConfig,
    client: Client,
}

impl SpecFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::ClientInit)?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Probe health, then fetch and shape-check the document.
    ///
    /// The probe runs first so that "service down" and "spec endpoint
    /// broken" are reported as different failures.
    pub async fn fetch(&self) -> Result<OpenApiDocument, FetchError> {
        self.check_health().await?;

        let url = self.config.openapi_url();
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.classify(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e, &url))?;
        let root: Value = serde_json::from_slice(&body).map_err(|e| FetchError::MalformedSpec {
            url: url.clone(),
            reason: format!("body is not valid JSON: {e}"),
        })?;

        let document = OpenApiDocument::from_value(root).map_err(|e| {
            let reason = match e {
                DocumentError::NotAnObject => "not a JSON object".to_string(),
                DocumentError::UnknownFormat => {
                    "does not appear to be an OpenAPI specification".to_string()
                }
                other => other.to_string(),
            };
            FetchError::MalformedSpec {
                url: url.clone(),
                reason,
            }
        })?;

        let info = document.info();
        log_spec_fetched!(
            url = %url,
            spec_version = document.spec_version().unwrap_or("unknown"),
            title = info.title.as_deref().unwrap_or("untitled"),
            api_version = info.version.as_deref().unwrap_or("unknown"),
            "fetched OpenAPI document"
        );

        Ok(document)
    }

    /// Expect a 200 from the health endpoint.
    pub async fn check_health(&self) -> Result<(), FetchError> {
        let url = self.config.health_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e, &url))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Upstream {
                url,
                status: response.status().as_u16(),
            });
        }

        log_health_check_passed!(url = %url, "service health check passed");
        Ok(())
    }

    fn classify(&self, error: reqwest::Error, url: &str) -> FetchError {
        let url = url.to_string();
        if error.is_connect() {
            FetchError::Unreachable { url, source: error }
        } else if error.is_timeout() {
            FetchError::Timeout {
                url,
                timeout_ms: self.config.timeout.as_millis(),
            }
        } else {
            FetchError::Transport { url, source: error }
        }
    }
}
