//! JSON HTTP client for exercising the service under test.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;

use covenant_fetch::FetchConfig;
use covenant_telemetry::log_exchange_completed;

use crate::context::TestError;

/// A captured response.
///
/// Non-2xx statuses are data, not errors: `error` is set and the body is kept
/// so it can be checked against the documented error schema.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON; a non-JSON body is kept as a string, an empty one as null.
    pub body: Value,
    pub headers: HeaderMap,
    pub error: bool,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        !self.error
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Sends JSON requests relative to the configured server URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: FetchConfig,
    client: Client,
}

impl ApiClient {
    pub fn new(config: FetchConfig) -> Result<Self, TestError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(TestError::ClientInit)?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.server_url
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, TestError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, TestError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse, TestError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<ApiResponse, TestError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, TestError> {
        self.request(Method::DELETE, path, None).await
    }

    /// Make a request with any method. Only transport failures are `Err`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, TestError> {
        let url = self.config.url_for(path);

        let mut builder = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(source) => {
                tracing::warn!(%method, url = %url, error = %source, "no response received");
                return Err(TestError::NoResponse { url, source });
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TestError::NoResponse {
                url: url.clone(),
                source,
            })?;

        log_exchange_completed!(
            %method,
            url = %url,
            status = status.as_u16(),
            error = !status.is_success(),
            "exchange completed"
        );

        Ok(ApiResponse {
            status: status.as_u16(),
            body: decode_body(&bytes),
            headers,
            error: !status.is_success(),
        })
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
