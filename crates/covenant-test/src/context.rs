//! Per-run contract context.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use covenant_fetch::{FetchConfig, FetchError, SpecFetcher};
use covenant_spec::{OpenApiDocument, SpecIndex};
use covenant_validator::{ContractValidator, Verdict};

use crate::client::ApiClient;

/// Errors from harness setup and requests.
#[derive(Debug, Error)]
pub enum TestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no response received from {url}: {source}")]
    NoResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),
}

/// Outcome of a schema assertion, with text fit for a test failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMatch {
    pub pass: bool,
    pub message: String,
    /// `None` when the operation could not be checked at all.
    pub verdict: Option<Verdict>,
}

struct Inner {
    config: FetchConfig,
    validator: ContractValidator,
    client: ApiClient,
}

/// Everything a test needs: the fetched document, its validator and a client.
///
/// Built once per run; clones share the same validator and compiled schemas.
#[derive(Clone)]
pub struct ContractContext {
    inner: Arc<Inner>,
}

impl ContractContext {
    /// Health-check the service, fetch its document, and wire up the rest.
    pub async fn connect(config: FetchConfig) -> Result<Self, TestError> {
        let document = SpecFetcher::new(config.clone())?.fetch().await?;
        Self::from_document(config, document)
    }

    /// Build from a document obtained elsewhere.
    pub fn from_document(config: FetchConfig, document: OpenApiDocument) -> Result<Self, TestError> {
        let client = ApiClient::new(config.clone())?;
        let validator = ContractValidator::new(Arc::new(document));

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                validator,
                client,
            }),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn validator(&self) -> &ContractValidator {
        &self.inner.validator
    }

    pub fn index(&self) -> &SpecIndex {
        self.inner.validator.index()
    }

    pub fn document(&self) -> &OpenApiDocument {
        self.index().document()
    }

    /// Check a response body. Undocumented operations fail.
    pub fn check_response(&self, path: &str, method: &str, status: u16, body: &Value) -> SchemaMatch {
        let label = format!("{} {} ({})", method.to_uppercase(), path, status);

        match self.validator().validate_response(path, method, status, body) {
            Ok(verdict) => Self::outcome("Response", &label, verdict),
            Err(e) => SchemaMatch {
                pass: false,
                message: e.to_string(),
                verdict: None,
            },
        }
    }

    /// Check a request body. Operations without a request schema pass.
    pub fn check_request(&self, path: &str, method: &str, body: &Value) -> SchemaMatch {
        let label = format!("{} {}", method.to_uppercase(), path);

        match self.validator().validate_request(path, method, body) {
            Ok(verdict) => Self::outcome("Request", &label, verdict),
            Err(e) => SchemaMatch {
                pass: false,
                message: e.to_string(),
                verdict: None,
            },
        }
    }

    pub fn expected_status_codes(&self, path: &str, method: &str) -> BTreeSet<u16> {
        self.index().declared_status_codes(path, method)
    }

    pub fn operation_id(&self, path: &str, method: &str) -> Option<&str> {
        self.index().operation_id(path, method)
    }

    fn outcome(kind: &str, label: &str, verdict: Verdict) -> SchemaMatch {
        let message = if verdict.valid {
            match &verdict.note {
                Some(note) => format!("{kind} for {label} not checked: {note}"),
                None => format!("{kind} for {label} matches its schema"),
            }
        } else {
            format!("{kind} validation failed for {label}:\n{}", verdict.describe())
        };

        SchemaMatch {
            pass: verdict.valid,
            message,
            verdict: Some(verdict),
        }
    }
}

impl std::fmt::Debug for ContractContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractContext")
            .field("server_url", &self.inner.config.server_url)
            .field("validator", &self.inner.validator)
            .finish()
    }
}
