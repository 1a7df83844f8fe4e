use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::model::{HttpMethod, OpenApiDocument};

/// The only media type whose schemas are looked up.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Response key used when no exact status code matches.
const DEFAULT_RESPONSE: &str = "default";

/// A schema located inside the document.
///
/// `pointer` is the RFC 6901 pointer of the schema within the document and
/// serves as its stable identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRef<'a> {
    pub pointer: String,
    pub schema: &'a Value,
}

/// One documented operation (path + method).
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    path: &'a str,
    method: HttpMethod,
    object: &'a Map<String, Value>,
}

impl<'a> Operation<'a> {
    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The raw operation object.
    pub fn raw(&self) -> &'a Map<String, Value> {
        self.object
    }

    pub fn operation_id(&self) -> Option<&'a str> {
        self.object.get("operationId").and_then(Value::as_str)
    }

    pub fn responses(&self) -> Option<&'a Map<String, Value>> {
        self.object.get("responses").and_then(Value::as_object)
    }

    /// Every numeric response key. `default` and other non-numeric keys
    /// (e.g. `2XX`) are skipped.
    pub fn declared_status_codes(&self) -> BTreeSet<u16> {
        self.responses()
            .map(|responses| {
                responses
                    .keys()
                    .filter(|k| !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()))
                    .filter_map(|k| k.parse::<u16>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The JSON response schema for `status`.
    ///
    /// An exact status key wins; `default` is consulted only when no exact
    /// key exists. An exact response without JSON content yields `None`
    /// without falling through to `default`.
    pub fn response_schema(&self, status: u16) -> Option<SchemaRef<'a>> {
        let responses = self.responses()?;
        let exact = status.to_string();

        let (key, response) = match responses.get(&exact) {
            Some(response) => (exact.as_str(), response),
            None => (DEFAULT_RESPONSE, responses.get(DEFAULT_RESPONSE)?),
        };

        let schema = json_schema_of(response)?;
        Some(SchemaRef {
            pointer: format!(
                "{}/responses/{}/content/{}/schema",
                self.pointer(),
                escape_pointer(key),
                escape_pointer(JSON_MEDIA_TYPE)
            ),
            schema,
        })
    }

    /// The JSON request body schema, if declared.
    pub fn request_schema(&self) -> Option<SchemaRef<'a>> {
        let body = self.object.get("requestBody")?;
        let schema = json_schema_of(body)?;
        Some(SchemaRef {
            pointer: format!(
                "{}/requestBody/content/{}/schema",
                self.pointer(),
                escape_pointer(JSON_MEDIA_TYPE)
            ),
            schema,
        })
    }

    fn pointer(&self) -> String {
        format!(
            "/paths/{}/{}",
            escape_pointer(self.path),
            self.method.as_str()
        )
    }
}

/// `content["application/json"].schema` of a response or request body.
fn json_schema_of(holder: &Value) -> Option<&Value> {
    holder
        .get("content")?
        .get(JSON_MEDIA_TYPE)?
        .get("schema")
}

/// Escape a JSON pointer reference token (RFC 6901).
fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Structural, read-only queries over a document.
///
/// Path lookup is exact string equality on the path template; method lookup
/// is case-insensitive. Missing or malformed structure degrades to empty
/// results.
#[derive(Debug, Clone)]
pub struct SpecIndex {
    document: Arc<OpenApiDocument>,
}

impl SpecIndex {
    pub fn new(document: Arc<OpenApiDocument>) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Arc<OpenApiDocument> {
        &self.document
    }

    /// Path templates in document order.
    pub fn list_paths(&self) -> Vec<&str> {
        self.document
            .paths()
            .map(|paths| paths.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Methods present on `path`, in vocabulary order.
    pub fn list_methods(&self, path: &str) -> Vec<HttpMethod> {
        let Some(item) = self.document.path_item(path) else {
            return Vec::new();
        };

        HttpMethod::ALL
            .into_iter()
            .filter(|m| item.get(m.as_str()).is_some_and(Value::is_object))
            .collect()
    }

    pub fn find_operation(&self, path: &str, method: &str) -> Option<Operation<'_>> {
        let method: HttpMethod = method.parse().ok()?;
        self.operation(path, method)
    }

    /// Typed variant of [`SpecIndex::find_operation`].
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<Operation<'_>> {
        let (path, item) = self.document.paths()?.get_key_value(path)?;
        let object = item.as_object()?.get(method.as_str())?.as_object()?;

        Some(Operation {
            path,
            method,
            object,
        })
    }

    /// Every documented operation, paths in document order.
    pub fn operations(&self) -> impl Iterator<Item = Operation<'_>> {
        self.list_paths().into_iter().flat_map(move |path| {
            self.list_methods(path)
                .into_iter()
                .filter_map(move |method| self.operation(path, method))
        })
    }

    pub fn operation_id(&self, path: &str, method: &str) -> Option<&str> {
        self.find_operation(path, method)?.operation_id()
    }

    pub fn declared_status_codes(&self, path: &str, method: &str) -> BTreeSet<u16> {
        self.find_operation(path, method)
            .map(|op| op.declared_status_codes())
            .unwrap_or_default()
    }

    pub fn response_schema(
        &self,
        path: &str,
        method: &str,
        status: u16,
    ) -> Option<SchemaRef<'_>> {
        self.find_operation(path, method)?.response_schema(status)
    }

    pub fn request_schema(&self, path: &str, method: &str) -> Option<SchemaRef<'_>> {
        self.find_operation(path, method)?.request_schema()
    }
}
