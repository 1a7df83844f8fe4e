use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DocumentError;

/// HTTP methods recognized on an OpenAPI path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// The fixed method vocabulary, in lookup order.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// The lowercase token used as a path item key.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DocumentError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.as_str().to_ascii_uppercase())
    }
}

/// The descriptive `info` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Info {
    pub title: Option<String>,
    pub version: Option<String>,
}

/// An immutable, already-parsed OpenAPI document.
///
/// The root is guaranteed to be an object carrying an `openapi` or `swagger`
/// key. Everything below the root is kept as raw JSON and read through
/// accessors, so structural gaps (no `paths`, no `components`) surface as
/// absent values rather than errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OpenApiDocument {
    root: Map<String, Value>,
}

impl OpenApiDocument {
    /// Wrap a parsed JSON value, checking the minimal document shape.
    pub fn from_value(root: Value) -> Result<Self, DocumentError> {
        let Value::Object(root) = root else {
            return Err(DocumentError::NotAnObject);
        };

        if !root.contains_key("openapi") && !root.contains_key("swagger") {
            return Err(DocumentError::UnknownFormat);
        }

        Ok(Self { root })
    }

    /// Parse a document from a YAML or JSON string.
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        // JSON is valid YAML, one parser covers both
        let root: Value =
            serde_yaml::from_str(input).map_err(|e| DocumentError::Parse(e.to_string()))?;
        Self::from_value(root)
    }

    /// The raw root object.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// The declared `openapi` (or legacy `swagger`) version string.
    pub fn spec_version(&self) -> Option<&str> {
        self.root
            .get("openapi")
            .or_else(|| self.root.get("swagger"))
            .and_then(Value::as_str)
    }

    pub fn info(&self) -> Info {
        let info = self.root.get("info").and_then(Value::as_object);
        let field = |name: &str| {
            info.and_then(|i| i.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Info {
            title: field("title"),
            version: field("version"),
        }
    }

    /// The `paths` mapping, if present and an object.
    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.root.get("paths").and_then(Value::as_object)
    }

    /// A single path item by exact template string.
    pub fn path_item(&self, path: &str) -> Option<&Map<String, Value>> {
        self.paths()?.get(path)?.as_object()
    }

    /// Named schemas under `components.schemas`, in document order.
    pub fn component_schemas(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|schemas| schemas.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

impl TryFrom<Value> for OpenApiDocument {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
