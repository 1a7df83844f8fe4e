use thiserror::Error;

/// Errors produced while wrapping a raw document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Root is not a JSON object.
    #[error("spec root must be a JSON object")]
    NotAnObject,

    /// Neither an `openapi` nor a `swagger` key is present at the root.
    #[error("document does not declare an 'openapi' or 'swagger' version")]
    UnknownFormat,

    /// YAML/JSON syntax error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Method token outside the supported vocabulary.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),
}
