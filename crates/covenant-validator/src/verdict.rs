use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One schema error reported for a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaViolation {
    /// JSON pointer into the payload; empty for the payload root.
    pub instance_path: String,
    /// JSON pointer to the failing keyword inside the schema.
    pub schema_path: String,
    pub message: String,
}

impl SchemaViolation {
    /// Location suitable for human-readable output.
    pub fn location(&self) -> &str {
        if self.instance_path.is_empty() {
            "root"
        } else {
            &self.instance_path
        }
    }
}

/// Structured pass/fail result for one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<SchemaViolation>,
    /// The schema the payload was checked against, `None` when nothing was checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_used: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Verdict {
    /// Nothing to check: passes with an explanatory note.
    pub fn no_schema(note: impl Into<String>) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            schema_used: None,
            note: Some(note.into()),
        }
    }

    /// Outcome of checking a payload against `schema`.
    pub fn checked(schema: &Value, errors: Vec<SchemaViolation>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            schema_used: Some(schema.clone()),
            note: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// One `  - <location>: <message>` line per error.
    pub fn describe(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("  - {}: {}", e.location(), e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
