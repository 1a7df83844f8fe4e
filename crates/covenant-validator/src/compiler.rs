//! JSON Schema compilation backed by the `jsonschema` crate.
//!
//! Component schemas are registered by name and made reachable at
//! `#/components/schemas/<name>`, so inline `$ref`s inside response and
//! request schemas resolve the same way they do in the source document.

use jsonschema::{Draft, Validator};
use serde_json::{Map, Value};
use thiserror::Error;

use covenant_spec::OpenApiDocument;

use crate::verdict::SchemaViolation;

/// Prefix under which component schemas are addressable.
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// Keywords holding instance data rather than subschemas.
const DATA_KEYWORDS: &[&str] = &["enum", "const", "default", "example", "examples"];

/// Keywords holding a map of named subschemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "dependentSchemas",
];

/// Errors raised while registering or compiling schemas.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("schema '{0}' is already registered")]
    Duplicate(String),

    #[error("schema '{0}' is not a JSON object or boolean")]
    NotASchema(String),

    #[error("invalid JSON Schema: {0}")]
    Invalid(String),
}

/// Holds registered component schemas and compiles validators against them.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    draft: Draft,
    /// Rewrite OpenAPI 3.0 `nullable: true` into a `"null"` type.
    nullable: bool,
    components: Map<String, Value>,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new(Draft::Draft202012)
    }
}

impl SchemaCompiler {
    pub fn new(draft: Draft) -> Self {
        Self {
            draft,
            nullable: false,
            components: Map::new(),
        }
    }

    /// Pick the schema dialect from the document version.
    ///
    /// OpenAPI 3.0 and Swagger 2.0 schemas follow draft 4 semantics
    /// (boolean `exclusiveMinimum` and friends) plus the `nullable`
    /// extension; 3.1 uses 2020-12.
    pub fn for_document(document: &OpenApiDocument) -> Self {
        match document.spec_version() {
            Some(v) if v.starts_with("3.0") || v.starts_with("2.") => {
                Self::new(Draft::Draft4).with_nullable(true)
            }
            _ => Self::new(Draft::Draft202012),
        }
    }

    /// Treat `nullable: true` as allowing `null`.
    pub fn with_nullable(mut self, enabled: bool) -> Self {
        self.nullable = enabled;
        self
    }

    /// The `$ref` key a component is addressable under.
    pub fn reference_key(name: &str) -> String {
        format!("{COMPONENTS_PREFIX}{name}")
    }

    /// Register a named component schema.
    ///
    /// The schema is trial-compiled against the components registered so far
    /// (and itself). A name can only be registered once; re-registering keeps
    /// the first schema and reports [`CompileError::Duplicate`]. A schema that
    /// does not compile is left out and reported as [`CompileError::Invalid`].
    pub fn add_schema(&mut self, name: &str, schema: &Value) -> Result<(), CompileError> {
        self.stage(name, schema)?;

        if let Err(e) = self.trial_compile(name) {
            self.components.shift_remove(name);
            return Err(e);
        }
        Ok(())
    }

    /// Register a batch of components that may reference each other in any
    /// order. Returns every component left out, with the reason.
    ///
    /// All well-formed entries are staged first so forward `$ref`s resolve.
    /// Dropping a component can break the ones referencing it, so trial
    /// compilation repeats until nothing else fails.
    pub fn add_schemas<'a>(
        &mut self,
        schemas: impl IntoIterator<Item = (&'a str, &'a Value)>,
    ) -> Vec<(String, CompileError)> {
        let mut rejected = Vec::new();
        let mut staged = Vec::new();

        for (name, schema) in schemas {
            match self.stage(name, schema) {
                Ok(()) => staged.push(name.to_string()),
                Err(e) => rejected.push((name.to_string(), e)),
            }
        }

        loop {
            let failed: Vec<(String, CompileError)> = staged
                .iter()
                .filter_map(|name| {
                    self.trial_compile(name)
                        .err()
                        .map(|e| (name.clone(), e))
                })
                .collect();

            if failed.is_empty() {
                break;
            }
            for (name, e) in failed {
                self.components.shift_remove(&name);
                staged.retain(|n| n != &name);
                rejected.push((name, e));
            }
        }

        rejected
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Compile a schema into a reusable validator.
    pub fn compile(&self, schema: &Value) -> Result<CompiledSchema, CompileError> {
        let validator = self.build(self.prepare(schema))?;
        Ok(CompiledSchema { validator })
    }

    /// Shape-check and insert without compiling.
    fn stage(&mut self, name: &str, schema: &Value) -> Result<(), CompileError> {
        if self.components.contains_key(name) {
            return Err(CompileError::Duplicate(name.to_string()));
        }
        if !(schema.is_object() || schema.is_boolean()) {
            return Err(CompileError::NotASchema(name.to_string()));
        }

        let prepared = self.prepare(schema);
        self.components.insert(name.to_string(), prepared);
        Ok(())
    }

    fn trial_compile(&self, name: &str) -> Result<(), CompileError> {
        match self.components.get(name) {
            Some(schema) => self.build(schema.clone()).map(|_| ()),
            None => Ok(()),
        }
    }

    fn prepare(&self, schema: &Value) -> Value {
        let mut schema = schema.clone();
        if self.nullable {
            rewrite_nullable(&mut schema);
        }
        schema
    }

    fn build(&self, schema: Value) -> Result<Validator, CompileError> {
        let root = self.with_components(schema);

        jsonschema::options()
            .with_draft(self.draft)
            .should_validate_formats(true)
            .build(&root)
            .map_err(|e| CompileError::Invalid(e.to_string()))
    }

    /// Attach the registered components to the schema root so that
    /// `#/components/schemas/*` pointers resolve against it.
    fn with_components(&self, schema: Value) -> Value {
        match schema {
            Value::Object(mut root)
                if !self.components.is_empty() && !root.contains_key("components") =>
            {
                let mut components = Map::new();
                components.insert(
                    "schemas".to_string(),
                    Value::Object(self.components.clone()),
                );
                root.insert("components".to_string(), Value::Object(components));
                Value::Object(root)
            }
            other => other,
        }
    }
}

/// Turn `{type: T, nullable: true}` into `{type: [T, "null"]}`, recursively.
///
/// A `nullable` without a `type` is dropped without widening anything.
fn rewrite_nullable(schema: &mut Value) {
    match schema {
        Value::Object(obj) => {
            if obj.get("nullable") == Some(&Value::Bool(true)) {
                let null = Value::from("null");
                match obj.get_mut("type") {
                    Some(Value::Array(types)) => {
                        if !types.contains(&null) {
                            types.push(null);
                        }
                    }
                    Some(ty) if ty.is_string() => {
                        let single = ty.take();
                        *ty = Value::Array(vec![single, null]);
                    }
                    _ => {}
                }
                obj.shift_remove("nullable");
            }

            for (key, value) in obj.iter_mut() {
                let key = key.as_str();
                if SCHEMA_MAP_KEYWORDS.contains(&key) {
                    if let Value::Object(named) = value {
                        named.values_mut().for_each(rewrite_nullable);
                    }
                } else if !DATA_KEYWORDS.contains(&key) {
                    rewrite_nullable(value);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_nullable),
        _ => {}
    }
}

/// A compiled schema, safe to share across threads.
pub struct CompiledSchema {
    validator: Validator,
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema").finish_non_exhaustive()
    }
}

impl CompiledSchema {
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every violation, in the order the engine reports them.
    pub fn validate(&self, instance: &Value) -> Vec<SchemaViolation> {
        self.validator
            .iter_errors(instance)
            .map(|e| SchemaViolation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }
}
