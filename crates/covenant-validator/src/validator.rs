use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use covenant_spec::{OpenApiDocument, SchemaRef, SpecIndex};
use covenant_telemetry::log_validation_failure;

use crate::compiler::{CompiledSchema, SchemaCompiler};
use crate::verdict::Verdict;

/// Failures that are not schema mismatches.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The document declares no such path + method. Signals a mistake in the
    /// test, not in the service.
    #[error("operation not found for {method} {path}")]
    UndocumentedOperation { method: String, path: String },

    /// The document's own schema could not be compiled.
    #[error("schema at {pointer} failed to compile: {reason}")]
    InvalidSchema { pointer: String, reason: String },
}

/// Validates captured payloads against the schemas a document declares.
///
/// Safe to share across threads; the only mutable state is the cache of
/// compiled schemas, keyed by the schema's pointer inside the document.
pub struct ContractValidator {
    index: SpecIndex,
    compiler: SchemaCompiler,
    cache: RwLock<HashMap<String, Arc<CompiledSchema>>>,
}

impl ContractValidator {
    /// Build a validator, registering every component schema.
    ///
    /// Components that cannot be registered are logged and skipped.
    pub fn new(document: Arc<OpenApiDocument>) -> Self {
        let mut compiler = SchemaCompiler::for_document(&document);

        for (name, e) in compiler.add_schemas(document.component_schemas()) {
            covenant_telemetry::log_schema_registration_skipped!(
                schema = %name,
                error = %e,
                "could not register component schema"
            );
        }

        Self {
            index: SpecIndex::new(document),
            compiler,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn index(&self) -> &SpecIndex {
        &self.index
    }

    pub fn compiler(&self) -> &SchemaCompiler {
        &self.compiler
    }

    /// Validate a response body.
    ///
    /// Errors only when the operation itself is undocumented (or its schema
    /// is uncompilable). A status without a declared schema passes with a note.
    pub fn validate_response(
        &self,
        path: &str,
        method: &str,
        status: u16,
        body: &Value,
    ) -> Result<Verdict, ContractError> {
        let operation = self.index.find_operation(path, method).ok_or_else(|| {
            ContractError::UndocumentedOperation {
                method: method.to_uppercase(),
                path: path.to_string(),
            }
        })?;

        let Some(schema) = operation.response_schema(status) else {
            return Ok(Verdict::no_schema(format!(
                "No schema defined for {status} response"
            )));
        };

        let verdict = self.check(&schema, body)?;
        if !verdict.valid {
            log_validation_failure!(
                method = %operation.method(),
                path,
                status,
                errors = verdict.errors.len(),
                "response does not match schema"
            );
        }
        Ok(verdict)
    }

    /// Validate a request body.
    ///
    /// Absent request schemas are common; they, and undocumented operations,
    /// pass with a note.
    pub fn validate_request(
        &self,
        path: &str,
        method: &str,
        body: &Value,
    ) -> Result<Verdict, ContractError> {
        let Some(schema) = self.index.request_schema(path, method) else {
            return Ok(Verdict::no_schema("No request schema defined"));
        };

        let verdict = self.check(&schema, body)?;
        if !verdict.valid {
            log_validation_failure!(
                method = %method.to_uppercase(),
                path,
                errors = verdict.errors.len(),
                "request does not match schema"
            );
        }
        Ok(verdict)
    }

    /// Number of schemas compiled so far.
    pub fn cached_schemas(&self) -> usize {
        self.cache.read().len()
    }

    fn check(&self, schema: &SchemaRef<'_>, body: &Value) -> Result<Verdict, ContractError> {
        let compiled = self.compiled(schema)?;
        let errors = compiled.validate(body);

        tracing::debug!(
            schema = %schema.pointer,
            valid = errors.is_empty(),
            "payload checked"
        );

        Ok(Verdict::checked(schema.schema, errors))
    }

    fn compiled(&self, schema: &SchemaRef<'_>) -> Result<Arc<CompiledSchema>, ContractError> {
        if let Some(hit) = self.cache.read().get(&schema.pointer) {
            return Ok(Arc::clone(hit));
        }

        // Concurrent misses may compile the same schema twice; first insert wins.
        let compiled = self
            .compiler
            .compile(schema.schema)
            .map_err(|e| ContractError::InvalidSchema {
                pointer: schema.pointer.clone(),
                reason: e.to_string(),
            })?;

        let mut cache = self.cache.write();
        let entry = cache
            .entry(schema.pointer.clone())
            .or_insert_with(|| Arc::new(compiled));
        Ok(Arc::clone(entry))
    }
}

impl std::fmt::Debug for ContractValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractValidator")
            .field("index", &self.index)
            .field("cached_schemas", &self.cached_schemas())
            .finish()
    }
}
