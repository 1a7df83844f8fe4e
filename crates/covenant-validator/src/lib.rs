//! Contract validation for OpenAPI-described services.
//!
//! Given an [`OpenApiDocument`](covenant_spec::OpenApiDocument) and a captured
//! exchange (path, method, status, body), decides whether the payload conforms
//! to the schema the document declares for it. Schema mismatches are returned
//! as data in a [`Verdict`]; only asking about an operation the document never
//! declares is an error.

pub mod compiler;
pub mod validator;
pub mod verdict;

pub use compiler::{CompileError, CompiledSchema, SchemaCompiler};
pub use validator::{ContractError, ContractValidator};
pub use verdict::{SchemaViolation, Verdict};
