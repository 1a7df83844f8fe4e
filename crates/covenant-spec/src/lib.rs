//! OpenAPI document model and structural index.
//!
//! Wraps an already-fetched OpenAPI (or Swagger) document in an immutable
//! [`OpenApiDocument`] and answers structural queries over it through
//! [`SpecIndex`]: paths, methods, operations, declared status codes and the
//! JSON schemas attached to requests and responses.

pub mod error;
pub mod index;
pub mod model;

pub use error::DocumentError;
pub use index::{Operation, SchemaRef, SpecIndex, JSON_MEDIA_TYPE};
pub use model::{HttpMethod, Info, OpenApiDocument};
