//! Error types for the Ownership Kernel Core.

use thiserror::Error;

/// Core errors that can occur while deriving identities or handling fields.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed type name: {0:?}")]
    MalformedTypeName(String),

    #[error("not a module witness: {0}")]
    NotAWitness(String),

    #[error("dynamic field already exists: {name} ({type_name})")]
    FieldExists { name: String, type_name: String },

    #[error("dynamic field not found: {name} ({type_name})")]
    FieldNotFound { name: String, type_name: String },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}
