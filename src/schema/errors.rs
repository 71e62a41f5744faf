//! Schema error types
//!
//! Error codes:
//! - SCHEMA_UNKNOWN_ATTRIBUTE
//! - SCHEMA_KIND_MISMATCH
//! - SCHEMA_OPTIONALITY_MISMATCH
//! - SCHEMA_RECORD_INVALID

use thiserror::Error;

/// Registration-table and record conformance errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Attribute '{attribute}' is not registered on {entity}")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("Attribute '{attribute}' of {entity} is {expected}, not {found}")]
    KindMismatch {
        entity: String,
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Attribute '{attribute}' of {entity} has optional = {optional}")]
    OptionalityMismatch {
        entity: String,
        attribute: String,
        optional: bool,
    },

    #[error("Record of {entity} is invalid at '{attribute}': {reason}")]
    RecordInvalid {
        entity: String,
        attribute: String,
        reason: String,
    },
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::UnknownAttribute { .. } => "SCHEMA_UNKNOWN_ATTRIBUTE",
            SchemaError::KindMismatch { .. } => "SCHEMA_KIND_MISMATCH",
            SchemaError::OptionalityMismatch { .. } => "SCHEMA_OPTIONALITY_MISMATCH",
            SchemaError::RecordInvalid { .. } => "SCHEMA_RECORD_INVALID",
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
