//! Store error types
//!
//! Error codes:
//! - STORE_DETACHED
//! - STORE_RECORD_NOT_FOUND
//! - STORE_INVALID_PATTERN
//! - STORE_SCHEMA_VIOLATION
//! - STORE_IO
//! - STORE_SERIALIZATION
//! - STORE_LOCK_POISONED

use thiserror::Error;

use super::record::RecordId;

/// Errors raised by a store context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The record's owning context no longer exists
    #[error("Record is not attached to a live context")]
    Detached,

    /// No record with this identity exists in the context
    #[error("Record {0} not found")]
    RecordNotFound(RecordId),

    /// A MATCHES operand is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A pending record does not conform to its entity schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Persistence I/O failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Persisted state could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A store table lock was poisoned by a panicking writer
    #[error("Lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Detached => "STORE_DETACHED",
            StoreError::RecordNotFound(_) => "STORE_RECORD_NOT_FOUND",
            StoreError::InvalidPattern { .. } => "STORE_INVALID_PATTERN",
            StoreError::SchemaViolation(_) => "STORE_SCHEMA_VIOLATION",
            StoreError::Io(_) => "STORE_IO",
            StoreError::Serialization(_) => "STORE_SERIALIZATION",
            StoreError::LockPoisoned => "STORE_LOCK_POISONED",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(StoreError::Detached.code(), "STORE_DETACHED");
        assert_eq!(StoreError::LockPoisoned.code(), "STORE_LOCK_POISONED");
    }

    #[test]
    fn test_io_conversion() {
        let err: StoreError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, StoreError::Io(ref m) if m.contains("missing")));
    }
}
