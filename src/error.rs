//! Error types for field bindings, queries and live updates
//!
//! Error codes:
//! - BIND_OUTPUT_CONVERSION (REJECT)
//! - BIND_STORE_CONVERSION (REJECT)
//! - BIND_VALIDATION_FAILED (REJECT)
//! - BIND_UNIQUE_VIOLATION (REJECT)
//! - BIND_SAVE_FAILED (ERROR)
//! - BIND_CONFIGURATION_MISSING (ERROR)
//! - BIND_STORE_FAILED (ERROR)
//! - BIND_UNKNOWN (ERROR)

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Severity levels for binding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The value or request was rejected; the caller can correct it
    Reject,
    /// An operational failure outside the caller's input
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Errors surfaced by field bindings, models, queries and saves.
///
/// Conversion and validation failures are returned to the immediate caller of
/// `set`, `validate` or `current_value`. Uniqueness failures are a kind of
/// validation failure and follow the same path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// The stored value could not be converted to the domain value
    #[error("Error while converting the stored value of '{attribute}': {reason}")]
    OutputConversion { attribute: String, reason: String },

    /// The domain value could not be converted to a storable value
    #[error("Error while converting the value of '{attribute}' to a stored one: {reason}")]
    StoreConversion { attribute: String, reason: String },

    /// A validation rule rejected the value
    #[error("Data validation error. {0}")]
    ValidationFailed(String),

    /// Another record already holds the value for a unique field
    #[error("A {model} with the value {value} for the field {field} already exists.")]
    UniqueConstraintViolated {
        field: String,
        value: String,
        model: String,
    },

    /// The owning context could not be saved
    #[error("Unable to save the context. {0}")]
    SaveFailure(String),

    /// No execution context was supplied and none is configured
    #[error("No context was provided and no default context is configured")]
    ConfigurationMissing,

    /// The backing store failed while executing a request
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// Unknown or not handled error
    #[error("Unknown or not handled error")]
    Unknown,
}

impl BindError {
    /// Create an output conversion error
    pub fn output_conversion(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        BindError::OutputConversion {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Create a store conversion error
    pub fn store_conversion(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        BindError::StoreConversion {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error
    pub fn validation(description: impl Into<String>) -> Self {
        BindError::ValidationFailed(description.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            BindError::OutputConversion { .. } => "BIND_OUTPUT_CONVERSION",
            BindError::StoreConversion { .. } => "BIND_STORE_CONVERSION",
            BindError::ValidationFailed(_) => "BIND_VALIDATION_FAILED",
            BindError::UniqueConstraintViolated { .. } => "BIND_UNIQUE_VIOLATION",
            BindError::SaveFailure(_) => "BIND_SAVE_FAILED",
            BindError::ConfigurationMissing => "BIND_CONFIGURATION_MISSING",
            BindError::Store(_) => "BIND_STORE_FAILED",
            BindError::Unknown => "BIND_UNKNOWN",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            BindError::OutputConversion { .. }
            | BindError::StoreConversion { .. }
            | BindError::ValidationFailed(_)
            | BindError::UniqueConstraintViolated { .. } => Severity::Reject,
            _ => Severity::Error,
        }
    }

    /// Returns true for validation failures, uniqueness included
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BindError::ValidationFailed(_) | BindError::UniqueConstraintViolated { .. }
        )
    }
}

/// Result type for binding operations
pub type BindResult<T> = Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BindError::output_conversion("name", "null").code(),
            "BIND_OUTPUT_CONVERSION"
        );
        assert_eq!(BindError::ConfigurationMissing.code(), "BIND_CONFIGURATION_MISSING");
        assert_eq!(BindError::Unknown.code(), "BIND_UNKNOWN");
    }

    #[test]
    fn test_unique_is_validation() {
        let err = BindError::UniqueConstraintViolated {
            field: "email".into(),
            value: "a@b.co".into(),
            model: "Player".into(),
        };
        assert!(err.is_validation());
        assert_eq!(err.severity(), Severity::Reject);
    }

    #[test]
    fn test_unique_display() {
        let err = BindError::UniqueConstraintViolated {
            field: "name".into(),
            value: "Donald".into(),
            model: "Player".into(),
        };
        assert_eq!(
            err.to_string(),
            "A Player with the value Donald for the field name already exists."
        );
    }

    #[test]
    fn test_save_failure_is_error() {
        let err = BindError::SaveFailure("disk full".into());
        assert_eq!(err.severity(), Severity::Error);
        assert!(err.to_string().contains("disk full"));
    }
}
