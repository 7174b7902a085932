//! Error types for record validation and conversion.

use serde::Serialize;
use thiserror::Error;

/// Errors raised while validating or converting a record.
#[derive(Error, Debug)]
pub enum DomainError {
    /// One or more required fields are missing.
    #[error("validation failed for {entity_type}: {}", summarize(.field_errors))]
    Validation {
        /// The record type that failed validation.
        entity_type: String,
        /// Every offending field.
        field_errors: Vec<FieldError>,
    },

    /// The record could not be converted to or from JSON.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// The record type the field belongs to.
    pub object_name: String,
    /// JSON name of the field.
    pub field: String,
    /// Constraint that was violated (for example `NotNull`).
    pub message: String,
}

impl FieldError {
    /// Creates a `NotNull` violation for a field.
    pub fn not_null(object_name: &str, field: &str) -> Self {
        Self {
            object_name: object_name.to_string(),
            field: field.to_string(),
            message: "NotNull".to_string(),
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization {
            message: err.to_string(),
        }
    }
}
