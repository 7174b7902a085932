//! Error types for the persistence layer.
//!
//! Errors are grouped the same way the callers need to react to them: record
//! state, validation, search, transactions, backend faults, and the special
//! case of a store write that committed but never reached the search index.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use bench_domain::{DomainError, EntityId, FieldError};
use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Search operation errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Transaction errors
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The store committed but the search index write failed.
    #[error("{entity_type}/{id} was stored but the search index was not updated: {source}")]
    IndexSync {
        entity_type: String,
        id: EntityId,
        #[source]
        source: Box<StorageError>,
    },
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested record was not found.
    #[error("record not found: {entity_type}/{id}")]
    NotFound { entity_type: String, id: EntityId },
}

/// Errors related to record validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// One or more required fields are missing.
    #[error("invalid {entity_type}: {} field error(s)", .field_errors.len())]
    InvalidEntity {
        entity_type: String,
        field_errors: Vec<FieldError>,
    },

    /// The field does not exist on the record type or has the wrong kind.
    #[error("unknown field '{field}' on {entity_type}")]
    UnknownField { entity_type: String, field: String },
}

/// Errors related to search and listing.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query string could not be parsed.
    #[error("failed to parse search query: {message}")]
    QueryParse { message: String },

    /// The sort property is not a field of the record type.
    #[error("invalid sort property '{property}' for {entity_type}")]
    InvalidSort {
        entity_type: String,
        property: String,
    },
}

/// Errors related to transactions.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// Transaction was rolled back.
    #[error("transaction rolled back: {reason}")]
    RolledBack { reason: String },

    /// Transaction is no longer valid (already committed or rolled back).
    #[error("transaction no longer valid")]
    InvalidTransaction,
}

/// Errors originating from a store or index backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Returns true if this error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }
}

impl From<DomainError> for StorageError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation {
                entity_type,
                field_errors,
            } => StorageError::Validation(ValidationError::InvalidEntity {
                entity_type,
                field_errors,
            }),
            DomainError::Serialization { message } => {
                StorageError::Backend(BackendError::SerializationError { message })
            }
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}
