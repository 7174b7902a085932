//! Error types for the bench tracking REST API.
//!
//! Every error is rendered as a JSON body and a failure alert:
//!
//! ```json
//! { "message": "error.validation", "description": "...", "fieldErrors": [ ... ] }
//! ```
//!
//! # Error Mapping
//!
//! Storage errors from the persistence layer are mapped to HTTP status codes
//! and error keys:
//!
//! | Storage Error | HTTP Status | Error Key |
//! |--------------|-------------|-----------|
//! | Resource NotFound | 404 | error.notfound |
//! | Validation InvalidEntity | 400 | error.validation |
//! | Validation UnknownField | 400 | error.badrequest |
//! | Search QueryParse | 400 | error.badquery |
//! | Search InvalidSort | 400 | error.badsort |
//! | IndexSync | 500 | error.indexsync |
//! | Transaction / Backend | 500 | error.internalServerError |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bench_domain::{EntityId, FieldError};
use bench_persistence::error::{
    ResourceError, SearchError, StorageError, TransactionError, ValidationError,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::responses::headers::Alert;

/// The primary error type for REST API operations.
#[derive(Debug, Error)]
pub enum RestError {
    /// A create request carried an id (HTTP 400).
    #[error("A new {entity_type} cannot already have an ID")]
    IdExists {
        /// The record type.
        entity_type: String,
    },

    /// Required fields are missing (HTTP 400).
    #[error("Invalid {entity_type}: {} field error(s)", .field_errors.len())]
    Validation {
        /// The record type.
        entity_type: String,
        /// Every offending field.
        field_errors: Vec<FieldError>,
    },

    /// The request body is not a valid record (HTTP 400).
    #[error("Invalid JSON body: {message}")]
    InvalidJson {
        /// The record type.
        entity_type: String,
        /// Parser message.
        message: String,
    },

    /// The search query does not parse (HTTP 400).
    #[error("Invalid search query: {message}")]
    InvalidQuery {
        /// Parser message.
        message: String,
    },

    /// A sort property is not a field of the record type (HTTP 400).
    #[error("Invalid sort property '{property}'")]
    InvalidSort {
        /// The record type, when known.
        entity_type: Option<String>,
        /// The rejected property.
        property: String,
    },

    /// Any other malformed request (HTTP 400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Record not found (HTTP 404).
    #[error("Record not found: {entity_type}/{id}")]
    NotFound {
        /// The record type.
        entity_type: String,
        /// The record id.
        id: EntityId,
    },

    /// The store committed but the search index write failed (HTTP 500).
    #[error("{entity_type}/{id} was stored but not indexed: {message}")]
    IndexSync {
        /// The record type.
        entity_type: String,
        /// The record id.
        id: EntityId,
        /// The index failure.
        message: String,
    },

    /// Internal server error (HTTP 500).
    #[error("Internal error: {message}")]
    InternalError {
        /// Error message.
        message: String,
    },
}

/// Result type alias for REST operations.
pub type RestResult<T> = Result<T, RestError>;

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: String,
    description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldError>,
}

impl RestError {
    /// Returns the HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::IdExists { .. }
            | RestError::Validation { .. }
            | RestError::InvalidJson { .. }
            | RestError::InvalidQuery { .. }
            | RestError::InvalidSort { .. }
            | RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::IndexSync { .. } | RestError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error key, without the `error.` prefix.
    pub fn key(&self) -> &'static str {
        match self {
            RestError::IdExists { .. } => "idexists",
            RestError::Validation { .. } => "validation",
            RestError::InvalidJson { .. } => "badjson",
            RestError::InvalidQuery { .. } => "badquery",
            RestError::InvalidSort { .. } => "badsort",
            RestError::BadRequest { .. } => "badrequest",
            RestError::NotFound { .. } => "notfound",
            RestError::IndexSync { .. } => "indexsync",
            RestError::InternalError { .. } => "internalServerError",
        }
    }

    /// Returns the record type the error is about, when known.
    pub fn entity_type(&self) -> Option<&str> {
        match self {
            RestError::IdExists { entity_type }
            | RestError::Validation { entity_type, .. }
            | RestError::InvalidJson { entity_type, .. }
            | RestError::NotFound { entity_type, .. }
            | RestError::IndexSync { entity_type, .. } => Some(entity_type),
            RestError::InvalidSort { entity_type, .. } => entity_type.as_deref(),
            RestError::InvalidQuery { .. }
            | RestError::BadRequest { .. }
            | RestError::InternalError { .. } => None,
        }
    }

    fn field_errors(&self) -> &[FieldError] {
        match self {
            RestError::Validation { field_errors, .. } => field_errors,
            _ => &[],
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let key = self.key();
        let body = ErrorBody {
            message: format!("error.{}", key),
            description: self.to_string(),
            field_errors: self.field_errors().to_vec(),
        };
        let alert = Alert::failure(self.entity_type().unwrap_or_default(), key);

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(alert);
        response
    }
}

// Implement conversions from storage errors

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(e) => e.into(),
            StorageError::Validation(e) => e.into(),
            StorageError::Search(e) => e.into(),
            StorageError::Transaction(e) => e.into(),
            StorageError::Backend(e) => RestError::InternalError {
                message: e.to_string(),
            },
            StorageError::IndexSync {
                entity_type,
                id,
                source,
            } => RestError::IndexSync {
                entity_type,
                id,
                message: source.to_string(),
            },
        }
    }
}

impl From<ResourceError> for RestError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound { entity_type, id } => RestError::NotFound { entity_type, id },
        }
    }
}

impl From<ValidationError> for RestError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidEntity {
                entity_type,
                field_errors,
            } => RestError::Validation {
                entity_type,
                field_errors,
            },
            ValidationError::UnknownField { .. } => RestError::BadRequest {
                message: err.to_string(),
            },
        }
    }
}

impl From<SearchError> for RestError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::QueryParse { message } => RestError::InvalidQuery { message },
            SearchError::InvalidSort {
                entity_type,
                property,
            } => RestError::InvalidSort {
                entity_type: (!entity_type.is_empty()).then_some(entity_type),
                property,
            },
        }
    }
}

impl From<TransactionError> for RestError {
    fn from(err: TransactionError) -> Self {
        RestError::InternalError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_persistence::error::BackendError;

    #[test]
    fn test_status_codes() {
        let not_found = RestError::NotFound {
            entity_type: "location".to_string(),
            id: 1,
        };
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.key(), "notfound");

        let id_exists = RestError::IdExists {
            entity_type: "location".to_string(),
        };
        assert_eq!(id_exists.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            id_exists.to_string(),
            "A new location cannot already have an ID"
        );
    }

    #[test]
    fn test_from_storage_not_found() {
        let err: RestError = StorageError::Resource(ResourceError::NotFound {
            entity_type: "unit".to_string(),
            id: 7,
        })
        .into();
        assert!(matches!(err, RestError::NotFound { id: 7, .. }));
        assert_eq!(err.entity_type(), Some("unit"));
    }

    #[test]
    fn test_from_storage_validation_keeps_field_errors() {
        let err: RestError = StorageError::Validation(ValidationError::InvalidEntity {
            entity_type: "unit".to_string(),
            field_errors: vec![FieldError::not_null("unit", "upsaId")],
        })
        .into();
        assert_eq!(err.key(), "validation");
        assert_eq!(err.field_errors().len(), 1);
    }

    #[test]
    fn test_from_search_errors() {
        let err: RestError = StorageError::Search(SearchError::QueryParse {
            message: "unterminated quote".to_string(),
        })
        .into();
        assert_eq!(err.key(), "badquery");

        let err: RestError = SearchError::InvalidSort {
            entity_type: String::new(),
            property: "name,sideways".to_string(),
        }
        .into();
        assert_eq!(err.entity_type(), None);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_index_sync_is_server_error() {
        let err: RestError = StorageError::IndexSync {
            entity_type: "location".to_string(),
            id: 3,
            source: Box::new(StorageError::Backend(BackendError::Unavailable {
                backend_name: "elasticsearch".to_string(),
                message: "connection refused".to_string(),
            })),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.key(), "indexsync");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_error_response_carries_failure_alert() {
        let response = RestError::IdExists {
            entity_type: "location".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let alert = response.extensions().get::<Alert>().unwrap();
        assert_eq!(alert, &Alert::failure("location", "idexists"));
    }
}
