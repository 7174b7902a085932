//! SQLite backend implementation.
//!
//! [`SqliteBackend`] implements both [`EntityStore`](crate::core::EntityStore)
//! and [`SearchIndex`](crate::core::SearchIndex). It supports in-memory
//! databases (for tests and demos) and file-based databases.
//!
//! # Example
//!
//! ```no_run
//! use bench_persistence::backends::sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::open("bench.db")?;
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! -- Record store
//! CREATE TABLE entities (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     entity_type TEXT NOT NULL,
//!     content TEXT NOT NULL,       -- JSON attributes, without id
//!     created_at TEXT NOT NULL,    -- RFC 3339
//!     last_updated TEXT NOT NULL
//! );
//!
//! -- Search index
//! CREATE TABLE search_documents (entity_type, id, data, indexed_at);
//! CREATE TABLE search_terms (entity_type, id, field, token);
//! CREATE TABLE search_fields (entity_type, id, field, value);
//! ```
//!
//! The search tables are written outside store transactions, each index
//! write in its own short transaction.

mod backend;
mod index;
pub mod query_builder;
mod schema;
mod store;
mod transaction;

use chrono::{DateTime, Utc};

use crate::error::{BackendError, StorageError, StorageResult};

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use schema::SCHEMA_VERSION;
pub use transaction::SqliteTransaction;

pub(crate) fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

pub(crate) fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

pub(crate) fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| internal_error(format!("Invalid stored timestamp '{}': {}", value, e)))
}
