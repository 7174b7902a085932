//! Bench Tracking Persistence Layer
//!
//! This crate stores bench tracking records and keeps a query-string
//! searchable mirror of them.
//!
//! # Features
//!
//! - **Explicit transactions**: store writes only happen inside a
//!   [`StoreTransaction`](core::StoreTransaction) with a visible commit point
//! - **Search**: a Lucene-style query-string subset evaluated by every index
//!   backend
//! - **Divergence handling**: index writes happen after the store commits;
//!   [`IndexSyncPolicy`](service::IndexSyncPolicy) decides whether a failed
//!   mirror write is an error, and reindexing repairs it
//!
//! # Backend Features
//!
//! ```toml
//! [dependencies]
//! bench-persistence = { version = "0.1", features = ["elasticsearch"] }
//! ```
//!
//! - `sqlite` (default) - SQLite store and index, in-memory or file based
//! - `elasticsearch` - Elasticsearch index
//!
//! # Architecture
//!
//! - [`types`] - stored records, pagination and sorting
//! - [`error`] - error types for all operations
//! - [`core`] - store and index traits
//! - [`search`] - query-string parsing and reindexing
//! - [`service`] - the typed per-record-type service
//! - [`backends`] - backend implementations
//!
//! # Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use bench_domain::records::Location;
//! use bench_persistence::backends::sqlite::SqliteBackend;
//! use bench_persistence::service::EntityService;
//! use bench_persistence::types::PageRequest;
//!
//! let backend = Arc::new(SqliteBackend::in_memory()?);
//! backend.init_schema()?;
//!
//! let locations: EntityService<Location, _, _> =
//!     EntityService::new(backend.clone(), backend);
//!
//! let saved = locations.save(Location::new("AAAAA", "AAAAA")).await?;
//! let found = locations.search("upsaId:AAAAA", &PageRequest::default()).await?;
//! assert_eq!(found.content, vec![saved]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod search;
pub mod service;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use service::{EntityService, IndexSyncPolicy};
pub use types::{Page, PageRequest, StoredEntity};

// Re-export core traits
pub use core::{EntityStore, SearchIndex, StoreTransaction};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
