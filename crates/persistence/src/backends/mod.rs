//! Backend implementations.
//!
//! Each backend is gated behind a feature flag.
//!
//! | Backend | Feature | Provides |
//! |---------|---------|----------|
//! | SQLite | `sqlite` (default) | `EntityStore` and `SearchIndex` |
//! | Elasticsearch | `elasticsearch` | `SearchIndex` |
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! use bench_persistence::backends::sqlite::SqliteBackend;
//!
//! # #[cfg(feature = "sqlite")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // In-memory, for tests
//! let backend = SqliteBackend::in_memory()?;
//!
//! // Or a file-based database
//! let backend = SqliteBackend::open("./data/bench.db")?;
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;
