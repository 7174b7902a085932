//! HTTP request handlers.
//!
//! Every record handler is generic over the record type `E`, the store `S`
//! and the search index `I`, and is instantiated once per record type by
//! [`routing`](crate::routing).
//!
//! - [`create`] - `POST /{entities}`
//! - [`update`] - `PUT /{entities}`
//! - [`read`] - `GET /{entities}` and `GET /{entities}/{id}`
//! - [`delete`] - `DELETE /{entities}/{id}`
//! - [`search`] - `GET /_search/{entities}?query=`
//! - [`bench`] - `GET /employees/{id}/bench-histories`
//! - [`reindex`] - `POST /_reindex/{entities}` and `POST /_reindex`
//! - [`health`] - health, liveness and readiness probes

pub mod bench;
pub mod create;
pub mod delete;
pub mod health;
pub mod read;
pub mod reindex;
pub mod search;
pub mod update;

// Re-export handlers for convenience
pub use bench::employee_histories_handler;
pub use create::create_handler;
pub use delete::delete_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use read::{list_handler, read_handler};
pub use reindex::{reindex_all_handler, reindex_handler};
pub use search::search_handler;
pub use update::update_handler;
