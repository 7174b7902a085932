//! Storage traits.
//!
//! - [`EntityStore`] - durable record storage with explicit transactions
//! - [`SearchIndex`] - the query-string searchable mirror of the store
//!
//! Both are keyed by record type name and identity and deal in JSON; the
//! typed layer on top is [`EntityService`](crate::service::EntityService).

mod index;
mod store;

pub use index::SearchIndex;
pub use store::{EntityStore, StoreTransaction};
