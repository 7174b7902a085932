//! Query-string search.
//!
//! - [`SearchQuery`] - the parsed query string shared by every index backend
//! - [`reindex_type`] - rebuilds one record type's index documents from the store

mod query;
mod reindex;

pub use query::{MAX_NESTING, QueryNode, SearchQuery, TermValue, tokenize};
pub use reindex::{DEFAULT_BATCH_SIZE, ReindexFailure, ReindexReport, reindex_type};
