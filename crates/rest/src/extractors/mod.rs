//! Axum extractors for the bench tracking REST API.
//!
//! - [`Pagination`] - `page`, `size` and repeated `sort` query parameters
//! - [`SearchText`] - the `query` parameter of the search endpoints
//! - [`EntityBody`] - a record parsed from the JSON request body
//! - [`IdPath`] - the numeric `{id}` path segment

mod entity_body;
mod id_path;
mod pagination;

pub use entity_body::EntityBody;
pub use id_path::IdPath;
pub use pagination::{Pagination, SearchText};
