//! Core types for the persistence layer.
//!
//! - [`StoredEntity`] - a record with persistence metadata
//! - [`PageRequest`], [`Page`] - offset pagination and sorting
//!
//! # Examples
//!
//! ```
//! use bench_persistence::types::{PageRequest, SortDirection};
//!
//! let request = PageRequest::new(2, 20).with_sort("name", SortDirection::Desc);
//! assert_eq!(request.offset(), 40);
//! ```

mod pagination;
mod stored_entity;

pub use pagination::{Page, PageRequest, SortDirection, SortOrder};
pub use stored_entity::StoredEntity;
