//! Response building for the bench tracking REST API.
//!
//! - [`headers`] - pagination and alert headers

pub mod headers;

pub use headers::{Alert, X_TOTAL_COUNT, pagination_headers};
