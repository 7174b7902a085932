//! Route configuration for the bench tracking REST API.

pub mod entity_routes;

pub use entity_routes::{create_routes, entity_routes};
