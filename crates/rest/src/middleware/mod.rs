//! HTTP middleware for the bench tracking REST API.
//!
//! - [`alert`] - renders response [`Alert`](crate::responses::Alert)s into
//!   application-named headers

pub mod alert;

pub use alert::alert_middleware;
