//! # bench-domain
//!
//! Record types for the bench tracking backend: employee bench history,
//! bench predictions, production and probation statuses, locations,
//! opportunities, job functions and the organisational units they hang off.
//!
//! Every record is a flat bag of scalar attributes plus a server-assigned
//! [`EntityId`]. The [`Entity`] trait carries the schema of a record type
//! (its name, its REST path and its fields) so that storage, search and the
//! HTTP layer can be written once and instantiated per type.
//!
//! ```
//! use bench_domain::{Entity, records::Location};
//!
//! let location = Location::new("AAAAA", "AAAAA");
//! assert!(location.id().is_none());
//! assert!(location.validate().is_ok());
//! assert_eq!(Location::RESOURCE_PATH, "locations");
//! ```
//!
//! ## Identity
//!
//! Two records are equal only when both carry an id and the ids match. A
//! record without an id is not equal to anything, not even a clone of itself.
//!
//! ```
//! use bench_domain::{Entity, records::Unit};
//!
//! let mut a = Unit::new("U-1", "Delivery");
//! let b = a.clone();
//! assert_ne!(a, b);
//!
//! a.set_id(7);
//! let mut c = Unit::new("U-2", "Other");
//! c.set_id(7);
//! assert_eq!(a, c);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod entity;
mod error;
pub mod records;

pub use entity::{Entity, EntityId, FieldKind, FieldSpec};
pub use error::{DomainError, FieldError};
