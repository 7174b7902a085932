//! Concrete record types.
//!
//! Reference data (units, locations, job functions and so on) is a small
//! code list keyed by an external UPSA identifier or by name; bench history
//! and bench predictions are the transactional records.

mod bench;
mod catalog;
mod employee;
mod status;

pub use bench::{BenchHistory, BenchPredictions};
pub use catalog::{JobFunction, Location, OpportunityPosition, ProjectCategory, Unit};
pub use employee::Employee;
pub use status::{OpportunityType, ProbationStatus, ProductionStatus};

use crate::Entity;

/// The `ENTITY_TYPE` of every record type.
pub const ENTITY_TYPES: &[&str] = &[
    BenchHistory::ENTITY_TYPE,
    BenchPredictions::ENTITY_TYPE,
    Employee::ENTITY_TYPE,
    JobFunction::ENTITY_TYPE,
    Location::ENTITY_TYPE,
    OpportunityPosition::ENTITY_TYPE,
    OpportunityType::ENTITY_TYPE,
    ProbationStatus::ENTITY_TYPE,
    ProductionStatus::ENTITY_TYPE,
    ProjectCategory::ENTITY_TYPE,
    Unit::ENTITY_TYPE,
];
