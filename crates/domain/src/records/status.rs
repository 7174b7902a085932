//! Name-only status and type records.

use serde::{Deserialize, Serialize};

use crate::{EntityId, FieldKind, FieldSpec, impl_entity};

macro_rules! named_record {
    ($(#[$meta:meta])* $ty:ident, $entity_type:literal, $path:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $ty {
            /// Store-assigned identity.
            pub id: Option<EntityId>,
            /// Display name.
            pub name: Option<String>,
        }

        impl $ty {
            /// Creates an unsaved record.
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    id: None,
                    name: Some(name.into()),
                }
            }
        }

        impl_entity!($ty, $entity_type, $path, [
            FieldSpec::required("name", FieldKind::String),
        ]);
    };
}

named_record!(
    /// The kind of a staffing opportunity.
    OpportunityType,
    "opportunityType",
    "opportunity-types"
);

named_record!(
    /// Probation state of an employee.
    ProbationStatus,
    "probationStatus",
    "probation-statuses"
);

named_record!(
    /// Production (billable) state of an employee.
    ProductionStatus,
    "productionStatus",
    "production-statuses"
);
