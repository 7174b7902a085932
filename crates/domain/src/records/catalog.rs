//! Code-list records keyed by an external UPSA identifier.

use serde::{Deserialize, Serialize};

use crate::{EntityId, FieldKind, FieldSpec, impl_entity};

macro_rules! upsa_record {
    ($(#[$meta:meta])* $ty:ident, $entity_type:literal, $path:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $ty {
            /// Store-assigned identity.
            pub id: Option<EntityId>,
            /// External UPSA identifier.
            pub upsa_id: Option<String>,
            /// Display name.
            pub name: Option<String>,
        }

        impl $ty {
            /// Creates an unsaved record.
            pub fn new(upsa_id: impl Into<String>, name: impl Into<String>) -> Self {
                Self {
                    id: None,
                    upsa_id: Some(upsa_id.into()),
                    name: Some(name.into()),
                }
            }
        }

        impl_entity!($ty, $entity_type, $path, [
            FieldSpec::required("upsaId", FieldKind::String),
            FieldSpec::optional("name", FieldKind::String),
        ]);
    };
}

upsa_record!(
    /// A job function an employee can hold.
    JobFunction,
    "jobFunction",
    "job-functions"
);

upsa_record!(
    /// An office location.
    Location,
    "location",
    "locations"
);

upsa_record!(
    /// A position open on an opportunity.
    OpportunityPosition,
    "opportunityPosition",
    "opportunity-positions"
);

upsa_record!(
    /// A category of project.
    ProjectCategory,
    "projectCategory",
    "project-categories"
);

upsa_record!(
    /// An organisational unit.
    Unit,
    "unit",
    "units"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entity;

    #[test]
    fn test_missing_upsa_id_is_rejected() {
        let location = Location {
            id: None,
            upsa_id: None,
            name: Some("Minsk".to_string()),
        };
        let err = location.validate().unwrap_err();
        match err {
            crate::DomainError::Validation { field_errors, .. } => {
                assert_eq!(field_errors.len(), 1);
                assert_eq!(field_errors[0].field, "upsaId");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_name_is_optional() {
        let unit = Unit {
            id: None,
            upsa_id: Some("U-1".to_string()),
            name: None,
        };
        assert!(unit.validate().is_ok());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let mut category = ProjectCategory::new("PC-1", "Internal");
        category.set_id(3);
        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["upsaId"], "PC-1");
        assert_eq!(json["name"], "Internal");
    }
}
