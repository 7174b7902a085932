//! The [`Entity`] trait and field schemas.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DomainError, FieldError};

/// Server-assigned record identity.
pub type EntityId = i64;

/// The scalar kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    String,
    /// `true` / `false`.
    Boolean,
    /// RFC 3339 timestamp.
    Timestamp,
    /// The id of another record.
    Reference,
}

/// Schema entry for one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON name of the field.
    pub name: &'static str,
    /// Scalar kind.
    pub kind: FieldKind,
    /// Whether the field must be present and non-null.
    pub required: bool,
}

impl FieldSpec {
    /// A field that must be present.
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// A field that may be absent or null.
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// A persisted record type.
///
/// Implementations are generated by [`impl_entity!`](crate::impl_entity) from
/// a short schema declaration; the storage, search and HTTP layers only ever
/// talk to records through this trait.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Singular camelCase name, used as the storage key and in alert headers.
    const ENTITY_TYPE: &'static str;

    /// Plural hyphenated REST path segment.
    const RESOURCE_PATH: &'static str;

    /// Scalar attributes, excluding `id`.
    const FIELDS: &'static [FieldSpec];

    /// Returns the identity, if the record has been persisted.
    fn id(&self) -> Option<EntityId>;

    /// Assigns the identity.
    fn set_id(&mut self, id: EntityId);

    /// Removes the identity.
    fn clear_id(&mut self);

    /// Checks that every required field is present and non-null.
    fn validate(&self) -> Result<(), DomainError> {
        let value = serde_json::to_value(self)?;
        let field_errors: Vec<FieldError> = Self::FIELDS
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| value.get(spec.name).is_none_or(Value::is_null))
            .map(|spec| FieldError::not_null(Self::ENTITY_TYPE, spec.name))
            .collect();

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation {
                entity_type: Self::ENTITY_TYPE.to_string(),
                field_errors,
            })
        }
    }

    /// Serialises the scalar attributes, without the `id` member.
    fn to_content(&self) -> Result<Value, DomainError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("id");
        }
        Ok(value)
    }

    /// Rebuilds a record from stored content and its identity.
    fn from_content(id: EntityId, content: Value) -> Result<Self, DomainError> {
        let mut content = content;
        match content.as_object_mut() {
            Some(obj) => {
                obj.insert("id".to_string(), Value::from(id));
            }
            None => {
                return Err(DomainError::Serialization {
                    message: format!(
                        "stored {} {} is not a JSON object",
                        Self::ENTITY_TYPE,
                        id
                    ),
                });
            }
        }
        Ok(serde_json::from_value(content)?)
    }

    /// Looks up a field schema by JSON name.
    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|spec| spec.name == name)
    }
}

/// Implements [`Entity`], identity-based `PartialEq` and `Hash` for a record
/// struct with an `id: Option<EntityId>` member.
///
/// ```ignore
/// impl_entity!(Location, "location", "locations", [
///     FieldSpec::required("upsaId", FieldKind::String),
///     FieldSpec::optional("name", FieldKind::String),
/// ]);
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($ty:ident, $entity_type:literal, $path:literal, [$($field:expr),* $(,)?]) => {
        impl $crate::Entity for $ty {
            const ENTITY_TYPE: &'static str = $entity_type;
            const RESOURCE_PATH: &'static str = $path;
            const FIELDS: &'static [$crate::FieldSpec] = &[$($field),*];

            fn id(&self) -> Option<$crate::EntityId> {
                self.id
            }

            fn set_id(&mut self, id: $crate::EntityId) {
                self.id = Some(id);
            }

            fn clear_id(&mut self) {
                self.id = None;
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
            }
        }

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
    };
}
