//! Stored record envelope.
//!
//! [`StoredEntity`] is what the store hands back: the record's attributes as
//! JSON plus the identity and timestamps the store owns.

use bench_domain::{Entity, EntityId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageResult;

/// A record with persistence metadata.
///
/// # Examples
///
/// ```
/// use bench_persistence::types::StoredEntity;
/// use serde_json::json;
///
/// let stored = StoredEntity::new("unit", 4, json!({"upsaId": "U-4", "name": "Delivery"}));
///
/// assert_eq!(stored.url(), "unit/4");
/// assert_eq!(stored.document()["id"], 4);
/// assert_eq!(stored.document()["upsaId"], "U-4");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntity {
    /// The record type (e.g. "unit", "benchHistory").
    entity_type: String,

    /// Store-assigned identity.
    id: EntityId,

    /// The record attributes, without `id`.
    content: Value,

    /// When the record was first saved.
    created_at: DateTime<Utc>,

    /// When the record was last saved.
    last_updated: DateTime<Utc>,
}

impl StoredEntity {
    /// Creates a stored record stamped with the current time.
    pub fn new(entity_type: impl Into<String>, id: EntityId, content: Value) -> Self {
        let now = Utc::now();
        Self::from_storage(entity_type, id, content, now, now)
    }

    /// Creates a stored record from values read back from a backend.
    pub fn from_storage(
        entity_type: impl Into<String>,
        id: EntityId,
        content: Value,
        created_at: DateTime<Utc>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
            content,
            created_at,
            last_updated,
        }
    }

    /// Returns the record type.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the identity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the attributes.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Returns when the record was first saved.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the record was last saved.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Returns `"{entity_type}/{id}"`.
    pub fn url(&self) -> String {
        format!("{}/{}", self.entity_type, self.id)
    }

    /// The attributes with `id` merged in, as indexed and as returned to clients.
    pub fn document(&self) -> Value {
        let mut doc = self.content.clone();
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("id".to_string(), Value::from(self.id));
        }
        doc
    }

    /// Converts into a typed record.
    pub fn into_entity<E: Entity>(self) -> StorageResult<E> {
        Ok(E::from_content(self.id, self.content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_domain::records::Location;
    use serde_json::json;

    #[test]
    fn test_into_entity_restores_id() {
        let stored = StoredEntity::new("location", 11, json!({"upsaId": "AAAAA", "name": "AAAAA"}));
        let location: Location = stored.into_entity().unwrap();
        assert_eq!(location.id, Some(11));
        assert_eq!(location.upsa_id.as_deref(), Some("AAAAA"));
    }

    #[test]
    fn test_document_overrides_stale_id() {
        let stored = StoredEntity::new("unit", 2, json!({"id": 99, "upsaId": "U"}));
        assert_eq!(stored.document()["id"], 2);
    }
}
