//! Search index trait.

use async_trait::async_trait;
use bench_domain::{EntityId, FieldSpec};
use serde_json::Value;

use crate::error::StorageResult;
use crate::search::SearchQuery;
use crate::types::{Page, PageRequest, StoredEntity};

/// A secondary, query-string searchable copy of stored records.
///
/// The index is written after the store commits and is never part of a store
/// transaction, so it can lag behind or diverge from the store. Documents are
/// the record attributes with `id` merged in.
#[async_trait]
pub trait SearchIndex: Send + Sync + 'static {
    /// Returns a human-readable name for this index.
    fn backend_name(&self) -> &'static str;

    /// Adds or replaces the document for a stored record.
    async fn index(&self, entity: &StoredEntity) -> StorageResult<()>;

    /// Removes a document. Removing an absent document is not an error.
    async fn delete(&self, entity_type: &str, id: EntityId) -> StorageResult<()>;

    /// Runs a parsed query against one record type.
    ///
    /// `fields` is the record schema; sort properties are checked against it.
    async fn search(
        &self,
        entity_type: &str,
        fields: &[FieldSpec],
        query: &SearchQuery,
        request: &PageRequest,
    ) -> StorageResult<Page<Value>>;

    /// Whether a document exists.
    async fn exists(&self, entity_type: &str, id: EntityId) -> StorageResult<bool>;

    /// Removes every document of a type. Returns how many were removed, when known.
    async fn clear(&self, entity_type: &str) -> StorageResult<u64>;

    /// Checks that the index can serve requests.
    async fn health_check(&self) -> StorageResult<()>;
}
