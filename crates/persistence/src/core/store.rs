//! Record store trait.

use async_trait::async_trait;
use bench_domain::{EntityId, FieldSpec};
use serde_json::Value;

use crate::error::StorageResult;
use crate::types::{Page, PageRequest, StoredEntity};

/// Durable storage for records of every type.
///
/// Reads go straight to the store. Writes only exist on the
/// [`StoreTransaction`] returned by [`begin`](EntityStore::begin), so every
/// mutation has an explicit commit point.
///
/// # Example
///
/// ```ignore
/// let mut tx = store.begin().await?;
/// let stored = tx.save("unit", None, json!({"upsaId": "U-1"})).await?;
/// Box::new(tx).commit().await?;
///
/// let read = store.find_by_id("unit", stored.id()).await?;
/// assert!(read.is_some());
/// ```
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    /// The transaction type returned by this store.
    type Transaction: StoreTransaction;

    /// Returns a human-readable name for this store.
    fn backend_name(&self) -> &'static str;

    /// Begins a write transaction.
    async fn begin(&self) -> StorageResult<Self::Transaction>;

    /// Reads one record.
    async fn find_by_id(&self, entity_type: &str, id: EntityId)
    -> StorageResult<Option<StoredEntity>>;

    /// Reads one page of records.
    ///
    /// # Errors
    ///
    /// * `StorageError::Search(InvalidSort)` - a sort property is neither `id`
    ///   nor one of `fields`
    async fn find_page(
        &self,
        entity_type: &str,
        fields: &[FieldSpec],
        request: &PageRequest,
    ) -> StorageResult<Page<StoredEntity>>;

    /// Reads every record whose `field` equals `value`, ordered by id.
    async fn find_by_field(
        &self,
        entity_type: &str,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<StoredEntity>>;

    /// Counts records of a type.
    async fn count(&self, entity_type: &str) -> StorageResult<u64>;

    /// Checks that the store can serve requests.
    async fn health_check(&self) -> StorageResult<()>;
}

/// An open write transaction on an [`EntityStore`].
///
/// Dropping a transaction without calling [`commit`](StoreTransaction::commit)
/// rolls it back.
#[async_trait]
pub trait StoreTransaction: Send + Sync {
    /// Inserts (`id` is `None`) or fully replaces (`id` is `Some`) a record.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - `id` is set but no record of
    ///   this type has it
    async fn save(
        &mut self,
        entity_type: &str,
        id: Option<EntityId>,
        content: Value,
    ) -> StorageResult<StoredEntity>;

    /// Removes a record. Returns false if there was nothing to remove.
    async fn delete(&mut self, entity_type: &str, id: EntityId) -> StorageResult<bool>;

    /// Commits the transaction, persisting all changes.
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Rolls back the transaction, discarding all changes.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;

    /// Returns whether this transaction is still active.
    fn is_active(&self) -> bool;
}
