//! Per-record-type service over a store and a search index.
//!
//! [`EntityService`] is the unit of consistency between the two adapters.
//! Every write commits to the store first, inside an explicit store
//! transaction, and is then mirrored into the index as a separate operation.
//! A failure between the two leaves the index stale; what the caller sees in
//! that case is chosen by [`IndexSyncPolicy`], and
//! [`reindex`](EntityService::reindex) repairs it.

use std::marker::PhantomData;
use std::sync::Arc;

use bench_domain::{Entity, EntityId, FieldKind};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{EntityStore, SearchIndex, StoreTransaction};
use crate::error::{StorageError, StorageResult, ValidationError};
use crate::search::{DEFAULT_BATCH_SIZE, ReindexReport, SearchQuery, reindex_type};
use crate::types::{Page, PageRequest};

/// What to do when the index write fails after the store has committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexSyncPolicy {
    /// Return `StorageError::IndexSync`. The store write is kept.
    #[default]
    Propagate,
    /// Log the failure and return the store result.
    BestEffort,
}

impl std::str::FromStr for IndexSyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "propagate" => Ok(IndexSyncPolicy::Propagate),
            "best-effort" | "best_effort" | "besteffort" => Ok(IndexSyncPolicy::BestEffort),
            other => Err(format!(
                "unknown index sync policy '{}', expected 'propagate' or 'best-effort'",
                other
            )),
        }
    }
}

/// Store and index operations for one record type.
///
/// # Example
///
/// ```no_run
/// # #[cfg(feature = "sqlite")]
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use std::sync::Arc;
/// use bench_domain::records::Location;
/// use bench_persistence::backends::sqlite::SqliteBackend;
/// use bench_persistence::service::EntityService;
///
/// let backend = Arc::new(SqliteBackend::in_memory()?);
/// backend.init_schema()?;
///
/// let service: EntityService<Location, _, _> =
///     EntityService::new(backend.clone(), backend.clone());
/// let saved = service.save(Location::new("AAAAA", "AAAAA")).await?;
/// assert!(saved.id.is_some());
/// # Ok(())
/// # }
/// ```
pub struct EntityService<E, S, I>
where
    S: ?Sized,
    I: ?Sized,
{
    store: Arc<S>,
    index: Arc<I>,
    policy: IndexSyncPolicy,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S: ?Sized, I: ?Sized> Clone for EntityService<E, S, I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: Arc::clone(&self.index),
            policy: self.policy,
            _entity: PhantomData,
        }
    }
}

impl<E, S: ?Sized, I: ?Sized> std::fmt::Debug for EntityService<E, S, I>
where
    E: Entity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityService")
            .field("entity_type", &E::ENTITY_TYPE)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<E, S, I> EntityService<E, S, I>
where
    E: Entity,
    S: EntityStore + ?Sized,
    I: SearchIndex + ?Sized,
{
    /// Creates a service with the default [`IndexSyncPolicy`].
    pub fn new(store: Arc<S>, index: Arc<I>) -> Self {
        Self {
            store,
            index,
            policy: IndexSyncPolicy::default(),
            _entity: PhantomData,
        }
    }

    /// Sets the index mirroring policy.
    pub fn with_policy(mut self, policy: IndexSyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the index mirroring policy.
    pub fn policy(&self) -> IndexSyncPolicy {
        self.policy
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the index.
    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Creates (no id) or fully replaces (id set) a record.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation(InvalidEntity)` - a required field is missing
    /// * `StorageError::Resource(NotFound)` - the id does not exist
    /// * `StorageError::IndexSync` - stored, but the index write failed
    ///   (only with [`IndexSyncPolicy::Propagate`])
    pub async fn save(&self, entity: E) -> StorageResult<E> {
        entity.validate()?;
        let id = entity.id();
        let content = entity.to_content()?;

        debug!(entity_type = E::ENTITY_TYPE, ?id, "Request to save");

        let mut tx = self.store.begin().await?;
        let stored = tx.save(E::ENTITY_TYPE, id, content).await?;
        Box::new(tx).commit().await?;

        if let Err(e) = self.index.index(&stored).await {
            self.index_failed(stored.id(), e)?;
        }

        stored.into_entity()
    }

    /// Reads one page from the store.
    pub async fn find_all(&self, request: &PageRequest) -> StorageResult<Page<E>> {
        debug!(
            entity_type = E::ENTITY_TYPE,
            page = request.page,
            size = request.size,
            "Request to get all"
        );

        self.store
            .find_page(E::ENTITY_TYPE, E::FIELDS, request)
            .await?
            .try_map(|stored| stored.into_entity())
    }

    /// Reads one record from the store. A miss is `Ok(None)`.
    pub async fn find_one(&self, id: EntityId) -> StorageResult<Option<E>> {
        debug!(entity_type = E::ENTITY_TYPE, id, "Request to get");

        self.store
            .find_by_id(E::ENTITY_TYPE, id)
            .await?
            .map(|stored| stored.into_entity())
            .transpose()
    }

    /// Removes a record from the store, then from the index.
    ///
    /// Deleting an absent id succeeds. Returns whether the store held it.
    pub async fn delete(&self, id: EntityId) -> StorageResult<bool> {
        debug!(entity_type = E::ENTITY_TYPE, id, "Request to delete");

        let mut tx = self.store.begin().await?;
        let removed = tx.delete(E::ENTITY_TYPE, id).await?;
        Box::new(tx).commit().await?;

        if let Err(e) = self.index.delete(E::ENTITY_TYPE, id).await {
            self.index_failed(id, e)?;
        }

        Ok(removed)
    }

    /// Runs a query-string search against the index.
    ///
    /// # Errors
    ///
    /// * `StorageError::Search(QueryParse)` - the query does not parse
    /// * `StorageError::Search(InvalidSort)` - unknown sort property
    pub async fn search(&self, query: &str, request: &PageRequest) -> StorageResult<Page<E>> {
        debug!(entity_type = E::ENTITY_TYPE, query, "Request to search");

        let query = SearchQuery::parse(query)?;
        self.index
            .search(E::ENTITY_TYPE, E::FIELDS, &query, request)
            .await?
            .try_map(document_into_entity::<E>)
    }

    /// Reads every record whose reference field points at `id`, ordered by id.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation(UnknownField)` - `field` is not a reference
    ///   field of this record type
    pub async fn find_by_reference(&self, field: &str, id: EntityId) -> StorageResult<Vec<E>> {
        match E::field(field) {
            Some(spec) if spec.kind == FieldKind::Reference => {}
            _ => {
                return Err(StorageError::Validation(ValidationError::UnknownField {
                    entity_type: E::ENTITY_TYPE.to_string(),
                    field: field.to_string(),
                }));
            }
        }

        self.store
            .find_by_field(E::ENTITY_TYPE, field, &Value::from(id))
            .await?
            .into_iter()
            .map(|stored| stored.into_entity())
            .collect()
    }

    /// Rebuilds this record type's index from the store.
    pub async fn reindex(&self) -> StorageResult<ReindexReport> {
        reindex_type(
            self.store.as_ref(),
            self.index.as_ref(),
            E::ENTITY_TYPE,
            DEFAULT_BATCH_SIZE,
        )
        .await
    }

    fn index_failed(&self, id: EntityId, error: StorageError) -> StorageResult<()> {
        warn!(
            entity_type = E::ENTITY_TYPE,
            id,
            index = self.index.backend_name(),
            error = %error,
            "Search index out of sync with store"
        );

        match self.policy {
            IndexSyncPolicy::Propagate => Err(StorageError::IndexSync {
                entity_type: E::ENTITY_TYPE.to_string(),
                id,
                source: Box::new(error),
            }),
            IndexSyncPolicy::BestEffort => Ok(()),
        }
    }
}

/// Converts an index document (attributes plus `id`) into a record.
fn document_into_entity<E: Entity>(mut document: Value) -> StorageResult<E> {
    let id = document
        .as_object_mut()
        .and_then(|obj| obj.remove("id"))
        .and_then(|id| id.as_i64());

    match id {
        Some(id) => Ok(E::from_content(id, document)?),
        None => Err(StorageError::Backend(
            crate::error::BackendError::SerializationError {
                message: format!("{} search document has no id", E::ENTITY_TYPE),
            },
        )),
    }
}
