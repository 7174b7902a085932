//! Test infrastructure for the persistence layer.
//!
//! Provides in-memory backends, a search index that can be switched into a
//! failing state to exercise store/index divergence, and a store that counts
//! its reads.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bench_domain::{EntityId, FieldSpec};
use serde_json::Value;

use bench_persistence::backends::sqlite::{SqliteBackend, SqliteTransaction};
use bench_persistence::core::{EntityStore, SearchIndex};
use bench_persistence::error::{BackendError, StorageError, StorageResult};
use bench_persistence::search::SearchQuery;
use bench_persistence::types::{Page, PageRequest, StoredEntity};

/// Creates an in-memory backend with its schema.
pub fn create_backend() -> Arc<SqliteBackend> {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    Arc::new(backend)
}

/// A search index that delegates to SQLite until told to fail.
pub struct FlakyIndex {
    inner: Arc<SqliteBackend>,
    failing: AtomicBool,
}

impl FlakyIndex {
    pub fn new(inner: Arc<SqliteBackend>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Backend(BackendError::Unavailable {
                backend_name: "flaky".to_string(),
                message: "index offline".to_string(),
            }))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SearchIndex for FlakyIndex {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn index(&self, entity: &StoredEntity) -> StorageResult<()> {
        self.check()?;
        SearchIndex::index(self.inner.as_ref(), entity).await
    }

    async fn delete(&self, entity_type: &str, id: EntityId) -> StorageResult<()> {
        self.check()?;
        SearchIndex::delete(self.inner.as_ref(), entity_type, id).await
    }

    async fn search(
        &self,
        entity_type: &str,
        fields: &[FieldSpec],
        query: &SearchQuery,
        request: &PageRequest,
    ) -> StorageResult<Page<Value>> {
        self.check()?;
        self.inner.search(entity_type, fields, query, request).await
    }

    async fn exists(&self, entity_type: &str, id: EntityId) -> StorageResult<bool> {
        self.inner.exists(entity_type, id).await
    }

    async fn clear(&self, entity_type: &str) -> StorageResult<u64> {
        self.check()?;
        self.inner.clear(entity_type).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.check()
    }
}

/// A store that delegates to SQLite and counts page and single-record reads.
pub struct CountingStore {
    inner: Arc<SqliteBackend>,
    page_reads: AtomicUsize,
    id_reads: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<SqliteBackend>) -> Self {
        Self {
            inner,
            page_reads: AtomicUsize::new(0),
            id_reads: AtomicUsize::new(0),
        }
    }

    pub fn page_reads(&self) -> usize {
        self.page_reads.load(Ordering::SeqCst)
    }

    pub fn id_reads(&self) -> usize {
        self.id_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for CountingStore {
    type Transaction = SqliteTransaction;

    fn backend_name(&self) -> &'static str {
        "counting"
    }

    async fn begin(&self) -> StorageResult<SqliteTransaction> {
        EntityStore::begin(self.inner.as_ref()).await
    }

    async fn find_by_id(
        &self,
        entity_type: &str,
        id: EntityId,
    ) -> StorageResult<Option<StoredEntity>> {
        self.id_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(entity_type, id).await
    }

    async fn find_page(
        &self,
        entity_type: &str,
        fields: &[FieldSpec],
        request: &PageRequest,
    ) -> StorageResult<Page<StoredEntity>> {
        self.page_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_page(entity_type, fields, request).await
    }

    async fn find_by_field(
        &self,
        entity_type: &str,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<StoredEntity>> {
        self.inner.find_by_field(entity_type, field, value).await
    }

    async fn count(&self, entity_type: &str) -> StorageResult<u64> {
        EntityStore::count(self.inner.as_ref(), entity_type).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        EntityStore::health_check(self.inner.as_ref()).await
    }
}
