//! Test infrastructure for the REST API.
//!
//! Every test server runs on an in-memory SQLite store. Searches go through
//! a [`FlakyIndex`] wrapping the same backend, which can be switched off to
//! exercise index failures.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum_test::TestServer;
use bench_domain::{EntityId, FieldSpec};
use serde_json::Value;

use bench_persistence::backends::sqlite::SqliteBackend;
use bench_persistence::core::SearchIndex;
use bench_persistence::error::{BackendError, StorageError, StorageResult};
use bench_persistence::search::SearchQuery;
use bench_persistence::types::{Page, PageRequest, StoredEntity};
use bench_rest::{ServerConfig, create_app_with_config};

/// Application name used in alert headers.
pub const APP_NAME: &str = "benchApp";

/// A running test server and the backends behind it.
pub struct TestApp {
    pub server: TestServer,
    pub backend: Arc<SqliteBackend>,
    pub index: Arc<FlakyIndex>,
}

/// Creates a test server with the test configuration.
pub fn create_test_app() -> TestApp {
    create_test_app_with(ServerConfig::for_testing())
}

/// Creates a test server with a custom configuration.
pub fn create_test_app_with(config: ServerConfig) -> TestApp {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to init schema");
    let backend = Arc::new(backend);
    let index = Arc::new(FlakyIndex::new(Arc::clone(&backend)));

    let config = ServerConfig {
        app_name: APP_NAME.to_string(),
        ..config
    };
    let app = create_app_with_config(Arc::clone(&backend), Arc::clone(&index), config);
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        backend,
        index,
    }
}

/// Reads the `id` of a JSON record.
pub fn id_of(body: &Value) -> EntityId {
    body["id"].as_i64().expect("record has no numeric id")
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
