//! Application state for the bench tracking REST API.
//!
//! This module defines the shared application state that is available to all
//! request handlers: the store, the search index and the server configuration.
//! Per-record-type services are assembled from it on demand.

use std::sync::Arc;

use bench_domain::Entity;
use bench_persistence::core::{EntityStore, SearchIndex};
use bench_persistence::service::{EntityService, IndexSyncPolicy};

use crate::config::ServerConfig;

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `S` - The record store (must implement [`EntityStore`])
/// * `I` - The search index (must implement [`SearchIndex`]); may be
///   `dyn SearchIndex` when the index is chosen at runtime
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use bench_rest::{AppState, ServerConfig};
/// use bench_persistence::backends::sqlite::SqliteBackend;
///
/// let backend = Arc::new(SqliteBackend::in_memory()?);
/// let state = AppState::new(backend.clone(), backend, ServerConfig::default());
/// ```
pub struct AppState<S, I: ?Sized> {
    /// The record store.
    store: Arc<S>,

    /// The search index.
    index: Arc<I>,

    /// Server configuration.
    config: Arc<ServerConfig>,

    /// Parsed index mirroring policy.
    policy: IndexSyncPolicy,
}

// Manually implement Clone since S and I are wrapped in Arc and don't need to be Clone
impl<S, I: ?Sized> Clone for AppState<S, I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: Arc::clone(&self.index),
            config: Arc::clone(&self.config),
            policy: self.policy,
        }
    }
}

impl<S, I> AppState<S, I>
where
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    /// Creates a new AppState.
    ///
    /// An unparseable `index_sync_policy` falls back to the default; the
    /// server rejects it earlier through [`ServerConfig::validate`].
    pub fn new(store: Arc<S>, index: Arc<I>, config: ServerConfig) -> Self {
        let policy = config.index_sync_policy().unwrap_or_default();
        Self {
            store,
            index,
            config: Arc::new(config),
            policy,
        }
    }

    /// Returns the service for one record type.
    pub fn service<E: Entity>(&self) -> EntityService<E, S, I> {
        EntityService::new(Arc::clone(&self.store), Arc::clone(&self.index))
            .with_policy(self.policy)
    }

    /// Returns a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the search index.
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the index mirroring policy.
    pub fn policy(&self) -> IndexSyncPolicy {
        self.policy
    }

    /// Returns the API prefix without a trailing slash.
    pub fn api_prefix(&self) -> &str {
        self.config.api_prefix()
    }

    /// Returns the application name used in alert headers.
    pub fn app_name(&self) -> &str {
        &self.config.app_name
    }

    /// Returns the default page size.
    pub fn default_page_size(&self) -> u32 {
        self.config.default_page_size
    }

    /// Returns the maximum page size.
    pub fn max_page_size(&self) -> u32 {
        self.config.max_page_size
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use bench_domain::records::Unit;
    use bench_persistence::backends::sqlite::SqliteBackend;

    fn backend() -> Arc<SqliteBackend> {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        Arc::new(backend)
    }

    #[test]
    fn test_app_state_config_access() {
        let backend = backend();
        let config = ServerConfig {
            api_prefix: "/bench/".to_string(),
            app_name: "staffing".to_string(),
            default_page_size: 50,
            max_page_size: 500,
            index_sync_policy: "best-effort".to_string(),
            ..Default::default()
        };
        let state = AppState::new(backend.clone(), backend, config);

        assert_eq!(state.api_prefix(), "/bench");
        assert_eq!(state.app_name(), "staffing");
        assert_eq!(state.default_page_size(), 50);
        assert_eq!(state.max_page_size(), 500);
        assert_eq!(state.policy(), IndexSyncPolicy::BestEffort);
    }

    #[test]
    fn test_service_inherits_policy() {
        let backend = backend();
        let config = ServerConfig {
            index_sync_policy: "best_effort".to_string(),
            ..Default::default()
        };
        let state = AppState::new(backend.clone(), backend, config);
        let service = state.service::<Unit>();
        assert_eq!(service.policy(), IndexSyncPolicy::BestEffort);
    }

    #[test]
    fn test_dyn_index_state_clone() {
        let backend = backend();
        let index: Arc<dyn SearchIndex> = backend.clone();
        let state = AppState::new(backend, index, ServerConfig::default());
        let cloned = state.clone();

        assert_eq!(cloned.index().backend_name(), "sqlite");
        assert_eq!(state.api_prefix(), cloned.api_prefix());
    }
}
