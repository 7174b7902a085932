//! Elasticsearch search index.
//!
//! Implements [`SearchIndex`](crate::core::SearchIndex) only; records are
//! always stored elsewhere and mirrored here after the store commits.
//!
//! # Index Structure
//!
//! Each record type gets its own index, `{prefix}_{entity_type_lowercase}`
//! (e.g., `bench_benchhistory`), created on first write. Documents are the
//! record attributes plus `id`, keyed by the record id.
//!
//! # Example
//!
//! ```ignore
//! use bench_persistence::backends::elasticsearch::{ElasticsearchBackend, ElasticsearchConfig};
//!
//! let config = ElasticsearchConfig {
//!     nodes: vec!["http://localhost:9200".to_string()],
//!     ..Default::default()
//! };
//! let index = ElasticsearchBackend::new(config)?;
//! index.health_check().await?;
//! ```

mod backend;
mod index;

pub use backend::{
    ElasticsearchAuth, ElasticsearchBackend, ElasticsearchConfig, RefreshPolicy,
    create_index_mapping,
};
