//! Elasticsearch index tests.
//!
//! Configuration and client construction only; no running cluster is needed.
//!
//! Run with: `cargo test -p bench-persistence --features elasticsearch -- elasticsearch`

#![cfg(feature = "elasticsearch")]

use bench_persistence::backends::elasticsearch::{
    ElasticsearchAuth, ElasticsearchBackend, ElasticsearchConfig, RefreshPolicy,
};
use bench_persistence::core::SearchIndex;

#[test]
fn test_elasticsearch_config_defaults() {
    let config = ElasticsearchConfig::default();
    assert_eq!(config.nodes, vec!["http://localhost:9200".to_string()]);
    assert_eq!(config.index_prefix, "bench");
    assert_eq!(config.number_of_replicas, 1);
    assert!(config.auth.is_none());
}

#[test]
fn test_elasticsearch_config_serialization() {
    let config = ElasticsearchConfig {
        nodes: vec!["http://es1:9200".to_string()],
        index_prefix: "test".to_string(),
        refresh: RefreshPolicy::Immediate,
        auth: Some(ElasticsearchAuth::Bearer {
            token: "secret".to_string(),
        }),
        ..Default::default()
    };

    let json = serde_json::to_string(&config).unwrap();
    let deserialized: ElasticsearchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.nodes, config.nodes);
    assert_eq!(deserialized.index_prefix, "test");
    assert_eq!(deserialized.refresh, RefreshPolicy::Immediate);
}

#[test]
fn test_backend_creation() {
    // Building the client does not connect.
    let backend = ElasticsearchBackend::new(ElasticsearchConfig::default()).unwrap();
    assert_eq!(SearchIndex::backend_name(&backend), "elasticsearch");
    assert_eq!(backend.index_name("jobFunction"), "bench_jobfunction");
}
