//! Elasticsearch client, configuration and index management.

use std::collections::HashSet;
use std::fmt::Debug;
use std::time::Duration;

use elasticsearch::Elasticsearch;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{IndicesCreateParts, IndicesExistsParts};
use elasticsearch::params::Refresh;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{BackendError, StorageError, StorageResult};

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// When writes become visible to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Return once the write is searchable (default).
    #[default]
    WaitFor,
    /// Force an immediate refresh of the affected shards.
    Immediate,
    /// Leave visibility to the index refresh interval.
    None,
}

impl RefreshPolicy {
    pub(crate) fn as_param(self) -> Refresh {
        match self {
            RefreshPolicy::WaitFor => Refresh::WaitFor,
            RefreshPolicy::Immediate => Refresh::True,
            RefreshPolicy::None => Refresh::False,
        }
    }
}

/// Configuration for the Elasticsearch index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// Index name prefix (default: `"bench"`).
    /// Indices are named `{prefix}_{entity_type_lowercase}`.
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,

    /// Number of primary shards per index (default: 1).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replica shards per index (default: 1).
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// Refresh interval (default: "1s").
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// Refresh behavior of index and delete requests.
    #[serde(default)]
    pub refresh: RefreshPolicy,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_index_prefix() -> String {
    "bench".to_string()
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    1
}

fn default_refresh_interval() -> String {
    "1s".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            index_prefix: default_index_prefix(),
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            refresh_interval: default_refresh_interval(),
            refresh: RefreshPolicy::default(),
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

pub(crate) fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "elasticsearch".to_string(),
        message,
        source: None,
    })
}

/// Elasticsearch search index.
///
/// One index per record type. Document ids are record ids.
pub struct ElasticsearchBackend {
    client: Elasticsearch,
    config: ElasticsearchConfig,
    /// Indices already known to exist.
    known_indices: RwLock<HashSet<String>>,
}

impl Debug for ElasticsearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchBackend")
            .field("config", &self.config)
            .field("known_indices", &self.known_indices.read().len())
            .finish_non_exhaustive()
    }
}

impl ElasticsearchBackend {
    /// Creates a new Elasticsearch index with the given configuration.
    ///
    /// No request is sent until the first operation.
    pub fn new(config: ElasticsearchConfig) -> StorageResult<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self {
            client,
            config,
            known_indices: RwLock::new(HashSet::new()),
        })
    }

    /// Builds the Elasticsearch client from configuration.
    fn build_client(config: &ElasticsearchConfig) -> StorageResult<Elasticsearch> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url = url.parse().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "elasticsearch".to_string(),
                message: format!("Invalid URL: {}", e),
            })
        })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "elasticsearch".to_string(),
                message: format!("Failed to build transport: {}", e),
            })
        })?;

        Ok(Elasticsearch::new(transport))
    }

    /// Returns the Elasticsearch client.
    pub(crate) fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    /// Returns the index name for a record type.
    pub fn index_name(&self, entity_type: &str) -> String {
        format!(
            "{}_{}",
            self.config.index_prefix,
            entity_type.to_lowercase()
        )
    }

    /// Ensures the index for a record type exists, creating it if necessary.
    pub(crate) async fn ensure_index(&self, entity_type: &str) -> StorageResult<()> {
        let index = self.index_name(entity_type);
        if self.known_indices.read().contains(&index) {
            return Ok(());
        }

        let exists_response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&index]))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to check index existence: {}", e)))?;

        if !exists_response.status_code().is_success() {
            let response = self
                .client
                .indices()
                .create(IndicesCreateParts::Index(&index))
                .body(create_index_mapping(&self.config))
                .send()
                .await
                .map_err(|e| internal_error(format!("Failed to create index {}: {}", index, e)))?;

            let status = response.status_code();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Another writer created it first.
                if !body.contains("resource_already_exists_exception") {
                    return Err(internal_error(format!(
                        "Failed to create index {} (status {}): {}",
                        index, status, body
                    )));
                }
            } else {
                tracing::debug!("Created Elasticsearch index '{}'", index);
            }
        }

        self.known_indices.write().insert(index);
        Ok(())
    }

    /// Forgets that an index exists, after it was removed.
    pub(crate) fn forget_index(&self, entity_type: &str) {
        self.known_indices.write().remove(&self.index_name(entity_type));
    }
}

/// Creates the settings and mappings for a record type index.
///
/// Records are indexed with dynamic mapping: strings become analyzed `text`
/// with a `keyword` subfield for sorting, numbers and booleans keep their
/// native types. Date detection is off so timestamps sort as strings on
/// their `keyword` subfield.
pub fn create_index_mapping(config: &ElasticsearchConfig) -> Value {
    json!({
        "settings": {
            "number_of_shards": config.number_of_shards,
            "number_of_replicas": config.number_of_replicas,
            "refresh_interval": config.refresh_interval
        },
        "mappings": {
            "date_detection": false,
            "dynamic_templates": [
                {
                    "strings": {
                        "match_mapping_type": "string",
                        "mapping": {
                            "type": "text",
                            "analyzer": "standard",
                            "fields": {
                                "keyword": { "type": "keyword", "ignore_above": 256 }
                            }
                        }
                    }
                }
            ],
            "properties": {
                "id": { "type": "long" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ElasticsearchConfig::default();
        assert_eq!(config.index_prefix, "bench");
        assert_eq!(config.number_of_shards, 1);
        assert_eq!(config.refresh, RefreshPolicy::WaitFor);
        assert_eq!(config.nodes, vec!["http://localhost:9200"]);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ElasticsearchConfig = serde_json::from_value(json!({
            "nodes": ["http://es:9200"],
            "refresh": "none"
        }))
        .unwrap();
        assert_eq!(config.refresh, RefreshPolicy::None);
        assert_eq!(config.index_prefix, "bench");
    }

    #[test]
    fn test_index_name() {
        let backend = ElasticsearchBackend::new(ElasticsearchConfig::default()).unwrap();
        assert_eq!(backend.index_name("benchHistory"), "bench_benchhistory");
        assert_eq!(backend.index_name("unit"), "bench_unit");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = ElasticsearchConfig {
            nodes: vec!["not a url".to_string()],
            ..Default::default()
        };
        assert!(ElasticsearchBackend::new(config).is_err());
    }

    #[test]
    fn test_create_index_mapping_structure() {
        let mapping = create_index_mapping(&ElasticsearchConfig::default());

        assert_eq!(mapping["settings"]["number_of_shards"], 1);
        assert_eq!(mapping["mappings"]["date_detection"], false);
        assert_eq!(mapping["mappings"]["properties"]["id"]["type"], "long");

        let strings = &mapping["mappings"]["dynamic_templates"][0]["strings"];
        assert_eq!(strings["mapping"]["type"], "text");
        assert_eq!(strings["mapping"]["fields"]["keyword"]["type"], "keyword");
    }
}
