//! Server configuration for the bench tracking REST API.
//!
//! This module provides configuration types for the REST server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BENCH_SERVER_PORT` | 8080 | Server port |
//! | `BENCH_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `BENCH_LOG_LEVEL` | info | Log level |
//! | `BENCH_MAX_BODY_SIZE` | 1048576 | Max request body (bytes) |
//! | `BENCH_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `BENCH_ENABLE_CORS` | true | Enable CORS |
//! | `BENCH_CORS_ORIGINS` | * | Allowed origins |
//! | `BENCH_CORS_METHODS` | GET,POST,PUT,DELETE,OPTIONS | Allowed methods |
//! | `BENCH_CORS_HEADERS` | Content-Type,Authorization,Accept | Allowed headers |
//! | `BENCH_API_PREFIX` | /api | Prefix of every record route |
//! | `BENCH_APP_NAME` | benchApp | Name used in alert headers |
//! | `BENCH_DATABASE_URL` | bench.db | SQLite database path, or `:memory:` |
//! | `BENCH_SEARCH_BACKEND` | sqlite | Search index: `sqlite` or `elasticsearch` |
//! | `BENCH_INDEX_SYNC_POLICY` | propagate | `propagate` or `best-effort` |
//! | `BENCH_ELASTICSEARCH_NODES` | http://localhost:9200 | Comma-separated node URLs |
//! | `BENCH_DEFAULT_PAGE_SIZE` | 20 | Page size when `size` is absent |
//! | `BENCH_MAX_PAGE_SIZE` | 1000 | Upper bound for `size` |
//!
//! # Example
//!
//! ```rust
//! use bench_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::str::FromStr;

use bench_persistence::service::IndexSyncPolicy;
use clap::Parser;

/// Which search index backs the `/_search` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchBackendMode {
    /// Search tables inside the SQLite database.
    #[default]
    Sqlite,
    /// An Elasticsearch cluster.
    Elasticsearch,
}

impl FromStr for SearchBackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(SearchBackendMode::Sqlite),
            "elasticsearch" | "es" => Ok(SearchBackendMode::Elasticsearch),
            other => Err(format!(
                "unknown search backend '{}', expected 'sqlite' or 'elasticsearch'",
                other
            )),
        }
    }
}

impl fmt::Display for SearchBackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBackendMode::Sqlite => write!(f, "sqlite"),
            SearchBackendMode::Elasticsearch => write!(f, "elasticsearch"),
        }
    }
}

/// Server configuration for the bench tracking REST API.
///
/// This struct can be constructed from command line arguments and `BENCH_*`
/// environment variables using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "bench")]
#[command(about = "Bench tracking REST server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "BENCH_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "BENCH_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "BENCH_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "BENCH_MAX_BODY_SIZE", default_value = "1048576")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "BENCH_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "BENCH_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "BENCH_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(
        long,
        env = "BENCH_CORS_METHODS",
        default_value = "GET,POST,PUT,DELETE,OPTIONS"
    )]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "BENCH_CORS_HEADERS",
        default_value = "Content-Type,Authorization,Accept"
    )]
    pub cors_headers: String,

    /// Prefix of every record route.
    #[arg(long, env = "BENCH_API_PREFIX", default_value = "/api")]
    pub api_prefix: String,

    /// Application name used in the alert and error headers.
    #[arg(long, env = "BENCH_APP_NAME", default_value = "benchApp")]
    pub app_name: String,

    /// SQLite database path, or `:memory:`.
    #[arg(long, env = "BENCH_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Search index backend (sqlite, elasticsearch).
    #[arg(long, env = "BENCH_SEARCH_BACKEND", default_value = "sqlite")]
    pub search_backend: String,

    /// What a failed index write after a store commit does (propagate, best-effort).
    #[arg(long, env = "BENCH_INDEX_SYNC_POLICY", default_value = "propagate")]
    pub index_sync_policy: String,

    /// Elasticsearch node URLs (comma-separated).
    #[arg(
        long,
        env = "BENCH_ELASTICSEARCH_NODES",
        default_value = "http://localhost:9200"
    )]
    pub elasticsearch_nodes: String,

    /// Prefix of the per-record-type Elasticsearch indices.
    #[arg(long, env = "BENCH_ELASTICSEARCH_INDEX_PREFIX", default_value = "bench")]
    pub elasticsearch_index_prefix: String,

    /// Elasticsearch basic auth user.
    #[arg(long, env = "BENCH_ELASTICSEARCH_USERNAME")]
    pub elasticsearch_username: Option<String>,

    /// Elasticsearch basic auth password.
    #[arg(long, env = "BENCH_ELASTICSEARCH_PASSWORD")]
    pub elasticsearch_password: Option<String>,

    /// Default page size for listing and search.
    #[arg(long, env = "BENCH_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: u32,

    /// Maximum page size for listing and search.
    #[arg(long, env = "BENCH_MAX_PAGE_SIZE", default_value = "1000")]
    pub max_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,PUT,DELETE,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization,Accept".to_string(),
            api_prefix: "/api".to_string(),
            app_name: "benchApp".to_string(),
            database_url: None,
            search_backend: "sqlite".to_string(),
            index_sync_policy: "propagate".to_string(),
            elasticsearch_nodes: "http://localhost:9200".to_string(),
            elasticsearch_index_prefix: "bench".to_string(),
            elasticsearch_username: None,
            elasticsearch_password: None,
            default_page_size: 20,
            max_page_size: 1000,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the API prefix without a trailing slash (`""` for the root).
    pub fn api_prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }

    /// Parses [`search_backend`](Self::search_backend).
    pub fn search_backend_mode(&self) -> Result<SearchBackendMode, String> {
        self.search_backend.parse()
    }

    /// Parses [`index_sync_policy`](Self::index_sync_policy).
    pub fn index_sync_policy(&self) -> Result<IndexSyncPolicy, String> {
        self.index_sync_policy.parse()
    }

    /// Splits [`elasticsearch_nodes`](Self::elasticsearch_nodes).
    pub fn elasticsearch_node_list(&self) -> Vec<String> {
        self.elasticsearch_nodes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            errors.push("API prefix must start with '/'".to_string());
        }

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        }

        if let Err(e) = self.search_backend_mode() {
            errors.push(e);
        }

        if let Err(e) = self.index_sync_policy() {
            errors.push(e);
        }

        if matches!(
            self.search_backend_mode(),
            Ok(SearchBackendMode::Elasticsearch)
        ) && self.elasticsearch_node_list().is_empty()
        {
            errors.push("At least one Elasticsearch node is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0, an in-memory database and smaller pages.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            log_level: "debug".to_string(),
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            database_url: Some(":memory:".to_string()),
            default_page_size: 10,
            max_page_size: 100,
            ..Default::default()
        }
    }
}
