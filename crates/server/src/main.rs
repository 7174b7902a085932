//! Bench tracking server.
//!
//! Serves the bench tracking records over REST, storing them in SQLite and
//! searching them through SQLite or Elasticsearch.

use std::sync::Arc;

use bench_persistence::core::SearchIndex;
use bench_rest::{SearchBackendMode, ServerConfig, create_app_with_config, init_logging};
use clap::Parser;
use tracing::info;

#[cfg(feature = "sqlite")]
use bench_persistence::backends::sqlite::{SqliteBackend, SqliteBackendConfig};

/// Creates and initializes the SQLite store from the server configuration.
#[cfg(feature = "sqlite")]
fn create_sqlite_backend(config: &ServerConfig) -> anyhow::Result<SqliteBackend> {
    let db_path = config.database_url.as_deref().unwrap_or("bench.db");
    info!(database = %db_path, "Initializing SQLite backend");

    let backend = SqliteBackend::with_config(db_path, SqliteBackendConfig::default())?;
    backend.init_schema()?;

    Ok(backend)
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let search_mode = config
        .search_backend_mode()
        .map_err(|e| anyhow::anyhow!("Invalid search backend configuration: {}", e))?;

    info!(
        port = config.port,
        host = %config.host,
        search_backend = %search_mode,
        index_sync_policy = %config.index_sync_policy,
        "Starting bench tracking server"
    );

    start(config, search_mode).await
}

/// Starts the server with a SQLite store and the configured search index.
#[cfg(feature = "sqlite")]
async fn start(config: ServerConfig, search_mode: SearchBackendMode) -> anyhow::Result<()> {
    let store = Arc::new(create_sqlite_backend(&config)?);

    let index: Arc<dyn SearchIndex> = match search_mode {
        SearchBackendMode::Sqlite => store.clone(),
        SearchBackendMode::Elasticsearch => create_elasticsearch_index(&config)?,
    };

    let app = create_app_with_config(store, index, config.clone());
    serve(app, &config).await
}

/// Fallback when sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
async fn start(_config: ServerConfig, _search_mode: SearchBackendMode) -> anyhow::Result<()> {
    anyhow::bail!(
        "The record store requires the 'sqlite' feature. \
         Build with: cargo build -p bench-server --features sqlite"
    )
}

/// Builds the Elasticsearch search index from the server configuration.
#[cfg(feature = "elasticsearch")]
fn create_elasticsearch_index(config: &ServerConfig) -> anyhow::Result<Arc<dyn SearchIndex>> {
    use bench_persistence::backends::elasticsearch::{
        ElasticsearchAuth, ElasticsearchBackend, ElasticsearchConfig,
    };

    let nodes = config.elasticsearch_node_list();
    let auth = match (
        &config.elasticsearch_username,
        &config.elasticsearch_password,
    ) {
        (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };

    info!(
        nodes = ?nodes,
        index_prefix = %config.elasticsearch_index_prefix,
        "Initializing Elasticsearch index"
    );

    let es_config = ElasticsearchConfig {
        nodes,
        index_prefix: config.elasticsearch_index_prefix.clone(),
        auth,
        ..Default::default()
    };

    Ok(Arc::new(ElasticsearchBackend::new(es_config)?))
}

/// Fallback when elasticsearch feature is not enabled.
#[cfg(not(feature = "elasticsearch"))]
fn create_elasticsearch_index(_config: &ServerConfig) -> anyhow::Result<Arc<dyn SearchIndex>> {
    anyhow::bail!(
        "The elasticsearch search backend requires the 'elasticsearch' feature. \
         Build with: cargo build -p bench-server --features elasticsearch"
    )
}
