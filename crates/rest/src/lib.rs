//! # bench-rest - Bench Tracking REST API
//!
//! This crate exposes the bench tracking records over HTTP. Each of the
//! eleven record types gets the same set of routes, backed by a generic
//! [`EntityService`](bench_persistence::service::EntityService) that keeps
//! the record store and the search index in step.
//!
//! ## Features
//!
//! - **CRUD**: Create, update, read, list and delete for every record type
//! - **Pagination**: `page`, `size` and repeated `sort` parameters, with
//!   `X-Total-Count` and `Link` response headers
//! - **Search**: Full-text queries against the search index
//! - **Alerts**: `X-{app}-alert`, `X-{app}-error` and `X-{app}-params`
//!   headers describing the outcome of every write
//! - **Reindexing**: Rebuild the search index from the store
//!
//! ## Backend Support
//!
//! - `sqlite` - SQLite store and search index (default)
//! - `elasticsearch` - Elasticsearch search index
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bench_rest::{create_app_with_config, ServerConfig};
//! use bench_persistence::backends::sqlite::SqliteBackend;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = Arc::new(SqliteBackend::open("bench.db")?);
//!     backend.init_schema()?;
//!
//!     let app = create_app_with_config(backend.clone(), backend, ServerConfig::default());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Operation | HTTP Method | URL Pattern |
//! |-----------|-------------|-------------|
//! | create | POST | `/api/{entities}` |
//! | update | PUT | `/api/{entities}` |
//! | list | GET | `/api/{entities}?page=&size=&sort=` |
//! | read | GET | `/api/{entities}/{id}` |
//! | delete | DELETE | `/api/{entities}/{id}` |
//! | search | GET | `/api/_search/{entities}?query=` |
//! | reindex | POST | `/api/_reindex/{entities}` or `/api/_reindex` |
//! | bench history | GET | `/api/employees/{id}/bench-histories` |
//! | health | GET | `/health`, `/_liveness`, `/_readiness` |
//!
//! ## Error Handling
//!
//! Errors are returned as JSON with an `error.{key}` message:
//!
//! | HTTP Status | Error Key | Description |
//! |-------------|-----------|-------------|
//! | 400 | idexists | Create request carried an id |
//! | 400 | validation | Required fields missing, see `fieldErrors` |
//! | 400 | badjson | Malformed request body |
//! | 400 | badquery / badsort | Malformed search query or sort |
//! | 404 | notfound | Unknown id |
//! | 500 | indexsync | Stored but not indexed |
//! | 500 | internalServerError | Store failure |
//!
//! ## Configuration
//!
//! See [`ServerConfig`] for the command line flags and their `BENCH_*`
//! environment variables.

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::{SearchBackendMode, ServerConfig};
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, http::HeaderName};
use bench_persistence::core::{EntityStore, SearchIndex};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application.
///
/// `store` holds the records and `index` answers searches. Both may be the
/// same backend; `index` may also be a `dyn SearchIndex` chosen at runtime.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use bench_rest::{create_app_with_config, ServerConfig};
/// use bench_persistence::backends::sqlite::SqliteBackend;
///
/// let backend = Arc::new(SqliteBackend::in_memory()?);
/// backend.init_schema()?;
/// let config = ServerConfig {
///     port: 3000,
///     enable_cors: true,
///     ..Default::default()
/// };
/// let app = create_app_with_config(backend.clone(), backend, config);
/// ```
pub fn create_app_with_config<S, I>(store: Arc<S>, index: Arc<I>, config: ServerConfig) -> Router
where
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    info!(
        store = store.backend_name(),
        index = index.backend_name(),
        "Creating REST API server"
    );

    let state = AppState::new(store, index, config.clone());

    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = router.layer(DefaultBodyLimit::max(config.max_body_size));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new().expose_headers(exposed_headers(&config.app_name));

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Response headers a browser client must be able to read.
fn exposed_headers(app_name: &str) -> Vec<HeaderName> {
    let mut names = vec![
        HeaderName::from_static(responses::X_TOTAL_COUNT),
        axum::http::header::LINK,
        axum::http::header::LOCATION,
    ];
    for suffix in ["alert", "error", "params"] {
        if let Ok(name) = HeaderName::try_from(format!("x-{}-{}", app_name, suffix)) {
            names.push(name);
        }
    }
    names
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` takes
/// precedence over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "bench_rest={level},bench_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
