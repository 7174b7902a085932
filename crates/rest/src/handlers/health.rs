//! Health check endpoint handlers.
//!
//! Provides health endpoints for monitoring and load balancers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bench_persistence::core::{EntityStore, SearchIndex};
use bench_persistence::error::StorageResult;
use tracing::{debug, warn};

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// Checks both the store and the search index.
///
/// # HTTP Request
///
/// `GET /health`
///
/// # Response
///
/// - `200 OK` - both backends answer
/// - `503 Service Unavailable` - at least one does not
pub async fn health_handler<S, I>(State(state): State<AppState<S, I>>) -> Response
where
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!("Processing health check request");

    let store = EntityStore::health_check(state.store()).await;
    let index = SearchIndex::health_check(state.index()).await;

    let status_of = |result: &StorageResult<()>| match result {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            e.to_string()
        }
    };

    let healthy = store.is_ok() && index.is_ok();
    let body = serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "store": {
            "backend": EntityStore::backend_name(state.store()),
            "status": status_of(&store),
        },
        "index": {
            "backend": SearchIndex::backend_name(state.index()),
            "status": status_of(&index),
        },
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// Handler for the liveness probe.
///
/// # HTTP Request
///
/// `GET /_liveness`
pub async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Handler for the readiness probe.
///
/// Ready once the store answers; the search index may still be catching up.
///
/// # HTTP Request
///
/// `GET /_readiness`
pub async fn readiness_handler<S, I>(State(state): State<AppState<S, I>>) -> Response
where
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!("Processing readiness check request");

    match EntityStore::health_check(state.store()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "checks": { "store": "ok" }
            })),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "not ready",
                    "checks": { "store": e.to_string() }
                })),
            )
                .into_response()
        }
    }
}
