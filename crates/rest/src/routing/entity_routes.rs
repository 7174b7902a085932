//! Record route configuration.
//!
//! Every record type gets the same set of routes from [`entity_routes`];
//! [`create_routes`] instantiates it for each type and adds the
//! cross-cutting routes.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use bench_domain::Entity;
use bench_domain::records::{
    BenchHistory, BenchPredictions, Employee, JobFunction, Location, OpportunityPosition,
    OpportunityType, ProbationStatus, ProductionStatus, ProjectCategory, Unit,
};
use bench_persistence::core::{EntityStore, SearchIndex};

use crate::handlers;
use crate::middleware::alert_middleware;
use crate::state::AppState;

/// Creates the routes of one record type under `prefix`.
///
/// # Routes
///
/// - `POST {prefix}/{entities}` - Create
/// - `PUT {prefix}/{entities}` - Update (create when the body has no id)
/// - `GET {prefix}/{entities}` - List
/// - `GET {prefix}/{entities}/{id}` - Read
/// - `DELETE {prefix}/{entities}/{id}` - Delete
/// - `GET {prefix}/_search/{entities}?query=` - Search
/// - `POST {prefix}/_reindex/{entities}` - Rebuild the search index
pub fn entity_routes<E, S, I>(prefix: &str) -> Router<AppState<S, I>>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    let collection = format!("{}/{}", prefix, E::RESOURCE_PATH);

    Router::new()
        .route(
            &collection,
            get(handlers::list_handler::<E, S, I>)
                .post(handlers::create_handler::<E, S, I>)
                .put(handlers::update_handler::<E, S, I>),
        )
        .route(
            &format!("{}/{{id}}", collection),
            get(handlers::read_handler::<E, S, I>).delete(handlers::delete_handler::<E, S, I>),
        )
        .route(
            &format!("{}/_search/{}", prefix, E::RESOURCE_PATH),
            get(handlers::search_handler::<E, S, I>),
        )
        .route(
            &format!("{}/_reindex/{}", prefix, E::RESOURCE_PATH),
            post(handlers::reindex_handler::<E, S, I>),
        )
}

/// Creates all REST API routes.
///
/// # Routes
///
/// ## System-level
/// - `GET /health` - Health check
/// - `GET /_liveness` - Liveness probe
/// - `GET /_readiness` - Readiness probe
/// - `POST {prefix}/_reindex` - Rebuild every search index
///
/// ## Record-level
/// - [`entity_routes`] for each of the eleven record types
/// - `GET {prefix}/employees/{id}/bench-histories` - Bench history of an employee
pub fn create_routes<S, I>(state: AppState<S, I>) -> Router
where
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    let prefix = state.api_prefix().to_string();
    let app_name: Arc<str> = Arc::from(state.app_name());

    Router::new()
        // System-level routes
        .route("/health", get(handlers::health_handler::<S, I>))
        .route("/_liveness", get(handlers::liveness_handler))
        .route("/_readiness", get(handlers::readiness_handler::<S, I>))
        .route(
            &format!("{}/_reindex", prefix),
            post(handlers::reindex_all_handler::<S, I>),
        )
        .route(
            &format!(
                "{}/{}/{{id}}/{}",
                prefix,
                Employee::RESOURCE_PATH,
                BenchHistory::RESOURCE_PATH
            ),
            get(handlers::employee_histories_handler::<S, I>),
        )
        // Record-level routes
        .merge(entity_routes::<BenchHistory, S, I>(&prefix))
        .merge(entity_routes::<BenchPredictions, S, I>(&prefix))
        .merge(entity_routes::<Employee, S, I>(&prefix))
        .merge(entity_routes::<JobFunction, S, I>(&prefix))
        .merge(entity_routes::<Location, S, I>(&prefix))
        .merge(entity_routes::<OpportunityPosition, S, I>(&prefix))
        .merge(entity_routes::<OpportunityType, S, I>(&prefix))
        .merge(entity_routes::<ProbationStatus, S, I>(&prefix))
        .merge(entity_routes::<ProductionStatus, S, I>(&prefix))
        .merge(entity_routes::<ProjectCategory, S, I>(&prefix))
        .merge(entity_routes::<Unit, S, I>(&prefix))
        // Alert headers
        .layer(axum::middleware::from_fn_with_state(
            app_name,
            alert_middleware,
        ))
        // State
        .with_state(state)
}
