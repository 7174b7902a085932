//! Reindex handlers.
//!
//! The search index is written after the store commits, so a failed index
//! write leaves it behind the store. These endpoints rebuild it from the
//! store:
//!
//! - `POST [prefix]/_reindex/{entities}` - one record type
//! - `POST [prefix]/_reindex` - every record type

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use bench_domain::Entity;
use bench_domain::records::ENTITY_TYPES;
use bench_persistence::core::{EntityStore, SearchIndex};
use bench_persistence::search::{DEFAULT_BATCH_SIZE, reindex_type};
use tracing::{info, warn};

use crate::error::RestResult;
use crate::state::AppState;

/// Handler rebuilding the index of one record type.
///
/// The body is the reindex report; records that could not be indexed are
/// listed in its `errors`.
pub async fn reindex_handler<E, S, I>(State(state): State<AppState<S, I>>) -> RestResult<Response>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    info!(entity_type = E::ENTITY_TYPE, "REST request to reindex");

    let report = state.service::<E>().reindex().await?;
    if !report.is_complete() {
        warn!(
            entity_type = E::ENTITY_TYPE,
            failed = report.errors.len(),
            "Reindex left records out of the index"
        );
    }

    Ok(Json(report).into_response())
}

/// Handler rebuilding the index of every record type, one type at a time.
///
/// Stops at the first type whose store read or index clear fails.
pub async fn reindex_all_handler<S, I>(State(state): State<AppState<S, I>>) -> RestResult<Response>
where
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    info!(types = ENTITY_TYPES.len(), "REST request to reindex everything");

    let mut reports = Vec::with_capacity(ENTITY_TYPES.len());
    for entity_type in ENTITY_TYPES {
        let report =
            reindex_type(state.store(), state.index(), entity_type, DEFAULT_BATCH_SIZE).await?;
        reports.push(report);
    }

    Ok(Json(reports).into_response())
}
