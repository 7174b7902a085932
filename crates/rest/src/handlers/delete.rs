//! Delete handler.
//!
//! `DELETE [prefix]/{entities}/{id}`

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bench_domain::Entity;
use bench_persistence::core::{EntityStore, SearchIndex};
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::IdPath;
use crate::responses::Alert;
use crate::state::AppState;

/// Handler for deleting a record.
///
/// Removes the record from the store, then from the search index. Deleting
/// an id that does not exist changes nothing and still succeeds.
///
/// # Response
///
/// - `200 OK` - empty body, with a deletion alert
pub async fn delete_handler<E, S, I>(
    State(state): State<AppState<S, I>>,
    IdPath(id): IdPath,
) -> RestResult<Response>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!(entity_type = E::ENTITY_TYPE, id, "REST request to delete");

    let removed = state.service::<E>().delete(id).await?;
    debug!(entity_type = E::ENTITY_TYPE, id, removed, "Record deleted");

    let mut response = StatusCode::OK.into_response();
    response
        .extensions_mut()
        .insert(Alert::deleted(E::ENTITY_TYPE, id));
    Ok(response)
}
