//! Update handler.
//!
//! `PUT [prefix]/{entities}`

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use bench_domain::Entity;
use bench_persistence::core::{EntityStore, SearchIndex};
use bench_persistence::error::StorageError;
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::EntityBody;
use crate::handlers::create::create_entity;
use crate::responses::Alert;
use crate::state::AppState;

/// Handler for updating a record.
///
/// The id travels in the body. A body without an id is created instead,
/// exactly as `POST` would. Every attribute is replaced; attributes missing
/// from the body are cleared.
///
/// # Response
///
/// - `200 OK` - body is the updated record
/// - `201 Created` - the body had no id
/// - `400 Bad Request` - a required field is missing
/// - `404 Not Found` - no record has the id
pub async fn update_handler<E, S, I>(
    State(state): State<AppState<S, I>>,
    EntityBody(entity): EntityBody<E>,
) -> RestResult<Response>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!(entity_type = E::ENTITY_TYPE, id = ?entity.id(), "REST request to update");

    entity.validate().map_err(StorageError::from)?;
    let Some(id) = entity.id() else {
        return create_entity(&state, entity).await;
    };

    let saved = state.service::<E>().save(entity).await?;

    let mut response = Json(saved).into_response();
    response
        .extensions_mut()
        .insert(Alert::updated(E::ENTITY_TYPE, id));
    Ok(response)
}
