//! Create handler.
//!
//! `POST [prefix]/{entities}`

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bench_domain::Entity;
use bench_persistence::core::{EntityStore, SearchIndex};
use bench_persistence::error::StorageError;
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::EntityBody;
use crate::responses::Alert;
use crate::state::AppState;

/// Handler for creating a record.
///
/// The store assigns the id.
///
/// # Response
///
/// - `201 Created` - body is the saved record, `Location` points at it
/// - `400 Bad Request` - a required field is missing (`error.validation`)
///   or the body carries an id (`error.idexists`)
///
/// # Example
///
/// ```http
/// POST /api/locations HTTP/1.1
/// Content-Type: application/json
///
/// {"upsaId": "AAAAA", "name": "AAAAA"}
/// ```
pub async fn create_handler<E, S, I>(
    State(state): State<AppState<S, I>>,
    EntityBody(entity): EntityBody<E>,
) -> RestResult<Response>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!(entity_type = E::ENTITY_TYPE, "REST request to create");

    entity.validate().map_err(StorageError::from)?;
    if entity.id().is_some() {
        return Err(RestError::IdExists {
            entity_type: E::ENTITY_TYPE.to_string(),
        });
    }

    create_entity(&state, entity).await
}

/// Saves a record without an id and builds the `201 Created` response.
pub(crate) async fn create_entity<E, S, I>(
    state: &AppState<S, I>,
    entity: E,
) -> RestResult<Response>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    let saved = state.service::<E>().save(entity).await?;
    let id = saved.id().ok_or_else(|| RestError::InternalError {
        message: format!("saved {} has no id", E::ENTITY_TYPE),
    })?;

    let location = format!("{}/{}/{}", state.api_prefix(), E::RESOURCE_PATH, id);
    debug!(entity_type = E::ENTITY_TYPE, id, "Record created");

    let mut response = (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(saved),
    )
        .into_response();
    response
        .extensions_mut()
        .insert(Alert::created(E::ENTITY_TYPE, id));
    Ok(response)
}
