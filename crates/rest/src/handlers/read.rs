//! Read handlers.
//!
//! - `GET [prefix]/{entities}` - one page from the store
//! - `GET [prefix]/{entities}/{id}` - one record

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use bench_domain::Entity;
use bench_persistence::core::{EntityStore, SearchIndex};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::{IdPath, Pagination};
use crate::responses::pagination_headers;
use crate::state::AppState;

/// Handler for listing records.
///
/// Listing reads the store, never the search index. The body is the page
/// content; `X-Total-Count` and `Link` carry the paging state.
///
/// # HTTP Request
///
/// `GET [prefix]/{entities}?page=0&size=20&sort=name,desc`
pub async fn list_handler<E, S, I>(
    State(state): State<AppState<S, I>>,
    pagination: Pagination,
) -> RestResult<Response>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!(entity_type = E::ENTITY_TYPE, "REST request to get a page");

    let page = state.service::<E>().find_all(pagination.request()).await?;

    let base_path = format!("{}/{}", state.api_prefix(), E::RESOURCE_PATH);
    let headers = pagination_headers(&page, &base_path, None);
    Ok((headers, Json(page.content)).into_response())
}

/// Handler for reading one record.
///
/// # Response
///
/// - `200 OK` - body is the record
/// - `404 Not Found` - no record has the id
pub async fn read_handler<E, S, I>(
    State(state): State<AppState<S, I>>,
    IdPath(id): IdPath,
) -> RestResult<Response>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!(entity_type = E::ENTITY_TYPE, id, "REST request to get");

    match state.service::<E>().find_one(id).await? {
        Some(entity) => Ok(Json(entity).into_response()),
        None => Err(RestError::NotFound {
            entity_type: E::ENTITY_TYPE.to_string(),
            id,
        }),
    }
}
