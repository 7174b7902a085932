//! Search handler.
//!
//! `GET [prefix]/_search/{entities}?query=...`
//!
//! The query string is the Lucene-style subset understood by every index
//! backend: `field:value`, bare words, quoted phrases, `*` / `?` wildcards
//! and `AND` / `OR` / `NOT`.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use bench_domain::Entity;
use bench_persistence::core::{EntityStore, SearchIndex};
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::{Pagination, SearchText};
use crate::responses::pagination_headers;
use crate::state::AppState;

/// Handler for full-text search.
///
/// # Response
///
/// - `200 OK` - body is the matching page, paging links carry the query
/// - `400 Bad Request` - `query` is missing or does not parse, or a sort
///   property is unknown
pub async fn search_handler<E, S, I>(
    State(state): State<AppState<S, I>>,
    SearchText(query): SearchText,
    pagination: Pagination,
) -> RestResult<Response>
where
    E: Entity,
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!(entity_type = E::ENTITY_TYPE, query = %query, "REST request to search");

    let page = state
        .service::<E>()
        .search(&query, pagination.request())
        .await?;

    let base_path = format!("{}/_search/{}", state.api_prefix(), E::RESOURCE_PATH);
    let headers = pagination_headers(&page, &base_path, Some(&query));
    Ok((headers, Json(page.content)).into_response())
}
