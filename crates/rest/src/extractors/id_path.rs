//! Record id path extractor.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use bench_domain::EntityId;

use crate::error::RestError;

/// Axum extractor for the `{id}` path segment.
///
/// A segment that is not an integer id is a 400 with the JSON error body,
/// not axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub EntityId);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| RestError::BadRequest {
                message: e.body_text(),
            })?;

        raw.trim()
            .parse()
            .map(IdPath)
            .map_err(|_| RestError::BadRequest {
                message: format!("Invalid id '{}'", raw),
            })
    }
}
