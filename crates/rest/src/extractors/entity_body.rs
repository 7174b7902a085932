//! Record body extractor.
//!
//! Parses a record of type `E` from a JSON request body. Malformed JSON and
//! JSON of the wrong shape are both reported as `error.badjson`.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use bench_domain::Entity;

use crate::error::RestError;

/// Axum extractor for a record in the request body.
///
/// # Example
///
/// ```rust,ignore
/// use bench_domain::records::Location;
/// use bench_rest::extractors::EntityBody;
///
/// async fn create_handler(EntityBody(location): EntityBody<Location>) {
///     println!("upsaId: {:?}", location.upsa_id);
/// }
/// ```
#[derive(Debug)]
pub struct EntityBody<E>(pub E);

impl<E: Entity> EntityBody<E> {
    /// Parses a record from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RestError> {
        serde_json::from_slice(bytes)
            .map(EntityBody)
            .map_err(|e| RestError::InvalidJson {
                entity_type: E::ENTITY_TYPE.to_string(),
                message: e.to_string(),
            })
    }

    /// Consumes the extractor and returns the record.
    pub fn into_inner(self) -> E {
        self.0
    }
}

impl<E, S> FromRequest<S> for EntityBody<E>
where
    E: Entity,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| RestError::BadRequest {
                message: e.body_text(),
            })?;

        EntityBody::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_domain::records::{BenchHistory, Location};

    #[test]
    fn test_parses_camel_case_body() {
        let EntityBody(location) =
            EntityBody::<Location>::from_bytes(br#"{"upsaId":"AAAAA","name":"AAAAA"}"#).unwrap();
        assert_eq!(location.upsa_id.as_deref(), Some("AAAAA"));
        assert!(location.id.is_none());
    }

    #[test]
    fn test_malformed_json_is_bad_json() {
        let err = EntityBody::<Location>::from_bytes(b"{not json").unwrap_err();
        assert_eq!(err.key(), "badjson");
        assert_eq!(err.entity_type(), Some("location"));
    }

    #[test]
    fn test_wrong_field_type_is_bad_json() {
        let err = EntityBody::<BenchHistory>::from_bytes(br#"{"bench":"maybe"}"#).unwrap_err();
        assert!(matches!(err, RestError::InvalidJson { .. }));
    }
}
