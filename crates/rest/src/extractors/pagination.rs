//! Pagination and search query extractors.
//!
//! Query strings are read with `url::form_urlencoded` rather than
//! `axum::extract::Query`, because `sort` may be repeated.

use axum::{extract::FromRequestParts, http::request::Parts};
use bench_persistence::core::{EntityStore, SearchIndex};
use bench_persistence::types::{PageRequest, SortOrder};

use crate::error::RestError;
use crate::state::AppState;

/// Axum extractor for pagination parameters.
///
/// Reads zero-based `page`, `size` and any number of
/// `sort=property[,asc|desc]` parameters. A missing `size` uses the
/// configured default; a larger one is capped at the configured maximum.
///
/// # Example
///
/// ```rust,ignore
/// use bench_rest::extractors::Pagination;
///
/// async fn list_handler(pagination: Pagination) {
///     let request = pagination.request();
///     println!("page {} of size {}", request.page, request.size);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pagination {
    request: PageRequest,
}

impl Pagination {
    /// Parses a raw query string.
    ///
    /// # Errors
    ///
    /// * `RestError::BadRequest` - `page` or `size` is not a number
    /// * `RestError::InvalidSort` - a `sort` value is malformed
    pub fn from_query(
        query: Option<&str>,
        default_size: u32,
        max_size: u32,
    ) -> Result<Self, RestError> {
        let mut page = 0;
        let mut size = default_size;
        let mut sort = Vec::new();

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "page" => page = parse_number("page", &value)?,
                "size" => size = parse_number("size", &value)?,
                "sort" if value.trim().is_empty() => {}
                "sort" => sort.push(SortOrder::parse(&value)?),
                _ => {}
            }
        }

        let mut request = PageRequest::new(page, size.min(max_size.max(1)));
        request.sort = sort;
        Ok(Self { request })
    }

    /// Returns the page request.
    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// Consumes the extractor and returns the page request.
    pub fn into_request(self) -> PageRequest {
        self.request
    }
}

fn parse_number(name: &str, value: &str) -> Result<u32, RestError> {
    value.trim().parse().map_err(|_| RestError::BadRequest {
        message: format!("Invalid {} parameter: '{}'", name, value),
    })
}

impl<S, I> FromRequestParts<AppState<S, I>> for Pagination
where
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, I>,
    ) -> Result<Self, Self::Rejection> {
        Pagination::from_query(
            parts.uri.query(),
            state.default_page_size(),
            state.max_page_size(),
        )
    }
}

/// Axum extractor for the `query` parameter of the search endpoints.
#[derive(Debug, Clone)]
pub struct SearchText(pub String);

impl SearchText {
    /// Reads `query` from a raw query string.
    ///
    /// # Errors
    ///
    /// * `RestError::InvalidQuery` - the parameter is absent
    pub fn from_query(query: Option<&str>) -> Result<Self, RestError> {
        url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
            .find(|(key, _)| key == "query")
            .map(|(_, value)| SearchText(value.into_owned()))
            .ok_or_else(|| RestError::InvalidQuery {
                message: "required parameter 'query' is missing".to_string(),
            })
    }
}

impl<S> FromRequestParts<S> for SearchText
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        SearchText::from_query(parts.uri.query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_persistence::types::SortDirection;

    #[test]
    fn test_defaults() {
        let pagination = Pagination::from_query(None, 20, 1000).unwrap();
        let request = pagination.request();
        assert_eq!(request.page, 0);
        assert_eq!(request.size, 20);
        assert!(request.sort.is_empty());
    }

    #[test]
    fn test_page_size_and_repeated_sort() {
        let pagination =
            Pagination::from_query(Some("page=2&size=5&sort=name,desc&sort=id"), 20, 1000)
                .unwrap();
        let request = pagination.into_request();
        assert_eq!(request.page, 2);
        assert_eq!(request.size, 5);
        assert_eq!(request.offset(), 10);
        assert_eq!(request.sort.len(), 2);
        assert_eq!(request.sort[0].property, "name");
        assert_eq!(request.sort[0].direction, SortDirection::Desc);
        assert_eq!(request.sort[1].direction, SortDirection::Asc);
    }

    #[test]
    fn test_size_capped_at_max() {
        let pagination = Pagination::from_query(Some("size=5000"), 20, 100).unwrap();
        assert_eq!(pagination.request().size, 100);
    }

    #[test]
    fn test_zero_size_raised_to_one() {
        let pagination = Pagination::from_query(Some("size=0"), 20, 100).unwrap();
        assert_eq!(pagination.request().size, 1);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let err = Pagination::from_query(Some("page=first"), 20, 100).unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));

        let err = Pagination::from_query(Some("size=-1"), 20, 100).unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));
    }

    #[test]
    fn test_invalid_sort_rejected() {
        let err = Pagination::from_query(Some("sort=name,sideways"), 20, 100).unwrap_err();
        assert!(matches!(err, RestError::InvalidSort { .. }));
    }

    #[test]
    fn test_search_text_decoded() {
        let SearchText(text) =
            SearchText::from_query(Some("query=fullName%3A%22john+smith%22&page=1")).unwrap();
        assert_eq!(text, "fullName:\"john smith\"");
    }

    #[test]
    fn test_search_text_missing() {
        let err = SearchText::from_query(Some("page=1")).unwrap_err();
        assert!(matches!(err, RestError::InvalidQuery { .. }));
    }
}
