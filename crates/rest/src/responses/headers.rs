//! Response header generation.
//!
//! Two families of headers are produced here:
//!
//! - pagination: `X-Total-Count` and an RFC 5988 `Link` header with `next`,
//!   `prev`, `last` and `first` relations
//! - alerts: `X-{app}-alert` / `X-{app}-error` plus `X-{app}-params`, telling
//!   a client what a write did or why it failed
//!
//! Handlers attach an [`Alert`] to the response extensions; the alert
//! middleware renders it once the application name is known.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use bench_domain::EntityId;
use bench_persistence::types::Page;
use tracing::warn;

/// The total number of matches across all pages.
pub const X_TOTAL_COUNT: &str = "x-total-count";

/// An alert describing the outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// A record was created.
    Created {
        /// The record type.
        entity_type: String,
        /// The new id.
        id: EntityId,
    },
    /// A record was updated.
    Updated {
        /// The record type.
        entity_type: String,
        /// The record id.
        id: EntityId,
    },
    /// A record was deleted.
    Deleted {
        /// The record type.
        entity_type: String,
        /// The record id.
        id: EntityId,
    },
    /// The request failed.
    Failure {
        /// The record type, or empty.
        entity_type: String,
        /// Error key without the `error.` prefix.
        key: String,
    },
}

impl Alert {
    /// A creation alert.
    pub fn created(entity_type: &str, id: EntityId) -> Self {
        Alert::Created {
            entity_type: entity_type.to_string(),
            id,
        }
    }

    /// An update alert.
    pub fn updated(entity_type: &str, id: EntityId) -> Self {
        Alert::Updated {
            entity_type: entity_type.to_string(),
            id,
        }
    }

    /// A deletion alert.
    pub fn deleted(entity_type: &str, id: EntityId) -> Self {
        Alert::Deleted {
            entity_type: entity_type.to_string(),
            id,
        }
    }

    /// A failure alert.
    pub fn failure(entity_type: &str, key: &str) -> Self {
        Alert::Failure {
            entity_type: entity_type.to_string(),
            key: key.to_string(),
        }
    }

    /// Returns the header suffix, the message and the params value.
    fn parts(&self, app_name: &str) -> (&'static str, String, String) {
        match self {
            Alert::Created { entity_type, id } => (
                "alert",
                format!("{}.{}.created", app_name, entity_type),
                id.to_string(),
            ),
            Alert::Updated { entity_type, id } => (
                "alert",
                format!("{}.{}.updated", app_name, entity_type),
                id.to_string(),
            ),
            Alert::Deleted { entity_type, id } => (
                "alert",
                format!("{}.{}.deleted", app_name, entity_type),
                id.to_string(),
            ),
            Alert::Failure { entity_type, key } => {
                ("error", format!("error.{}", key), entity_type.clone())
            }
        }
    }

    /// Builds the alert headers for an application.
    ///
    /// An application name that cannot appear in a header name yields no
    /// headers.
    pub fn to_header_map(&self, app_name: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let (suffix, message, params) = self.parts(app_name);

        let names = (
            HeaderName::try_from(format!("x-{}-{}", app_name, suffix)),
            HeaderName::try_from(format!("x-{}-params", app_name)),
        );
        let (Ok(message_name), Ok(params_name)) = names else {
            warn!(app_name, "Application name is not a valid header token");
            return headers;
        };

        if let Ok(value) = HeaderValue::from_str(&message) {
            headers.insert(message_name, value);
        }
        if let Ok(value) = HeaderValue::from_str(&params) {
            headers.insert(params_name, value);
        }
        headers
    }
}

/// Builds `X-Total-Count` and `Link` headers for a page of results.
///
/// `base_path` is the request path without a query string. For search
/// results, `query` is carried URL-encoded in every link.
pub fn pagination_headers<T>(page: &Page<T>, base_path: &str, query: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_TOTAL_COUNT, HeaderValue::from(page.total));

    let link_to = |number: u64| {
        let mut uri = format!("{}?", base_path);
        if let Some(query) = query {
            let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
            uri.push_str(&format!("query={}&", encoded));
        }
        uri.push_str(&format!("page={}&size={}", number, page.size));
        uri
    };

    let current = u64::from(page.page);
    let mut links = Vec::with_capacity(4);
    if page.has_next() {
        links.push(format!("<{}>; rel=\"next\"", link_to(current + 1)));
    }
    if page.has_previous() {
        links.push(format!("<{}>; rel=\"prev\"", link_to(current - 1)));
    }
    let last = page.total_pages().saturating_sub(1);
    links.push(format!("<{}>; rel=\"last\"", link_to(last)));
    links.push(format!("<{}>; rel=\"first\"", link_to(0)));

    match HeaderValue::from_str(&links.join(",")) {
        Ok(value) => {
            headers.insert(axum::http::header::LINK, value);
        }
        Err(e) => warn!(base_path, error = %e, "Link header is not a valid header value"),
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_persistence::types::PageRequest;

    fn page(page: u32, size: u32, total: u64) -> Page<()> {
        Page::new(Vec::new(), total, &PageRequest::new(page, size))
    }

    #[test]
    fn test_created_alert_headers() {
        let headers = Alert::created("location", 42).to_header_map("benchApp");
        assert_eq!(
            headers.get("X-benchApp-alert").unwrap(),
            "benchApp.location.created"
        );
        assert_eq!(headers.get("X-benchApp-params").unwrap(), "42");
        assert!(headers.get("X-benchApp-error").is_none());
    }

    #[test]
    fn test_failure_alert_headers() {
        let headers = Alert::failure("unit", "idexists").to_header_map("benchApp");
        assert_eq!(headers.get("x-benchapp-error").unwrap(), "error.idexists");
        assert_eq!(headers.get("x-benchapp-params").unwrap(), "unit");
    }

    #[test]
    fn test_invalid_app_name_yields_no_headers() {
        let headers = Alert::deleted("unit", 1).to_header_map("bench app");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_middle_page_links() {
        let headers = pagination_headers(&page(1, 10, 35), "/api/locations", None);
        assert_eq!(headers.get(X_TOTAL_COUNT).unwrap(), "35");
        assert_eq!(
            headers.get("link").unwrap(),
            "</api/locations?page=2&size=10>; rel=\"next\",\
             </api/locations?page=0&size=10>; rel=\"prev\",\
             </api/locations?page=3&size=10>; rel=\"last\",\
             </api/locations?page=0&size=10>; rel=\"first\""
        );
    }

    #[test]
    fn test_empty_result_links() {
        let headers = pagination_headers(&page(0, 20, 0), "/api/units", None);
        assert_eq!(headers.get(X_TOTAL_COUNT).unwrap(), "0");
        assert_eq!(
            headers.get("link").unwrap(),
            "</api/units?page=0&size=20>; rel=\"last\",</api/units?page=0&size=20>; rel=\"first\""
        );
    }

    #[test]
    fn test_search_links_carry_encoded_query() {
        let headers = pagination_headers(
            &page(0, 5, 6),
            "/api/_search/employees",
            Some("fullName:\"john smith\""),
        );
        let link = headers.get("link").unwrap().to_str().unwrap();
        assert!(link.starts_with(
            "</api/_search/employees?query=fullName%3A%22john+smith%22&page=1&size=5>; rel=\"next\""
        ));
        assert!(link.ends_with("query=fullName%3A%22john+smith%22&page=0&size=5>; rel=\"first\""));
    }
}
