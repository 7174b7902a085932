//! Pagination and sorting types.
//!
//! Listing and search both use zero-based offset pagination. A
//! [`PageRequest`] names the page, its size and an ordered list of sort
//! properties; a [`Page`] carries one page of results and the total match
//! count so the HTTP layer can build navigation links.

use bench_domain::FieldSpec;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending (default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    /// The JSON field name, or `id`.
    pub property: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortOrder {
    /// Creates an ascending sort on a property.
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Creates a descending sort on a property.
    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses `property[,asc|desc]`.
    ///
    /// ```
    /// use bench_persistence::types::{SortDirection, SortOrder};
    ///
    /// let order = SortOrder::parse("name,desc").unwrap();
    /// assert_eq!(order.property, "name");
    /// assert_eq!(order.direction, SortDirection::Desc);
    /// assert_eq!(SortOrder::parse("id").unwrap().direction, SortDirection::Asc);
    /// ```
    pub fn parse(value: &str) -> Result<Self, SearchError> {
        let mut parts = value.split(',').map(str::trim);
        let property = parts.next().unwrap_or_default();
        if property.is_empty() {
            return Err(invalid_sort("", value));
        }

        let direction = match parts.next() {
            None | Some("") => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            Some(_) => return Err(invalid_sort("", value)),
        };

        if parts.next().is_some() {
            return Err(invalid_sort("", value));
        }

        Ok(Self {
            property: property.to_string(),
            direction,
        })
    }
}

fn invalid_sort(entity_type: &str, property: &str) -> SearchError {
    SearchError::InvalidSort {
        entity_type: entity_type.to_string(),
        property: property.to_string(),
    }
}

/// A request for one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u32,
    /// Maximum number of results per page (at least 1).
    pub size: u32,
    /// Sort keys, most significant first. Empty means `id ASC`.
    #[serde(default)]
    pub sort: Vec<SortOrder>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort: Vec::new(),
        }
    }
}

impl PageRequest {
    /// Creates an unsorted page request. A size of 0 is raised to 1.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.max(1),
            sort: Vec::new(),
        }
    }

    /// Adds a sort key.
    pub fn with_sort(mut self, property: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortOrder {
            property: property.into(),
            direction,
        });
        self
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Checks that every sort property is `id` or a declared field.
    pub fn check_sort(&self, entity_type: &str, fields: &[FieldSpec]) -> Result<(), SearchError> {
        for order in &self.sort {
            let known = order.property == "id"
                || fields.iter().any(|spec| spec.name == order.property);
            if !known {
                return Err(invalid_sort(entity_type, &order.property));
            }
        }
        Ok(())
    }

    /// Returns the request for the next page.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self.clone()
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The results on this page.
    pub content: Vec<T>,
    /// Total number of matches across all pages.
    pub total: u64,
    /// Zero-based page number.
    pub page: u32,
    /// Requested page size.
    pub size: u32,
}

impl<T> Page<T> {
    /// Creates a page for a request.
    pub fn new(content: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self {
            content,
            total,
            page: request.page,
            size: request.size.max(1),
        }
    }

    /// Creates an empty page for a request.
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    /// Number of pages needed for all matches.
    pub fn total_pages(&self) -> u64 {
        let size = u64::from(self.size.max(1));
        self.total.div_ceil(size)
    }

    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages()
    }

    /// Whether an earlier page exists.
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Whether this is the first page.
    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    /// Whether this is the last page.
    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Returns the number of results on this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if this page has no results.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Maps the results to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }

    /// Maps the results with a fallible function.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            page: self.page,
            size: self.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_domain::FieldKind;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::required("upsaId", FieldKind::String),
        FieldSpec::optional("name", FieldKind::String),
    ];

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 75);
        assert_eq!(PageRequest::new(1, 0).size, 1);
    }

    #[test]
    fn test_page_navigation() {
        let request = PageRequest::new(1, 10);
        let page: Page<u8> = Page::new(vec![0; 10], 25, &request);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let last: Page<u8> = Page::new(vec![0; 5], 25, &PageRequest::new(2, 10));
        assert!(last.is_last());
        assert!(!last.is_first());

        let empty: Page<u8> = Page::empty(&PageRequest::default());
        assert_eq!(empty.total_pages(), 0);
        assert!(empty.is_first());
        assert!(empty.is_last());
    }

    #[test]
    fn test_sort_parse_rejects_bad_direction() {
        assert!(SortOrder::parse("name,sideways").is_err());
        assert!(SortOrder::parse(",asc").is_err());
        assert!(SortOrder::parse("name,asc,extra").is_err());
        assert_eq!(
            SortOrder::parse("upsaId,DESC").unwrap(),
            SortOrder::desc("upsaId")
        );
    }

    #[test]
    fn test_check_sort() {
        let ok = PageRequest::default()
            .with_sort("id", SortDirection::Desc)
            .with_sort("name", SortDirection::Asc);
        assert!(ok.check_sort("unit", FIELDS).is_ok());

        let bad = PageRequest::default().with_sort("salary", SortDirection::Asc);
        let err = bad.check_sort("unit", FIELDS).unwrap_err();
        assert!(matches!(err, SearchError::InvalidSort { ref property, .. } if property == "salary"));
    }

    #[test]
    fn test_try_map() {
        let page = Page::new(vec!["1", "2"], 2, &PageRequest::default());
        let parsed: Page<i32> = page.try_map(|s| s.parse::<i32>()).unwrap();
        assert_eq!(parsed.content, vec![1, 2]);
    }
}
