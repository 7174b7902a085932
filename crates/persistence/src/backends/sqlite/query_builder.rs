//! SQL query builder for search and listing.
//!
//! Translates a parsed [`QueryNode`] into a boolean SQL expression over the
//! `search_terms` and `search_fields` tables, correlated with the outer
//! `search_documents d` row. Fragments use anonymous `?` placeholders so they
//! can be nested and concatenated in any order; parameters are kept in the
//! order their placeholders appear.

use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;

use crate::search::{QueryNode, TermValue};
use crate::types::SortOrder;

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::String(s) => ToSqlOutput::from(s.as_str()),
            SqlParam::Integer(i) => ToSqlOutput::from(*i),
            SqlParam::Float(f) => ToSqlOutput::from(*f),
            SqlParam::Null => ToSqlOutput::from(rusqlite::types::Null),
        })
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A fragment that is always true.
    pub fn always() -> Self {
        Self::new("1")
    }

    /// A fragment that is always false.
    pub fn never() -> Self {
        Self::new("0")
    }

    /// Combines with another fragment using AND.
    pub fn and(mut self, other: SqlFragment) -> Self {
        if !self.sql.is_empty() && !other.sql.is_empty() {
            self.sql = format!("({}) AND ({})", self.sql, other.sql);
        } else if !other.sql.is_empty() {
            self.sql = other.sql;
        }
        self.params.extend(other.params);
        self
    }

    /// Combines with another fragment using OR.
    pub fn or(mut self, other: SqlFragment) -> Self {
        if !self.sql.is_empty() && !other.sql.is_empty() {
            self.sql = format!("({}) OR ({})", self.sql, other.sql);
        } else if !other.sql.is_empty() {
            self.sql = other.sql;
        }
        self.params.extend(other.params);
        self
    }

    /// Negates the fragment.
    pub fn not(self) -> Self {
        Self {
            sql: format!("NOT ({})", self.sql),
            params: self.params,
        }
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Builds the filter expression for a query tree.
pub fn build_filter(node: &QueryNode) -> SqlFragment {
    match node {
        QueryNode::MatchAll => SqlFragment::always(),
        QueryNode::Term { field, value } => build_term(field.as_deref(), value),
        QueryNode::Bool {
            must,
            should,
            must_not,
        } => build_bool(must, should, must_not),
    }
}

fn build_bool(must: &[QueryNode], should: &[QueryNode], must_not: &[QueryNode]) -> SqlFragment {
    let mut fragment = SqlFragment::new("");

    for node in must {
        fragment = fragment.and(build_filter(node));
    }

    if must.is_empty() && !should.is_empty() {
        let any = should
            .iter()
            .map(build_filter)
            .fold(SqlFragment::new(""), SqlFragment::or);
        fragment = fragment.and(any);
    }

    for node in must_not {
        fragment = fragment.and(build_filter(node).not());
    }

    if fragment.is_empty() {
        SqlFragment::always()
    } else {
        fragment
    }
}

fn build_term(field: Option<&str>, value: &TermValue) -> SqlFragment {
    if value.is_unsatisfiable() {
        return SqlFragment::never();
    }

    match value {
        TermValue::Tokens(tokens) => tokens
            .iter()
            .map(|token| term_exists(field, "t.token = ?", SqlParam::string(token)))
            .fold(SqlFragment::new(""), SqlFragment::and),
        TermValue::Wildcard(pattern) => {
            term_exists(field, "t.token GLOB ?", SqlParam::string(pattern))
        }
        TermValue::Phrase(tokens) => field_exists(
            field,
            Some(SqlParam::string(format!("% {} %", tokens.join(" ")))),
        ),
        TermValue::Exists => field_exists(field, None),
    }
}

/// `EXISTS` over `search_terms` for one token condition.
fn term_exists(field: Option<&str>, condition: &str, value: SqlParam) -> SqlFragment {
    let mut sql = String::from(
        "EXISTS (SELECT 1 FROM search_terms t \
         WHERE t.entity_type = d.entity_type AND t.id = d.id",
    );
    let mut params = Vec::new();

    if let Some(field) = field {
        sql.push_str(" AND t.field = ?");
        params.push(SqlParam::string(field));
    }
    sql.push_str(" AND ");
    sql.push_str(condition);
    sql.push(')');
    params.push(value);

    SqlFragment::with_params(sql, params)
}

/// `EXISTS` over `search_fields`, optionally matching the joined token list.
fn field_exists(field: Option<&str>, like: Option<SqlParam>) -> SqlFragment {
    let mut sql = String::from(
        "EXISTS (SELECT 1 FROM search_fields f \
         WHERE f.entity_type = d.entity_type AND f.id = d.id",
    );
    let mut params = Vec::new();

    if let Some(field) = field {
        sql.push_str(" AND f.field = ?");
        params.push(SqlParam::string(field));
    }
    if let Some(like) = like {
        sql.push_str(" AND f.value LIKE ?");
        params.push(like);
    }
    sql.push(')');

    SqlFragment::with_params(sql, params)
}

/// Builds an `ORDER BY` clause.
///
/// `id_column` and `json_column` name the identity and JSON document columns
/// of the outer query. Sort properties must already be checked against the
/// record schema. An `id` tie-breaker is appended unless `id` is sorted on.
pub fn build_order_by(sort: &[SortOrder], id_column: &str, json_column: &str) -> SqlFragment {
    let mut terms = Vec::with_capacity(sort.len() + 1);
    let mut params = Vec::new();
    let mut has_id = false;

    for order in sort {
        if order.property == "id" {
            has_id = true;
            terms.push(format!("{} {}", id_column, order.direction.as_sql()));
        } else {
            terms.push(format!(
                "json_extract({}, ?) {}",
                json_column,
                order.direction.as_sql()
            ));
            params.push(SqlParam::string(format!("$.{}", order.property)));
        }
    }

    if !has_id {
        terms.push(format!("{} ASC", id_column));
    }

    SqlFragment::with_params(format!("ORDER BY {}", terms.join(", ")), params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchQuery;
    use crate::types::SortOrder;

    fn filter(query: &str) -> SqlFragment {
        build_filter(SearchQuery::parse(query).unwrap().root())
    }

    #[test]
    fn test_match_all() {
        assert_eq!(filter("*").sql, "1");
        assert!(filter("*:*").params.is_empty());
    }

    #[test]
    fn test_field_term() {
        let fragment = filter("upsaId:AAAAA");
        assert!(fragment.sql.contains("t.field = ?"));
        assert!(fragment.sql.contains("t.token = ?"));
        assert_eq!(
            fragment.params,
            vec![SqlParam::string("upsaId"), SqlParam::string("aaaaa")]
        );
    }

    #[test]
    fn test_bare_word_searches_all_fields() {
        let fragment = filter("delivery");
        assert!(!fragment.sql.contains("t.field"));
        assert_eq!(fragment.params, vec![SqlParam::string("delivery")]);
    }

    #[test]
    fn test_phrase_uses_like() {
        let fragment = filter("name:\"John Smith\"");
        assert!(fragment.sql.contains("f.value LIKE ?"));
        assert_eq!(fragment.params[1], SqlParam::string("% john smith %"));
    }

    #[test]
    fn test_wildcard_uses_glob() {
        let fragment = filter("name:jo*");
        assert!(fragment.sql.contains("GLOB"));
        assert_eq!(fragment.params[1], SqlParam::string("jo*"));
    }

    #[test]
    fn test_negation() {
        let fragment = filter("NOT name:x");
        assert!(fragment.sql.contains("NOT ("));
    }

    #[test]
    fn test_should_ignored_with_must() {
        let fragment = filter("+name:a name:b");
        assert_eq!(fragment.params.len(), 2);
    }

    #[test]
    fn test_order_by_appends_tie_breaker() {
        let fragment = build_order_by(&[SortOrder::desc("name")], "d.id", "d.data");
        assert_eq!(
            fragment.sql,
            "ORDER BY json_extract(d.data, ?) DESC, d.id ASC"
        );
        assert_eq!(fragment.params, vec![SqlParam::string("$.name")]);

        let by_id = build_order_by(&[SortOrder::desc("id")], "e.id", "e.content");
        assert_eq!(by_id.sql, "ORDER BY e.id DESC");
        assert_eq!(build_order_by(&[], "e.id", "e.content").sql, "ORDER BY e.id ASC");
    }
}
