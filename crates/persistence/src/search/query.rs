//! Query-string parser.
//!
//! Parses the subset of the Lucene query-string syntax that the search
//! endpoints accept.
//!
//! # Grammar
//!
//! ```text
//! query    = group
//! group    = disjunct ( ["OR" | "||"] disjunct )*        ; juxtaposition is OR
//! disjunct = clause ( ("AND" | "&&") clause )*
//! clause   = ("NOT" | "!" | "-" | "+") primary / primary
//! primary  = "(" group ")" / term
//! term     = [field ":"] (word / phrase)
//! phrase   = '"' chars '"'
//! word     = chars with optional "*" / "?" wildcards
//! ```
//!
//! `*` and `*:*` match every document; `field:*` matches documents where the
//! field has a value. Matching is case-insensitive and works on tokens:
//! values are split on every character that is not a letter or a digit.
//!
//! # Example
//!
//! ```
//! use bench_persistence::search::{QueryNode, SearchQuery, TermValue};
//!
//! let query = SearchQuery::parse("upsaId:AAAAA").unwrap();
//! match query.root() {
//!     QueryNode::Term { field, value } => {
//!         assert_eq!(field.as_deref(), Some("upsaId"));
//!         assert_eq!(value, &TermValue::Tokens(vec!["aaaaa".to_string()]));
//!     }
//!     other => panic!("unexpected node {other:?}"),
//! }
//!
//! assert!(SearchQuery::parse("name:\"open quote").is_err());
//! ```

use crate::error::SearchError;

/// What a term matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermValue {
    /// Every token must occur in the field.
    Tokens(Vec<String>),
    /// The tokens must occur contiguously, in order.
    Phrase(Vec<String>),
    /// Some token must match the pattern (`*` any run, `?` any one character).
    Wildcard(String),
    /// The field has a non-null value.
    Exists,
}

impl TermValue {
    /// Whether this value can never match anything.
    pub fn is_unsatisfiable(&self) -> bool {
        match self {
            TermValue::Tokens(tokens) | TermValue::Phrase(tokens) => tokens.is_empty(),
            TermValue::Wildcard(pattern) => !pattern
                .chars()
                .all(|c| c == '*' || c == '?' || c.is_alphanumeric()),
            TermValue::Exists => false,
        }
    }
}

/// A node of a parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// Matches every document.
    MatchAll,
    /// Matches one field, or any field when `field` is `None`.
    Term {
        field: Option<String>,
        value: TermValue,
    },
    /// Boolean combination.
    ///
    /// A document matches when every `must` node matches, no `must_not` node
    /// matches, and, if `must` is empty and `should` is not, at least one
    /// `should` node matches.
    Bool {
        must: Vec<QueryNode>,
        should: Vec<QueryNode>,
        must_not: Vec<QueryNode>,
    },
}

/// A parsed query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    root: QueryNode,
}

impl SearchQuery {
    /// Parses a query string.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::QueryParse` for an empty query, an unterminated
    /// quote, unbalanced parentheses, parentheses nested deeper than
    /// [`MAX_NESTING`], an operator with a missing operand, or a `field:`
    /// prefix with an empty field name or no value.
    pub fn parse(input: &str) -> Result<Self, SearchError> {
        let mut parser = QueryParser::new(input);
        let root = parser.parse_group(false)?;
        Ok(Self {
            raw: input.trim().to_string(),
            root,
        })
    }

    /// A query that matches everything.
    pub fn match_all() -> Self {
        Self {
            raw: "*".to_string(),
            root: QueryNode::MatchAll,
        }
    }

    /// The query text as given (trimmed).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed query tree.
    pub fn root(&self) -> &QueryNode {
        &self.root
    }

    /// Whether this query matches every document.
    pub fn is_match_all(&self) -> bool {
        matches!(self.root, QueryNode::MatchAll)
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits text into lowercase alphanumeric tokens.
///
/// ```
/// use bench_persistence::search::tokenize;
///
/// assert_eq!(tokenize("John O'Brien-Smith"), vec!["john", "o", "brien", "smith"]);
/// assert!(tokenize("--").is_empty());
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occur {
    Should,
    Must,
    MustNot,
}

/// Deepest parenthesis nesting a query may use.
pub const MAX_NESTING: usize = 64;

struct QueryParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

fn parse_error(message: impl Into<String>) -> SearchError {
    SearchError::QueryParse {
        message: message.into(),
    }
}

impl<'a> QueryParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.consume();
            } else {
                break;
            }
        }
    }

    /// True if `offset` bytes ahead is the end of a word.
    fn is_boundary(&self, offset: usize) -> bool {
        match self.rest()[offset..].chars().next() {
            None => true,
            Some(c) => c.is_whitespace() || c == '(' || c == ')',
        }
    }

    /// Consumes an operator keyword or symbol if it stands alone.
    fn eat_operator(&mut self, op: &str) -> bool {
        if self.rest().starts_with(op) && self.is_boundary(op.len()) {
            self.pos += op.len();
            true
        } else {
            false
        }
    }

    fn at_operator(&self) -> Option<&'static str> {
        ["AND", "&&", "OR", "||"]
            .into_iter()
            .find(|op| self.rest().starts_with(op) && self.is_boundary(op.len()))
    }

    fn at_group_end(&self) -> bool {
        matches!(self.peek(), None | Some(')'))
    }

    fn parse_group(&mut self, nested: bool) -> Result<QueryNode, SearchError> {
        let mut clauses: Vec<(Occur, QueryNode)> = Vec::new();
        let mut conjunction: Vec<(Occur, QueryNode)> = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None if nested => return Err(parse_error("missing closing parenthesis")),
                None => break,
                Some(')') if nested => {
                    self.consume();
                    break;
                }
                Some(')') => return Err(parse_error("unexpected ')'")),
                Some(_) => {}
            }

            conjunction.push(self.parse_clause()?);
            self.skip_whitespace();

            if self.eat_operator("AND") || self.eat_operator("&&") {
                self.skip_whitespace();
                if self.at_group_end() {
                    return Err(parse_error("AND is missing its right operand"));
                }
                continue;
            }

            if self.eat_operator("OR") || self.eat_operator("||") {
                self.skip_whitespace();
                if self.at_group_end() {
                    return Err(parse_error("OR is missing its right operand"));
                }
            }
            clauses.extend(flush_conjunction(&mut conjunction));
        }
        clauses.extend(flush_conjunction(&mut conjunction));

        if clauses.is_empty() {
            return Err(parse_error(if nested {
                "empty parentheses"
            } else {
                "empty query"
            }));
        }
        Ok(build_bool(clauses))
    }

    fn parse_clause(&mut self) -> Result<(Occur, QueryNode), SearchError> {
        if let Some(op) = self.at_operator() {
            return Err(parse_error(format!("{op} is missing its left operand")));
        }

        let occur = if self.eat_operator("NOT") {
            Occur::MustNot
        } else {
            match self.peek() {
                Some(c @ ('+' | '-' | '!')) => {
                    self.consume();
                    if self.is_boundary(0) && self.peek() != Some('(') {
                        return Err(parse_error(format!("'{c}' must prefix a term")));
                    }
                    if c == '+' { Occur::Must } else { Occur::MustNot }
                }
                _ => Occur::Should,
            }
        };

        self.skip_whitespace();
        if self.at_group_end() {
            return Err(parse_error("negation is missing its operand"));
        }
        if let Some(op) = self.at_operator() {
            return Err(parse_error(format!("unexpected {op}")));
        }

        Ok((occur, self.parse_primary()?))
    }

    fn parse_primary(&mut self) -> Result<QueryNode, SearchError> {
        if self.peek() == Some('(') {
            if self.depth >= MAX_NESTING {
                return Err(parse_error("query nesting too deep"));
            }
            self.consume();
            self.depth += 1;
            let group = self.parse_group(true);
            self.depth -= 1;
            return group;
        }
        if self.peek() == Some('"') {
            let phrase = self.parse_phrase()?;
            return Ok(QueryNode::Term {
                field: None,
                value: TermValue::Phrase(tokenize(&phrase)),
            });
        }
        self.parse_term()
    }

    fn parse_phrase(&mut self) -> Result<String, SearchError> {
        self.consume();
        let mut phrase = String::new();
        loop {
            match self.consume() {
                Some('"') => return Ok(phrase),
                Some('\\') => {
                    if let Some(escaped) = self.consume() {
                        phrase.push(escaped);
                    }
                }
                Some(c) => phrase.push(c),
                None => return Err(parse_error("unterminated quoted phrase")),
            }
        }
    }

    fn parse_term(&mut self) -> Result<QueryNode, SearchError> {
        let mut field: Option<String> = None;
        let mut word = String::new();

        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' {
                break;
            }
            self.consume();
            match c {
                '\\' => {
                    if let Some(escaped) = self.consume() {
                        word.push(escaped);
                    }
                }
                ':' if field.is_none() => {
                    if word.is_empty() {
                        return Err(parse_error("empty field name"));
                    }
                    field = Some(std::mem::take(&mut word));
                    if self.peek() == Some('"') {
                        let phrase = self.parse_phrase()?;
                        return Ok(term(field, TermValue::Phrase(tokenize(&phrase))));
                    }
                    if self.is_boundary(0) {
                        return Err(parse_error(format!(
                            "missing value for field '{}'",
                            field.unwrap_or_default()
                        )));
                    }
                }
                _ => word.push(c),
            }
        }

        if word == "*" {
            return Ok(match field.as_deref() {
                None | Some("*") => QueryNode::MatchAll,
                Some(_) => term(field, TermValue::Exists),
            });
        }

        let value = if word.contains(['*', '?']) {
            TermValue::Wildcard(word.to_lowercase())
        } else {
            TermValue::Tokens(tokenize(&word))
        };
        Ok(term(field, value))
    }
}

fn term(field: Option<String>, value: TermValue) -> QueryNode {
    let field = field.filter(|f| f != "*" && f != "_all");
    QueryNode::Term { field, value }
}

fn flush_conjunction(conjunction: &mut Vec<(Occur, QueryNode)>) -> Vec<(Occur, QueryNode)> {
    match conjunction.len() {
        0 => Vec::new(),
        1 => std::mem::take(conjunction),
        _ => {
            let mut must = Vec::new();
            let mut must_not = Vec::new();
            for (occur, node) in conjunction.drain(..) {
                match occur {
                    Occur::MustNot => must_not.push(node),
                    Occur::Should | Occur::Must => must.push(node),
                }
            }
            vec![(
                Occur::Should,
                QueryNode::Bool {
                    must,
                    should: Vec::new(),
                    must_not,
                },
            )]
        }
    }
}

fn build_bool(mut clauses: Vec<(Occur, QueryNode)>) -> QueryNode {
    if clauses.len() == 1 && clauses[0].0 == Occur::Should {
        if let Some((_, node)) = clauses.pop() {
            return node;
        }
    }
    if clauses
        .iter()
        .any(|(occur, node)| *occur == Occur::Should && *node == QueryNode::MatchAll)
        && clauses.iter().all(|(occur, _)| *occur == Occur::Should)
    {
        return QueryNode::MatchAll;
    }

    let mut must = Vec::new();
    let mut should = Vec::new();
    let mut must_not = Vec::new();
    for (occur, node) in clauses {
        match occur {
            Occur::Must => must.push(node),
            Occur::Should => should.push(node),
            Occur::MustNot => must_not.push(node),
        }
    }
    QueryNode::Bool {
        must,
        should,
        must_not,
    }
}
