//! SearchIndex implementation for SQLite.

use async_trait::async_trait;
use bench_domain::{EntityId, FieldSpec};
use chrono::Utc;
use rusqlite::{Transaction, params, params_from_iter};
use serde_json::Value;

use crate::core::SearchIndex;
use crate::error::StorageResult;
use crate::search::{SearchQuery, tokenize};
use crate::types::{Page, PageRequest, StoredEntity};

use super::query_builder::{SqlParam, build_filter, build_order_by};
use super::{SqliteBackend, internal_error, serialization_error};

/// Flattens a document into `(field, tokens)` pairs.
///
/// Nested objects use dotted field names; array elements share their parent
/// field. Nulls produce no entry, so `field:*` does not match them.
fn collect_fields(prefix: &str, value: &Value, out: &mut Vec<(String, Vec<String>)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix.to_string(), vec![b.to_string()])),
        Value::Number(n) => out.push((prefix.to_string(), tokenize(&n.to_string()))),
        Value::String(s) => out.push((prefix.to_string(), tokenize(s))),
        Value::Array(items) => {
            for item in items {
                collect_fields(prefix, item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                collect_fields(&name, item, out);
            }
        }
    }
}

fn remove_document(tx: &Transaction<'_>, entity_type: &str, id: EntityId) -> StorageResult<usize> {
    tx.execute(
        "DELETE FROM search_terms WHERE entity_type = ?1 AND id = ?2",
        params![entity_type, id],
    )
    .map_err(|e| internal_error(format!("Failed to delete search terms: {}", e)))?;
    tx.execute(
        "DELETE FROM search_fields WHERE entity_type = ?1 AND id = ?2",
        params![entity_type, id],
    )
    .map_err(|e| internal_error(format!("Failed to delete search fields: {}", e)))?;
    tx.execute(
        "DELETE FROM search_documents WHERE entity_type = ?1 AND id = ?2",
        params![entity_type, id],
    )
    .map_err(|e| internal_error(format!("Failed to delete search document: {}", e)))
}

#[async_trait]
impl SearchIndex for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn index(&self, entity: &StoredEntity) -> StorageResult<()> {
        let document = entity.document();
        let data = serde_json::to_string(&document)
            .map_err(|e| serialization_error(format!("Failed to serialize document: {}", e)))?;

        let mut fields = Vec::new();
        collect_fields("", &document, &mut fields);

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin index write: {}", e)))?;

        remove_document(&tx, entity.entity_type(), entity.id())?;

        tx.execute(
            "INSERT INTO search_documents (entity_type, id, data, indexed_at) VALUES (?1, ?2, ?3, ?4)",
            params![entity.entity_type(), entity.id(), data, Utc::now().to_rfc3339()],
        )
        .map_err(|e| internal_error(format!("Failed to insert search document: {}", e)))?;

        {
            let mut field_stmt = tx
                .prepare_cached(
                    "INSERT INTO search_fields (entity_type, id, field, value) VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| internal_error(format!("Failed to prepare field insert: {}", e)))?;
            let mut term_stmt = tx
                .prepare_cached(
                    "INSERT INTO search_terms (entity_type, id, field, token) VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| internal_error(format!("Failed to prepare term insert: {}", e)))?;

            for (field, tokens) in &fields {
                let joined = format!(" {} ", tokens.join(" "));
                field_stmt
                    .execute(params![entity.entity_type(), entity.id(), field, joined])
                    .map_err(|e| internal_error(format!("Failed to insert search field: {}", e)))?;

                for token in tokens {
                    term_stmt
                        .execute(params![entity.entity_type(), entity.id(), field, token])
                        .map_err(|e| {
                            internal_error(format!("Failed to insert search term: {}", e))
                        })?;
                }
            }
        }

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit index write: {}", e)))?;

        tracing::trace!(url = %entity.url(), fields = fields.len(), "Indexed document");
        Ok(())
    }

    async fn delete(&self, entity_type: &str, id: EntityId) -> StorageResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin index delete: {}", e)))?;
        remove_document(&tx, entity_type, id)?;
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit index delete: {}", e)))
    }

    async fn search(
        &self,
        entity_type: &str,
        fields: &[FieldSpec],
        query: &SearchQuery,
        request: &PageRequest,
    ) -> StorageResult<Page<Value>> {
        request.check_sort(entity_type, fields)?;

        let filter = build_filter(query.root());
        let conn = self.get_connection()?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM search_documents d WHERE d.entity_type = ? AND ({})",
            filter.sql
        );
        let mut count_params = vec![SqlParam::string(entity_type)];
        count_params.extend(filter.params.iter().cloned());

        let total: i64 = conn
            .query_row(&count_sql, params_from_iter(count_params.iter()), |row| {
                row.get(0)
            })
            .map_err(|e| internal_error(format!("Failed to count search results: {}", e)))?;
        let total = total.max(0) as u64;

        if total == 0 {
            return Ok(Page::empty(request));
        }

        let order_by = build_order_by(&request.sort, "d.id", "d.data");
        let sql = format!(
            "SELECT d.data FROM search_documents d WHERE d.entity_type = ? AND ({}) {} LIMIT ? OFFSET ?",
            filter.sql, order_by.sql
        );
        let mut bound = vec![SqlParam::string(entity_type)];
        bound.extend(filter.params);
        bound.extend(order_by.params);
        bound.push(SqlParam::integer(i64::from(request.size.max(1))));
        bound.push(SqlParam::integer(
            i64::try_from(request.offset()).unwrap_or(i64::MAX),
        ));

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare search: {}", e)))?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), |row| row.get::<_, String>(0))
            .map_err(|e| internal_error(format!("Failed to execute search: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read search row: {}", e)))?;

        let content = rows
            .iter()
            .map(|data| {
                serde_json::from_str::<Value>(data).map_err(|e| {
                    serialization_error(format!("Failed to deserialize document: {}", e))
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        tracing::debug!(
            entity_type,
            query = %query,
            total,
            returned = content.len(),
            "SQLite search"
        );

        Ok(Page::new(content, total, request))
    }

    async fn exists(&self, entity_type: &str, id: EntityId) -> StorageResult<bool> {
        let conn = self.get_connection()?;
        conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM search_documents WHERE entity_type = ?1 AND id = ?2)",
            params![entity_type, id],
            |row| row.get(0),
        )
        .map_err(|e| internal_error(format!("Failed to check document: {}", e)))
    }

    async fn clear(&self, entity_type: &str) -> StorageResult<u64> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin index clear: {}", e)))?;

        tx.execute(
            "DELETE FROM search_terms WHERE entity_type = ?1",
            params![entity_type],
        )
        .map_err(|e| internal_error(format!("Failed to clear search terms: {}", e)))?;
        tx.execute(
            "DELETE FROM search_fields WHERE entity_type = ?1",
            params![entity_type],
        )
        .map_err(|e| internal_error(format!("Failed to clear search fields: {}", e)))?;
        let removed = tx
            .execute(
                "DELETE FROM search_documents WHERE entity_type = ?1",
                params![entity_type],
            )
            .map_err(|e| internal_error(format!("Failed to clear search documents: {}", e)))?;

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit index clear: {}", e)))?;

        Ok(removed as u64)
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.ping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_domain::FieldKind;
    use serde_json::json;

    const EMPLOYEE_FIELDS: &[FieldSpec] = &[
        FieldSpec::required("upsaId", FieldKind::String),
        FieldSpec::required("fullName", FieldKind::String),
        FieldSpec::optional("email", FieldKind::String),
        FieldSpec::optional("title", FieldKind::String),
    ];

    async fn index_with(docs: &[(EntityId, Value)]) -> SqliteBackend {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        for (id, content) in docs {
            SearchIndex::index(&backend, &StoredEntity::new("employee", *id, content.clone()))
                .await
                .unwrap();
        }
        backend
    }

    async fn ids(backend: &SqliteBackend, query: &str) -> Vec<i64> {
        let page = backend
            .search(
                "employee",
                EMPLOYEE_FIELDS,
                &SearchQuery::parse(query).unwrap(),
                &PageRequest::new(0, 50),
            )
            .await
            .unwrap();
        page.content
            .iter()
            .map(|doc| doc["id"].as_i64().unwrap())
            .collect()
    }

    fn staff() -> Vec<(EntityId, Value)> {
        vec![
            (
                1,
                json!({"upsaId": "AAAAA", "fullName": "John Smith", "email": "john@example.com"}),
            ),
            (
                2,
                json!({"upsaId": "BBBBB", "fullName": "Jane Smith-Jones", "title": null}),
            ),
            (
                3,
                json!({"upsaId": "CCCCC", "fullName": "Johnny Walker", "title": "Lead"}),
            ),
        ]
    }

    #[tokio::test]
    async fn test_field_term_is_case_insensitive() {
        let backend = index_with(&staff()).await;
        assert_eq!(ids(&backend, "upsaId:aaaaa").await, vec![1]);
        assert_eq!(ids(&backend, "fullName:SMITH").await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_bare_word_matches_any_field() {
        let backend = index_with(&staff()).await;
        assert_eq!(ids(&backend, "lead").await, vec![3]);
        assert_eq!(ids(&backend, "example").await, vec![1]);
    }

    #[tokio::test]
    async fn test_match_all_and_id() {
        let backend = index_with(&staff()).await;
        assert_eq!(ids(&backend, "*").await, vec![1, 2, 3]);
        assert_eq!(ids(&backend, "id:2").await, vec![2]);
    }

    #[tokio::test]
    async fn test_phrase_and_wildcard() {
        let backend = index_with(&staff()).await;
        assert_eq!(ids(&backend, "fullName:\"smith jones\"").await, vec![2]);
        assert!(ids(&backend, "fullName:\"jones smith\"").await.is_empty());
        assert_eq!(ids(&backend, "fullName:john*").await, vec![1, 3]);
        assert_eq!(ids(&backend, "fullName:j?hn").await, vec![1]);
    }

    #[tokio::test]
    async fn test_boolean_operators() {
        let backend = index_with(&staff()).await;
        assert_eq!(ids(&backend, "smith AND jane").await, vec![2]);
        assert_eq!(ids(&backend, "jane OR walker").await, vec![2, 3]);
        assert_eq!(ids(&backend, "smith -jane").await, vec![1]);
        assert_eq!(ids(&backend, "NOT smith").await, vec![3]);
        assert_eq!(ids(&backend, "(jane OR johnny) AND NOT walker").await, vec![2]);
    }

    #[tokio::test]
    async fn test_exists_skips_nulls() {
        let backend = index_with(&staff()).await;
        assert_eq!(ids(&backend, "title:*").await, vec![3]);
        assert_eq!(ids(&backend, "email:*").await, vec![1]);
    }

    #[tokio::test]
    async fn test_reindex_replaces_terms() {
        let backend = index_with(&staff()).await;
        SearchIndex::index(
            &backend,
            &StoredEntity::new("employee", 1, json!({"upsaId": "ZZZZZ", "fullName": "Renamed"})),
        )
        .await
        .unwrap();

        assert!(ids(&backend, "upsaId:AAAAA").await.is_empty());
        assert_eq!(ids(&backend, "renamed").await, vec![1]);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let backend = index_with(&staff()).await;

        SearchIndex::delete(&backend, "employee", 1).await.unwrap();
        SearchIndex::delete(&backend, "employee", 1).await.unwrap();
        assert!(!backend.exists("employee", 1).await.unwrap());
        assert!(backend.exists("employee", 2).await.unwrap());

        assert_eq!(backend.clear("employee").await.unwrap(), 2);
        assert!(ids(&backend, "*").await.is_empty());
    }

    #[tokio::test]
    async fn test_search_sorts_and_pages() {
        let backend = index_with(&staff()).await;
        let request = PageRequest::new(0, 2).with_sort("fullName", crate::types::SortDirection::Desc);

        let page = backend
            .search(
                "employee",
                EMPLOYEE_FIELDS,
                &SearchQuery::match_all(),
                &request,
            )
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        let names: Vec<_> = page.content.iter().map(|d| d["fullName"].clone()).collect();
        assert_eq!(names, vec![json!("Johnny Walker"), json!("John Smith")]);
    }

    #[tokio::test]
    async fn test_unsatisfiable_term_matches_nothing() {
        let backend = index_with(&staff()).await;
        assert!(ids(&backend, "fullName:--").await.is_empty());
    }
}
