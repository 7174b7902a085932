//! SearchIndex implementation for Elasticsearch.

use async_trait::async_trait;
use bench_domain::{EntityId, FieldKind, FieldSpec};
use elasticsearch::{DeleteByQueryParts, DeleteParts, ExistsParts, IndexParts, SearchParts};
use serde_json::{Value, json};

use crate::core::SearchIndex;
use crate::error::{BackendError, StorageError, StorageResult};
use crate::search::SearchQuery;
use crate::types::{Page, PageRequest, SortOrder, StoredEntity};

use super::backend::{ElasticsearchBackend, internal_error};

/// Maps a sort property to the indexed field that sorts it.
fn sort_field(property: &str, fields: &[FieldSpec]) -> String {
    match fields.iter().find(|spec| spec.name == property).map(|s| s.kind) {
        Some(FieldKind::String) | Some(FieldKind::Timestamp) => format!("{}.keyword", property),
        _ => property.to_string(),
    }
}

/// Builds the `sort` clause. Ties are broken by id.
fn build_sort(sort: &[SortOrder], fields: &[FieldSpec]) -> Vec<Value> {
    let mut clauses: Vec<Value> = sort
        .iter()
        .map(|order| {
            let mut clause = serde_json::Map::new();
            clause.insert(
                sort_field(&order.property, fields),
                json!({
                    "order": order.direction.to_string(),
                    "unmapped_type": "keyword"
                }),
            );
            Value::Object(clause)
        })
        .collect();

    if !sort.iter().any(|order| order.property == "id") {
        clauses.push(json!({ "id": { "order": "asc" } }));
    }
    clauses
}

/// Builds the request body for one page of a query.
///
/// The query text has already been parsed; Elasticsearch evaluates the raw
/// text with its own `query_string` parser.
pub(crate) fn build_search_body(
    query: &SearchQuery,
    fields: &[FieldSpec],
    request: &PageRequest,
) -> Value {
    let es_query = if query.is_match_all() {
        json!({ "match_all": {} })
    } else {
        json!({
            "query_string": {
                "query": query.raw(),
                "default_operator": "OR",
                "analyze_wildcard": true,
                "lenient": true
            }
        })
    };

    json!({
        "query": es_query,
        "from": request.offset(),
        "size": request.size.max(1),
        "sort": build_sort(&request.sort, fields),
        "track_total_hits": true
    })
}

#[async_trait]
impl SearchIndex for ElasticsearchBackend {
    fn backend_name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn index(&self, entity: &StoredEntity) -> StorageResult<()> {
        self.ensure_index(entity.entity_type()).await?;

        let index = self.index_name(entity.entity_type());
        let doc_id = entity.id().to_string();

        let response = self
            .client()
            .index(IndexParts::IndexId(&index, &doc_id))
            .refresh(self.config().refresh.as_param())
            .body(entity.document())
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to index document: {}", e)))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to index document (status {}): {}",
                status, body
            )));
        }

        tracing::trace!(index = %index, id = %doc_id, "Indexed document");
        Ok(())
    }

    async fn delete(&self, entity_type: &str, id: EntityId) -> StorageResult<()> {
        let index = self.index_name(entity_type);
        let doc_id = id.to_string();

        let response = self
            .client()
            .delete(DeleteParts::IndexId(&index, &doc_id))
            .refresh(self.config().refresh.as_param())
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to delete document: {}", e)))?;

        let status = response.status_code();
        // 404: document or index already gone.
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(internal_error(format!(
                "Failed to delete document (status {}): {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn search(
        &self,
        entity_type: &str,
        fields: &[FieldSpec],
        query: &SearchQuery,
        request: &PageRequest,
    ) -> StorageResult<Page<Value>> {
        request.check_sort(entity_type, fields)?;

        let index = self.index_name(entity_type);
        let body = build_search_body(query, fields, request);

        let response = self
            .client()
            .search(SearchParts::Index(&[&index]))
            .body(body)
            .send()
            .await
            .map_err(|e| internal_error(format!("Search failed: {}", e)))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            // Nothing of this type has been indexed yet.
            if body.contains("index_not_found_exception") {
                return Ok(Page::empty(request));
            }
            return Err(internal_error(format!("Search failed: {}", body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse search response: {}", e)))?;

        let total = body
            .get("hits")
            .and_then(|h| h.get("total"))
            .and_then(|t| t.get("value"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let content: Vec<Value> = body
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(|h| h.as_array())
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| hit.get("_source").cloned())
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(
            index = %index,
            query = %query,
            total,
            returned = content.len(),
            "Elasticsearch search"
        );

        Ok(Page::new(content, total, request))
    }

    async fn exists(&self, entity_type: &str, id: EntityId) -> StorageResult<bool> {
        let index = self.index_name(entity_type);
        let doc_id = id.to_string();

        let response = self
            .client()
            .exists(ExistsParts::IndexId(&index, &doc_id))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to check document: {}", e)))?;

        Ok(response.status_code().is_success())
    }

    async fn clear(&self, entity_type: &str) -> StorageResult<u64> {
        let index = self.index_name(entity_type);

        let response = self
            .client()
            .delete_by_query(DeleteByQueryParts::Index(&[&index]))
            .refresh(true)
            .body(json!({ "query": { "match_all": {} } }))
            .send()
            .await
            .map_err(|e| internal_error(format!("Failed to clear index {}: {}", index, e)))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("index_not_found_exception") {
                self.forget_index(entity_type);
                return Ok(0);
            }
            return Err(internal_error(format!(
                "Failed to clear index {}: {}",
                index, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| internal_error(format!("Failed to parse clear response: {}", e)))?;

        Ok(body.get("deleted").and_then(|d| d.as_u64()).unwrap_or(0))
    }

    async fn health_check(&self) -> StorageResult<()> {
        let unavailable = |message: String| {
            StorageError::Backend(BackendError::Unavailable {
                backend_name: "elasticsearch".to_string(),
                message,
            })
        };

        let response = self
            .client()
            .cluster()
            .health(elasticsearch::cluster::ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| unavailable(format!("Health check failed: {}", e)))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(unavailable(format!(
                "Cluster health returned status {}",
                status
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| internal_error(format!("Failed to parse health response: {}", e)))?;

        let cluster_status = body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        if cluster_status == "red" {
            return Err(unavailable(format!("Cluster status is red: {:?}", body)));
        }

        Ok(())
    }
}
