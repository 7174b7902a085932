//! EntityStore implementation for SQLite.

use async_trait::async_trait;
use bench_domain::{EntityId, FieldSpec};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use serde_json::Value;

use crate::core::EntityStore;
use crate::error::StorageResult;
use crate::types::{Page, PageRequest, StoredEntity};

use super::query_builder::{SqlParam, build_order_by};
use super::transaction::SqliteTransaction;
use super::{SqliteBackend, internal_error, parse_timestamp, serialization_error};

const SELECT_COLUMNS: &str = "e.id, e.content, e.created_at, e.last_updated";

struct EntityRow {
    id: EntityId,
    content: String,
    created_at: String,
    last_updated: String,
}

impl EntityRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content: row.get(1)?,
            created_at: row.get(2)?,
            last_updated: row.get(3)?,
        })
    }

    fn into_stored(self, entity_type: &str) -> StorageResult<StoredEntity> {
        let content: Value = serde_json::from_str(&self.content)
            .map_err(|e| serialization_error(format!("Failed to deserialize record: {}", e)))?;
        Ok(StoredEntity::from_storage(
            entity_type,
            self.id,
            content,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.last_updated)?,
        ))
    }
}

/// Maps a JSON scalar to the value `json_extract` yields for it.
fn json_scalar_param(value: &Value) -> Option<SqlParam> {
    match value {
        Value::Null => Some(SqlParam::Null),
        Value::Bool(b) => Some(SqlParam::Integer(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlParam::Integer)
            .or_else(|| n.as_f64().map(SqlParam::Float)),
        Value::String(s) => Some(SqlParam::string(s.as_str())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[async_trait]
impl EntityStore for SqliteBackend {
    type Transaction = SqliteTransaction;

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn begin(&self) -> StorageResult<Self::Transaction> {
        let conn = self.get_connection()?;
        SqliteTransaction::new(conn)
    }

    async fn find_by_id(
        &self,
        entity_type: &str,
        id: EntityId,
    ) -> StorageResult<Option<StoredEntity>> {
        let conn = self.get_connection()?;

        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM entities e WHERE e.entity_type = ?1 AND e.id = ?2",
                    SELECT_COLUMNS
                ),
                params![entity_type, id],
                EntityRow::from_row,
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to read record: {}", e)))?;

        row.map(|row| row.into_stored(entity_type)).transpose()
    }

    async fn find_page(
        &self,
        entity_type: &str,
        fields: &[FieldSpec],
        request: &PageRequest,
    ) -> StorageResult<Page<StoredEntity>> {
        request.check_sort(entity_type, fields)?;

        let total = EntityStore::count(self, entity_type).await?;
        if total == 0 {
            return Ok(Page::empty(request));
        }

        let order_by = build_order_by(&request.sort, "e.id", "e.content");
        let sql = format!(
            "SELECT {} FROM entities e WHERE e.entity_type = ? {} LIMIT ? OFFSET ?",
            SELECT_COLUMNS, order_by.sql
        );

        let mut bound = vec![SqlParam::string(entity_type)];
        bound.extend(order_by.params);
        bound.push(SqlParam::integer(i64::from(request.size.max(1))));
        bound.push(SqlParam::integer(
            i64::try_from(request.offset()).unwrap_or(i64::MAX),
        ));

        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare page query: {}", e)))?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), EntityRow::from_row)
            .map_err(|e| internal_error(format!("Failed to list records: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read record row: {}", e)))?;

        let content = rows
            .into_iter()
            .map(|row| row.into_stored(entity_type))
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(Page::new(content, total, request))
    }

    async fn find_by_field(
        &self,
        entity_type: &str,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<StoredEntity>> {
        let Some(param) = json_scalar_param(value) else {
            return Ok(Vec::new());
        };

        let condition = if matches!(param, SqlParam::Null) {
            "json_extract(e.content, ?) IS NULL"
        } else {
            "json_extract(e.content, ?) = ?"
        };
        let sql = format!(
            "SELECT {} FROM entities e WHERE e.entity_type = ? AND {} ORDER BY e.id ASC",
            SELECT_COLUMNS, condition
        );

        let mut bound = vec![
            SqlParam::string(entity_type),
            SqlParam::string(format!("$.{}", field)),
        ];
        if !matches!(param, SqlParam::Null) {
            bound.push(param);
        }

        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare field query: {}", e)))?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), EntityRow::from_row)
            .map_err(|e| internal_error(format!("Failed to query by field: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read record row: {}", e)))?;

        rows.into_iter()
            .map(|row| row.into_stored(entity_type))
            .collect()
    }

    async fn count(&self, entity_type: &str) -> StorageResult<u64> {
        let conn = self.get_connection()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM entities WHERE entity_type = ?1",
                params![entity_type],
                |row| row.get(0),
            )
            .map_err(|e| internal_error(format!("Failed to count records: {}", e)))?;

        Ok(count.max(0) as u64)
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.ping()
    }
}
