//! Transaction support for SQLite backend.

use std::sync::Arc;

use async_trait::async_trait;
use bench_domain::EntityId;
use chrono::Utc;
use parking_lot::Mutex;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;

use crate::core::StoreTransaction;
use crate::error::{ResourceError, StorageError, StorageResult, TransactionError};
use crate::types::StoredEntity;

use super::{internal_error, parse_timestamp, serialization_error};

/// A SQLite write transaction.
///
/// Holds its pooled connection until it is committed, rolled back or dropped.
pub struct SqliteTransaction {
    conn: Arc<Mutex<PooledConnection<SqliteConnectionManager>>>,
    active: bool,
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction")
            .field("active", &self.active)
            .finish()
    }
}

impl SqliteTransaction {
    pub(crate) fn new(conn: PooledConnection<SqliteConnectionManager>) -> StorageResult<Self> {
        conn.execute("BEGIN IMMEDIATE", []).map_err(|e| {
            StorageError::Transaction(TransactionError::RolledBack {
                reason: format!("Failed to begin transaction: {}", e),
            })
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            active: true,
        })
    }

    fn ensure_active(&self) -> StorageResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(StorageError::Transaction(
                TransactionError::InvalidTransaction,
            ))
        }
    }
}

/// Removes `id` from the attributes; identity lives in its own column.
fn strip_id(mut content: Value) -> StorageResult<Value> {
    match content.as_object_mut() {
        Some(obj) => {
            obj.remove("id");
            Ok(content)
        }
        None => Err(serialization_error(
            "record content must be a JSON object".to_string(),
        )),
    }
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn save(
        &mut self,
        entity_type: &str,
        id: Option<EntityId>,
        content: Value,
    ) -> StorageResult<StoredEntity> {
        self.ensure_active()?;

        let content = strip_id(content)?;
        let data = serde_json::to_string(&content)
            .map_err(|e| serialization_error(format!("Failed to serialize record: {}", e)))?;
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let conn = self.conn.lock();

        match id {
            None => {
                conn.execute(
                    "INSERT INTO entities (entity_type, content, created_at, last_updated)
                     VALUES (?1, ?2, ?3, ?3)",
                    params![entity_type, data, now_str],
                )
                .map_err(|e| internal_error(format!("Failed to insert record: {}", e)))?;

                let id = conn.last_insert_rowid();
                Ok(StoredEntity::from_storage(entity_type, id, content, now, now))
            }
            Some(id) => {
                let created_at: Option<String> = conn
                    .query_row(
                        "SELECT created_at FROM entities WHERE entity_type = ?1 AND id = ?2",
                        params![entity_type, id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| internal_error(format!("Failed to read record: {}", e)))?;

                let Some(created_at) = created_at else {
                    return Err(StorageError::Resource(ResourceError::NotFound {
                        entity_type: entity_type.to_string(),
                        id,
                    }));
                };

                conn.execute(
                    "UPDATE entities SET content = ?1, last_updated = ?2
                     WHERE entity_type = ?3 AND id = ?4",
                    params![data, now_str, entity_type, id],
                )
                .map_err(|e| internal_error(format!("Failed to update record: {}", e)))?;

                Ok(StoredEntity::from_storage(
                    entity_type,
                    id,
                    content,
                    parse_timestamp(&created_at)?,
                    now,
                ))
            }
        }
    }

    async fn delete(&mut self, entity_type: &str, id: EntityId) -> StorageResult<bool> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        let removed = conn
            .execute(
                "DELETE FROM entities WHERE entity_type = ?1 AND id = ?2",
                params![entity_type, id],
            )
            .map_err(|e| internal_error(format!("Failed to delete record: {}", e)))?;

        Ok(removed > 0)
    }

    async fn commit(mut self: Box<Self>) -> StorageResult<()> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        conn.execute("COMMIT", []).map_err(|e| {
            StorageError::Transaction(TransactionError::RolledBack {
                reason: format!("Commit failed: {}", e),
            })
        })?;
        drop(conn);

        self.active = false;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> StorageResult<()> {
        self.ensure_active()?;

        let conn = self.conn.lock();
        conn.execute("ROLLBACK", []).map_err(|e| {
            StorageError::Transaction(TransactionError::RolledBack {
                reason: format!("Rollback failed: {}", e),
            })
        })?;
        drop(conn);

        self.active = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.active {
            let conn = self.conn.lock();
            let _ = conn.execute("ROLLBACK", []);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sqlite::SqliteBackend;
    use crate::core::EntityStore;
    use serde_json::json;

    fn create_test_backend() -> SqliteBackend {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.init_schema().unwrap();
        backend
    }

    #[tokio::test]
    async fn test_commit_persists() {
        let backend = create_test_backend();

        let mut tx = backend.begin().await.unwrap();
        let stored = tx
            .save("unit", None, json!({"upsaId": "U-1", "name": "Delivery"}))
            .await
            .unwrap();
        assert!(tx.is_active());
        Box::new(tx).commit().await.unwrap();

        let read = backend.find_by_id("unit", stored.id()).await.unwrap();
        assert_eq!(read.unwrap().content()["name"], "Delivery");
    }

    #[tokio::test]
    async fn test_rollback_discards() {
        let backend = create_test_backend();

        let mut tx = backend.begin().await.unwrap();
        let stored = tx.save("unit", None, json!({"upsaId": "U-1"})).await.unwrap();
        Box::new(tx).rollback().await.unwrap();

        assert!(backend.find_by_id("unit", stored.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let backend = create_test_backend();

        let id = {
            let mut tx = backend.begin().await.unwrap();
            tx.save("unit", None, json!({"upsaId": "U-1"})).await.unwrap().id()
        };

        assert!(backend.find_by_id("unit", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_created_at_and_drops_body_id() {
        let backend = create_test_backend();

        let mut tx = backend.begin().await.unwrap();
        let first = tx.save("unit", None, json!({"upsaId": "U-1"})).await.unwrap();
        let second = tx
            .save("unit", Some(first.id()), json!({"id": 999, "upsaId": "U-2"}))
            .await
            .unwrap();
        Box::new(tx).commit().await.unwrap();

        assert_eq!(second.id(), first.id());
        assert_eq!(second.created_at(), first.created_at());
        assert!(second.content().get("id").is_none());
        assert_eq!(second.content()["upsaId"], "U-2");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let backend = create_test_backend();

        let mut tx = backend.begin().await.unwrap();
        let err = tx.save("unit", Some(42), json!({"upsaId": "U"})).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_wrong_type_is_not_found() {
        let backend = create_test_backend();

        let mut tx = backend.begin().await.unwrap();
        let unit = tx.save("unit", None, json!({"upsaId": "U"})).await.unwrap();
        let err = tx
            .save("location", Some(unit.id()), json!({"upsaId": "L"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let backend = create_test_backend();

        let mut tx = backend.begin().await.unwrap();
        let stored = tx.save("unit", None, json!({"upsaId": "U"})).await.unwrap();
        assert!(tx.delete("unit", stored.id()).await.unwrap());
        assert!(!tx.delete("unit", stored.id()).await.unwrap());
        Box::new(tx).commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let backend = create_test_backend();

        let mut tx = backend.begin().await.unwrap();
        let a = tx.save("unit", None, json!({"upsaId": "A"})).await.unwrap();
        tx.delete("unit", a.id()).await.unwrap();
        let b = tx.save("location", None, json!({"upsaId": "B"})).await.unwrap();
        Box::new(tx).commit().await.unwrap();

        assert!(b.id() > a.id());
    }

    #[tokio::test]
    async fn test_rejects_non_object_content() {
        let backend = create_test_backend();

        let mut tx = backend.begin().await.unwrap();
        assert!(tx.save("unit", None, json!([1, 2])).await.is_err());
    }
}
