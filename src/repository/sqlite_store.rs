// ==========================================
// 经销商车场运营系统 - SQLite 文档存储
// ==========================================
// 存储: documents 表 (叶子路径 → JSON 文本)
// 批次写入: 单个事务（原子）
// 约束: 所有查询使用参数化
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::repository::document_store::{
    DocumentStore, SnapshotCallback, StoreSnapshot, WriteBatch, WriteOp,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::subscription::{Subscription, SubscriptionHub};
use crate::repository::tree::{self, normalize_path};
use async_trait::async_trait;
use rusqlite::{params, Connection, Transaction};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SqliteDocumentStore
// ==========================================
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
    hub: SubscriptionHub,
}

impl SqliteDocumentStore {
    /// 打开数据库文件并建表
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            hub: SubscriptionHub::new(),
        })
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA 并建表，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self {
            conn,
            hub: SubscriptionHub::new(),
        })
    }

    /// 共享连接（供配置层复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn read_subtree(&self, path: &str) -> RepositoryResult<Option<Value>> {
        let conn = self.get_conn()?;
        let prefix = format!("{}/", path);
        let mut stmt = conn.prepare(
            r#"
            SELECT path, value FROM documents
            WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2
            ORDER BY path
            "#,
        )?;
        let rows = stmt.query_map(params![path, prefix], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (leaf_path, raw) = row?;
            let value: Value = serde_json::from_str(&raw)?;
            entries.push((leaf_path, value));
        }
        Ok(tree::assemble(path, entries))
    }

    fn remove_in_tx(tx: &Transaction<'_>, path: &str) -> RepositoryResult<()> {
        let prefix = format!("{}/", path);
        tx.execute(
            "DELETE FROM documents WHERE path = ?1 OR substr(path, 1, length(?2)) = ?2",
            params![path, prefix],
        )?;
        Ok(())
    }

    fn set_in_tx(tx: &Transaction<'_>, path: &str, value: &Value) -> RepositoryResult<()> {
        let leaves = tree::flatten(path, value)?;
        Self::remove_in_tx(tx, path)?;
        for ancestor in tree::ancestors(path) {
            tx.execute("DELETE FROM documents WHERE path = ?1", params![ancestor])?;
        }
        for (leaf_path, leaf_value) in leaves {
            tx.execute(
                r#"
                INSERT INTO documents (path, value, updated_at)
                VALUES (?1, ?2, datetime('now'))
                "#,
                params![leaf_path, serde_json::to_string(&leaf_value)?],
            )?;
        }
        Ok(())
    }

    fn apply_ops(&self, ops: &[WriteOp]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        for op in ops {
            match op {
                WriteOp::Set { path, value } => Self::set_in_tx(&tx, path, value)?,
                WriteOp::Remove { path } => Self::remove_in_tx(&tx, path)?,
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    fn notify(&self, written: &[String]) {
        for delivery in self.hub.affected_by(written) {
            let value = match self.read_subtree(&delivery.path) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(path = %delivery.path, "订阅快照读取失败: {}", e);
                    continue;
                }
            };
            if self.hub.is_active(delivery.id) {
                (delivery.callback)(StoreSnapshot {
                    path: delivery.path.clone(),
                    value,
                });
            }
        }
    }

    /// 列出某路径下的直接子键（如全部经销商）
    pub fn child_keys(&self, path: &str) -> RepositoryResult<Vec<String>> {
        let path = normalize_path(path)?;
        let prefix = format!("{}/", path);
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT path FROM documents
            WHERE substr(path, 1, length(?1)) = ?1
            ORDER BY path
            "#,
        )?;
        let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;

        let mut keys: Vec<String> = Vec::new();
        for row in rows {
            let leaf = row?;
            if let Some(child) = leaf[prefix.len()..].split('/').next() {
                if keys.last().map(String::as_str) != Some(child) {
                    keys.push(child.to_string());
                }
            }
        }
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, path: &str) -> RepositoryResult<Option<Value>> {
        let path = normalize_path(path)?;
        self.read_subtree(&path)
    }

    async fn set(&self, path: &str, value: Value) -> RepositoryResult<()> {
        let path = normalize_path(path)?;
        self.apply_ops(&[WriteOp::Set {
            path: path.clone(),
            value,
        }])?;
        self.notify(&[path]);
        Ok(())
    }

    async fn remove(&self, path: &str) -> RepositoryResult<()> {
        let path = normalize_path(path)?;
        self.apply_ops(&[WriteOp::Remove { path: path.clone() }])?;
        self.notify(&[path]);
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<()> {
        let mut ops = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            let path = normalize_path(op.path())?;
            ops.push(match op {
                WriteOp::Set { value, .. } => WriteOp::Set { path, value },
                WriteOp::Remove { .. } => WriteOp::Remove { path },
            });
        }
        self.apply_ops(&ops)?;
        let written: Vec<String> = ops.iter().map(|op| op.path().to_string()).collect();
        self.notify(&written);
        Ok(())
    }

    fn subscribe(&self, path: &str, callback: SnapshotCallback) -> RepositoryResult<Subscription> {
        let path = normalize_path(path)?;
        let subscription = self.hub.register(&path, Arc::clone(&callback))?;
        match self.read_subtree(&path) {
            Ok(value) => callback(StoreSnapshot { path, value }),
            Err(e) => tracing::warn!(path = %path, "初始快照读取失败，视为无数据: {}", e),
        }
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup_store() -> SqliteDocumentStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteDocumentStore::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_roundtrip_nested_document() {
        let store = setup_store();
        store
            .set(
                "stockRectification/st-james/1TPQ205",
                json!({"reason": "Sold", "note": "sold at show"}),
            )
            .await
            .unwrap();

        let report = store
            .get("stockRectification/st-james/1TPQ205")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report["reason"], json!("Sold"));
        assert_eq!(report["note"], json!("sold at show"));
    }

    #[tokio::test]
    async fn test_field_write_keeps_siblings() {
        let store = setup_store();
        store
            .set("stockRectification/d/C1", json!({"reason": "Sold", "note": "a"}))
            .await
            .unwrap();
        store
            .set("stockRectification/d/C1/note", json!("b"))
            .await
            .unwrap();

        let report = store.get("stockRectification/d/C1").await.unwrap().unwrap();
        assert_eq!(report, json!({"reason": "Sold", "note": "b"}));
    }

    #[tokio::test]
    async fn test_child_keys() {
        let store = setup_store();
        store.set("yardstock/alpha/C1", json!({"model": "A"})).await.unwrap();
        store.set("yardstock/alpha/C2", json!({"model": "B"})).await.unwrap();
        store.set("yardstock/beta/C3", json!({"model": "C"})).await.unwrap();

        assert_eq!(store.child_keys("yardstock").unwrap(), vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_batch_commit() {
        let store = setup_store();
        store.set("pgirecord/C1", json!({"model": "A"})).await.unwrap();
        let batch = WriteBatch::new()
            .set("yardstock/d/C1", json!({"model": "A"}))
            .remove("pgirecord/C1");
        store.commit(batch).await.unwrap();

        assert!(store.get("pgirecord/C1").await.unwrap().is_none());
        assert!(store.get("yardstock/d/C1").await.unwrap().is_some());
    }
}
