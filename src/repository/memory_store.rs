// ==========================================
// 经销商车场运营系统 - 内存文档存储
// ==========================================
// 用途: 测试与本地演示；支持按路径前缀注入读/写故障
// 批次写入: 持锁内整体生效（原子）
// ==========================================

use crate::repository::document_store::{
    DocumentStore, SnapshotCallback, StoreSnapshot, WriteBatch, WriteOp,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::subscription::{Subscription, SubscriptionHub};
use crate::repository::tree::{self, is_within, normalize_path};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct FaultPlan {
    fail_writes_under: Vec<String>,
    fail_reads_under: Vec<String>,
}

// ==========================================
// MemoryDocumentStore
// ==========================================
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    leaves: Arc<Mutex<BTreeMap<String, Value>>>,
    faults: Arc<Mutex<FaultPlan>>,
    hub: SubscriptionHub,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_leaves(&self) -> RepositoryResult<MutexGuard<'_, BTreeMap<String, Value>>> {
        self.leaves
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 故障注入 =====

    /// 之后所有落在 prefix 之下的写入都被拒绝
    pub fn fail_writes_under(&self, prefix: &str) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.fail_writes_under.push(prefix.trim_matches('/').to_string());
        }
    }

    /// 之后所有落在 prefix 之下的读取都失败
    pub fn fail_reads_under(&self, prefix: &str) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.fail_reads_under.push(prefix.trim_matches('/').to_string());
        }
    }

    /// 清除全部故障
    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.fail_writes_under.clear();
            faults.fail_reads_under.clear();
        }
    }

    fn check_write(&self, path: &str) -> RepositoryResult<()> {
        let faults = self
            .faults
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        if faults.fail_writes_under.iter().any(|p| is_within(path, p)) {
            return Err(RepositoryError::WriteRejected {
                path: path.to_string(),
                message: "注入的写入故障".to_string(),
            });
        }
        Ok(())
    }

    fn check_read(&self, path: &str) -> RepositoryResult<()> {
        let faults = self
            .faults
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        if faults
            .fail_reads_under
            .iter()
            .any(|p| tree::overlaps(path, p))
        {
            return Err(RepositoryError::ReadRejected {
                path: path.to_string(),
                message: "注入的读取故障".to_string(),
            });
        }
        Ok(())
    }

    /// 当前叶子数量（测试用）
    pub fn leaf_count(&self) -> usize {
        self.leaves.lock().map(|l| l.len()).unwrap_or(0)
    }

    fn read_subtree(&self, path: &str) -> RepositoryResult<Option<Value>> {
        let leaves = self.get_leaves()?;
        let prefix = format!("{}/", path);
        let mut entries: Vec<(String, Value)> = Vec::new();
        if let Some(v) = leaves.get(path) {
            entries.push((path.to_string(), v.clone()));
        }
        entries.extend(
            leaves
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(tree::assemble(path, entries))
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
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &str) -> RepositoryResult<Option<Value>> {
        let path = normalize_path(path)?;
        self.check_read(&path)?;
        self.read_subtree(&path)
    }

    async fn set(&self, path: &str, value: Value) -> RepositoryResult<()> {
        let path = normalize_path(path)?;
        self.check_write(&path)?;
        {
            let mut leaves = self.get_leaves()?;
            tree::apply_set(&mut leaves, &path, &value)?;
        }
        self.notify(&[path]);
        Ok(())
    }

    async fn remove(&self, path: &str) -> RepositoryResult<()> {
        let path = normalize_path(path)?;
        self.check_write(&path)?;
        {
            let mut leaves = self.get_leaves()?;
            tree::apply_remove(&mut leaves, &path);
        }
        self.notify(&[path]);
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<()> {
        let mut ops = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            let path = normalize_path(op.path())?;
            self.check_write(&path)?;
            ops.push(match op {
                WriteOp::Set { value, .. } => WriteOp::Set { path, value },
                WriteOp::Remove { .. } => WriteOp::Remove { path },
            });
        }

        let written: Vec<String> = ops.iter().map(|op| op.path().to_string()).collect();
        {
            let mut leaves = self.get_leaves()?;
            // 在副本上执行，全部成功后整体替换
            let mut staged = leaves.clone();
            for op in &ops {
                match op {
                    WriteOp::Set { path, value } => tree::apply_set(&mut staged, path, value)?,
                    WriteOp::Remove { path } => tree::apply_remove(&mut staged, path),
                }
            }
            *leaves = staged;
        }
        self.notify(&written);
        Ok(())
    }

    fn subscribe(&self, path: &str, callback: SnapshotCallback) -> RepositoryResult<Subscription> {
        let path = normalize_path(path)?;
        let subscription = self.hub.register(&path, Arc::clone(&callback))?;
        match self.check_read(&path).and_then(|_| self.read_subtree(&path)) {
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
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryDocumentStore::new();
        store
            .set("yardstock/st-james/1TPQ205", json!({"model": "SRP19"}))
            .await
            .unwrap();

        let unit = store.get("yardstock/st-james/1TPQ205").await.unwrap();
        assert_eq!(unit, Some(json!({"model": "SRP19"})));

        let yard = store.get("yardstock/st-james").await.unwrap().unwrap();
        assert_eq!(yard["1TPQ205"]["model"], json!("SRP19"));

        store.remove("yardstock/st-james/1TPQ205").await.unwrap();
        assert_eq!(store.get("yardstock/st-james").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let store = MemoryDocumentStore::new();
        store.fail_writes_under("handover");

        let batch = WriteBatch::new()
            .set("yardstock/d/C1", json!({"model": "X"}))
            .set("handover/d/C1", json!({"model": "X"}));
        assert!(store.commit(batch).await.is_err());
        assert_eq!(store.leaf_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_stops_after_unsubscribe() {
        let store = MemoryDocumentStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let sub = store
            .subscribe(
                "yardstock/d",
                Arc::new(move |_snapshot| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        // 初始快照
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        store.set("yardstock/d/C1", json!({"model": "X"})).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // 无关路径不推送
        store.set("handover/d/C1", json!({"model": "X"})).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        sub.unsubscribe();
        store.remove("yardstock/d/C1").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let store = MemoryDocumentStore::new();
        store.fail_reads_under("pgirecord");
        let err = store.get("pgirecord/C1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::ReadRejected { .. }));
    }
}
