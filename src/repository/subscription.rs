// ==========================================
// 经销商车场运营系统 - 订阅注册表
// ==========================================
// 职责: 管理子树订阅；写入后找出受影响的订阅者
// 红线: 注销（或丢弃）后的订阅不再收到任何快照
// ==========================================

use crate::repository::document_store::SnapshotCallback;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::tree::overlaps;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: HashMap<u64, (String, SnapshotCallback)>,
}

/// 订阅注册表（存储实现内部共享）
#[derive(Clone, Default)]
pub struct SubscriptionHub {
    inner: Arc<Mutex<HubInner>>,
}

/// 待推送的订阅者
pub struct PendingDelivery {
    pub id: u64,
    pub path: String,
    pub callback: SnapshotCallback,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册订阅
    pub fn register(&self, path: &str, callback: SnapshotCallback) -> RepositoryResult<Subscription> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.insert(id, (path.to_string(), callback));
        tracing::debug!(subscription_id = id, path = %path, "注册订阅");

        Ok(Subscription {
            id,
            path: path.to_string(),
            hub: Arc::downgrade(&self.inner),
        })
    }

    /// 找出被写入路径影响的订阅者（每个订阅者只出现一次）
    pub fn affected_by(&self, written_paths: &[String]) -> Vec<PendingDelivery> {
        let inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(e) => {
                tracing::warn!("订阅注册表锁获取失败，跳过推送: {}", e);
                return Vec::new();
            }
        };

        let mut deliveries: Vec<PendingDelivery> = inner
            .listeners
            .iter()
            .filter(|(_, (path, _))| written_paths.iter().any(|w| overlaps(w, path)))
            .map(|(id, (path, callback))| PendingDelivery {
                id: *id,
                path: path.clone(),
                callback: Arc::clone(callback),
            })
            .collect();
        deliveries.sort_by_key(|d| d.id);
        deliveries
    }

    /// 订阅是否仍然有效
    pub fn is_active(&self, id: u64) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.listeners.contains_key(&id))
            .unwrap_or(false)
    }

    /// 当前订阅数量
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.listeners.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// Subscription - 订阅句柄
// ==========================================
/// 单个订阅；`unsubscribe()` 或丢弃时注销
pub struct Subscription {
    id: u64,
    path: String,
    hub: Weak<Mutex<HubInner>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 显式注销
    pub fn unsubscribe(self) {
        // Drop 负责真正的注销
    }

    fn detach(&self) {
        if let Some(hub) = self.hub.upgrade() {
            if let Ok(mut inner) = hub.lock() {
                if inner.listeners.remove(&self.id).is_some() {
                    tracing::debug!(subscription_id = self.id, path = %self.path, "注销订阅");
                }
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}
