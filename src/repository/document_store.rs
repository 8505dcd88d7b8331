// ==========================================
// 经销商车场运营系统 - 文档存储接口
// ==========================================
// 职责: 定义外部实时文档存储的窄接口（get/set/remove/subscribe）
// 说明: 仓储层定义 trait，具体传输由实现者提供
// 红线: 写入在存储确认后才返回；订阅只保证最终一致
// ==========================================

use crate::repository::error::RepositoryResult;
use crate::repository::subscription::Subscription;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

// ==========================================
// 快照与回调
// ==========================================

/// 订阅推送的子树快照
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub path: String,
    /// None 表示该路径下无数据
    pub value: Option<Value>,
}

/// 快照回调
pub type SnapshotCallback = Arc<dyn Fn(StoreSnapshot) + Send + Sync>;

// ==========================================
// 写操作批次
// ==========================================

/// 单个写操作
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { path: String, value: Value },
    Remove { path: String },
}

impl WriteOp {
    pub fn path(&self) -> &str {
        match self {
            WriteOp::Set { path, .. } => path,
            WriteOp::Remove { path } => path,
        }
    }
}

/// 多路径写入批次
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: Value) -> Self {
        self.ops.push(WriteOp::Set {
            path: path.into(),
            value,
        });
        self
    }

    pub fn remove(mut self, path: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Remove { path: path.into() });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

// ==========================================
// DocumentStore Trait
// ==========================================
// 实现者: MemoryDocumentStore / SqliteDocumentStore
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 读取路径处的值（内部节点返回重组后的子树）
    async fn get(&self, path: &str) -> RepositoryResult<Option<Value>>;

    /// 写入（替换整个子树）
    async fn set(&self, path: &str, value: Value) -> RepositoryResult<()>;

    /// 删除路径及其全部后代
    async fn remove(&self, path: &str) -> RepositoryResult<()>;

    /// 多路径写入
    ///
    /// 默认实现逐条执行，不保证原子性；支持事务的实现应覆盖
    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<()> {
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { path, value } => self.set(&path, value).await?,
                WriteOp::Remove { path } => self.remove(&path).await?,
            }
        }
        Ok(())
    }

    /// 订阅子树
    ///
    /// 订阅时立即推送一次当前快照；之后每次影响该子树的写入推送一次。
    /// 返回的 Subscription 被注销或丢弃后不再推送。
    fn subscribe(&self, path: &str, callback: SnapshotCallback) -> RepositoryResult<Subscription>;
}
