// ==========================================
// 经销商车场运营系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 文档存储接口与实现、生命周期实体映射
// ==========================================

pub mod document_store;
pub mod error;
pub mod lifecycle_store;
pub mod memory_store;
pub mod paths;
pub mod record_decoder;
pub mod sqlite_store;
pub mod subscription;
pub mod tree;

// 重导出核心仓储
pub use document_store::{DocumentStore, SnapshotCallback, StoreSnapshot, WriteBatch, WriteOp};
pub use error::{RepositoryError, RepositoryResult};
pub use lifecycle_store::{encode_yard_unit, LifecycleStore};
pub use memory_store::MemoryDocumentStore;
pub use record_decoder::RecordDecoder;
pub use sqlite_store::SqliteDocumentStore;
pub use subscription::{Subscription, SubscriptionHub};
