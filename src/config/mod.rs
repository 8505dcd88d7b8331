// ==========================================
// 经销商车场运营系统 - 配置层
// ==========================================
// 职责: 系统配置管理（生命周期策略 / 视图分桶 / 车场容量）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod lifecycle_policy;
pub mod yard_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_DAY_BUCKETS};
pub use lifecycle_policy::{LifecyclePolicy, ReReceivePolicy};
pub use yard_config_trait::YardConfigReader;
