// ==========================================
// 经销商车场运营系统 - 车场配置读取 Trait
// ==========================================
// 职责: 定义引擎/视图所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::lifecycle_policy::LifecyclePolicy;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// YardConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait YardConfigReader: Send + Sync {
    // ===== 生命周期策略 =====

    /// 获取生命周期策略快照
    ///
    /// # 默认值
    /// - 手工入场必须附带原因
    /// - 手工入场初始状态 YARD_STOCK
    /// - 重复入场 OVERWRITE
    async fn get_lifecycle_policy(&self) -> Result<LifecyclePolicy, Box<dyn Error + Send + Sync>>;

    // ===== 视图配置 =====

    /// 获取驻场天数分桶上界（升序、去重）
    ///
    /// # 默认值
    /// - [30, 60, 90, 180]
    async fn get_day_buckets(&self) -> Result<Vec<i64>, Box<dyn Error + Send + Sync>>;

    // ===== 车场容量 =====

    /// 获取经销商车场基线容量 (minVolume)
    ///
    /// # 参数
    /// - dealer: 经销商 slug
    ///
    /// # 返回
    /// - 按经销商配置值 → 全局默认值 → 0
    async fn get_min_volume(&self, dealer: &str) -> Result<u32, Box<dyn Error + Send + Sync>>;
}
