// ==========================================
// 经销商车场运营系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::YardApi;
use crate::config::config_manager::ConfigManager;
use crate::config::yard_config_trait::YardConfigReader;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::lifecycle::ChassisLifecycleEngine;
use crate::repository::document_store::DocumentStore;
use crate::repository::lifecycle_store::LifecycleStore;
use crate::repository::sqlite_store::SqliteDocumentStore;

/// 应用状态
///
/// 包含API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 车场API
    pub yard_api: Arc<YardApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 生命周期引擎
    pub engine: Arc<ChassisLifecycleEngine>,
}

impl AppState {
    /// 创建新的AppState实例（系统时钟）
    pub async fn new(db_path: String) -> Result<Self, String> {
        Self::with_clock(db_path, Arc::new(SystemClock)).await
    }

    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享数据库连接并幂等建表
    /// 2. 初始化文档存储与配置管理器
    /// 3. 读取生命周期策略快照并创建引擎
    /// 4. 创建API实例
    pub async fn with_clock(db_path: String, clock: Arc<dyn Clock>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let document_store: Arc<dyn DocumentStore> = Arc::new(
            SqliteDocumentStore::from_connection(conn.clone())
                .map_err(|e| format!("无法创建SqliteDocumentStore: {}", e))?,
        );
        let lifecycle_store = LifecycleStore::new(document_store);

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let policy = config_manager
            .get_lifecycle_policy()
            .await
            .map_err(|e| format!("读取生命周期策略失败: {}", e))?;
        tracing::info!(
            require_reason = policy.require_reason_on_manual_add,
            manual_add_state = %policy.manual_add_state,
            re_receive_policy = %policy.re_receive_policy,
            "生命周期策略已加载"
        );
        let engine = Arc::new(ChassisLifecycleEngine::new(lifecycle_store, policy, clock));

        // ==========================================
        // 初始化API层
        // ==========================================
        let yard_api = Arc::new(YardApi::new(
            engine.clone(),
            config_manager.clone() as Arc<dyn YardConfigReader>,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            yard_api,
            config_manager,
            engine,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 DEALER_YARD_OPS_DB_PATH（非空时）
/// - 开发环境: 用户数据目录/dealer-yard-ops-dev/dealer_yard_ops.db
/// - 生产环境: 用户数据目录/dealer-yard-ops/dealer_yard_ops.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("DEALER_YARD_OPS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./dealer_yard_ops.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("dealer-yard-ops-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("dealer-yard-ops");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("dealer_yard_ops.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }
}
