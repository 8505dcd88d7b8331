// ==========================================
// 经销商车场运营系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::lifecycle_policy::{LifecyclePolicy, ReReceivePolicy};
use crate::config::yard_config_trait::YardConfigReader;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::types::UnitState;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// 驻场天数默认分桶上界
pub const DEFAULT_DAY_BUCKETS: [i64; 4] = [30, 60, 90, 180];

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            ensure_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = %key, "配置已更新");
        Ok(())
    }

    /// 删除 global scope 配置（恢复默认值）
    pub fn remove_config_value(&self, key: &str) -> ConfigResult<bool> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }

    /// 写入单个经销商的车场基线容量
    pub fn set_min_volume(&self, dealer: &str, volume: u32) -> ConfigResult<()> {
        self.set_config_value(&config_keys::dealer_min_volume(dealer), &volume.to_string())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 审计日志里记录当时生效的配置
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// YardConfigReader Trait 实现
// ==========================================
#[async_trait]
impl YardConfigReader for ConfigManager {
    async fn get_lifecycle_policy(&self) -> ConfigResult<LifecyclePolicy> {
        let defaults = LifecyclePolicy::default();

        let require_reason = self.get_config_or_default(
            config_keys::MANUAL_ADD_REQUIRES_REASON,
            if defaults.require_reason_on_manual_add { "true" } else { "false" },
        )?;
        let require_reason_on_manual_add = match require_reason.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                tracing::warn!(
                    config_key = config_keys::MANUAL_ADD_REQUIRES_REASON,
                    raw_value = %require_reason,
                    "配置格式错误，使用默认值"
                );
                defaults.require_reason_on_manual_add
            }
        };

        let state_raw = self.get_config_or_default(
            config_keys::MANUAL_ADD_INITIAL_STATE,
            defaults.manual_add_state.as_str(),
        )?;
        let manual_add_state = match UnitState::parse(&state_raw) {
            Some(state) if LifecyclePolicy::is_valid_manual_state(state) => state,
            _ => {
                tracing::warn!(
                    config_key = config_keys::MANUAL_ADD_INITIAL_STATE,
                    raw_value = %state_raw,
                    "手工入场初始状态无效，使用默认值"
                );
                defaults.manual_add_state
            }
        };

        let policy_raw = self.get_config_or_default(
            config_keys::RE_RECEIVE_POLICY,
            defaults.re_receive_policy.as_str(),
        )?;
        let re_receive_policy = ReReceivePolicy::parse(&policy_raw).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::RE_RECEIVE_POLICY,
                raw_value = %policy_raw,
                "重复入场策略无效，使用默认值"
            );
            defaults.re_receive_policy
        });

        Ok(LifecyclePolicy {
            require_reason_on_manual_add,
            manual_add_state,
            re_receive_policy,
        })
    }

    async fn get_day_buckets(&self) -> ConfigResult<Vec<i64>> {
        let value = self.get_config_or_default(config_keys::DAYS_IN_YARD_BUCKETS, "[30,60,90,180]")?;

        let mut buckets: Vec<i64> = serde_json::from_str::<Vec<i64>>(&value)
            .unwrap_or_else(|_| {
                tracing::warn!(
                    config_key = config_keys::DAYS_IN_YARD_BUCKETS,
                    raw_value = %value,
                    "驻场天数分桶配置格式错误，使用默认值"
                );
                DEFAULT_DAY_BUCKETS.to_vec()
            })
            .into_iter()
            .filter(|&b| b > 0)
            .collect();
        buckets.sort_unstable();
        buckets.dedup();

        if buckets.is_empty() {
            Ok(DEFAULT_DAY_BUCKETS.to_vec())
        } else {
            Ok(buckets)
        }
    }

    async fn get_min_volume(&self, dealer: &str) -> ConfigResult<u32> {
        if let Some(value) = self.get_config_value(&config_keys::dealer_min_volume(dealer))? {
            match value.trim().parse::<u32>() {
                Ok(volume) => return Ok(volume),
                Err(_) => tracing::warn!(
                    dealer = %dealer,
                    raw_value = %value,
                    "经销商车场容量配置格式错误，回退到全局默认值"
                ),
            }
        }

        let value = self.get_config_or_default(config_keys::DEFAULT_MIN_VOLUME, "0")?;
        Ok(value.trim().parse::<u32>().unwrap_or(0))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 生命周期
    pub const MANUAL_ADD_REQUIRES_REASON: &str = "manual_add_requires_reason";
    pub const MANUAL_ADD_INITIAL_STATE: &str = "manual_add_initial_state";
    pub const RE_RECEIVE_POLICY: &str = "re_receive_policy";

    // 视图
    pub const DAYS_IN_YARD_BUCKETS: &str = "days_in_yard_buckets"; // JSON 数组

    // 车场容量
    pub const DEFAULT_MIN_VOLUME: &str = "default_min_volume";
    pub const MIN_VOLUME_PREFIX: &str = "yard_min_volume/";

    /// 单个经销商的车场容量键
    pub fn dealer_min_volume(dealer: &str) -> String {
        format!("{}{}", MIN_VOLUME_PREFIX, dealer)
    }
}
