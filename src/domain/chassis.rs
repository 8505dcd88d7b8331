// ==========================================
// 经销商车场运营系统 - 车架领域模型
// ==========================================
// 红线: 同一 (dealer_slug, chassis) 任一时刻最多一条驻场记录
// 红线: 时间戳只由对应的状态迁移写入
// ==========================================

use crate::domain::types::UnitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ChassisUnit - 车架(实物库存单元)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChassisUnit {
    // ===== 主键 =====
    pub chassis: String,     // 车架号 (大写规范化)
    pub dealer_slug: String, // 所属经销商 (slug)

    // ===== 业务信息 =====
    pub model: String,    // 车型 (自由文本)
    pub customer: String, // 客户 (空或以 stock 结尾 → 库存车)

    // ===== 状态 =====
    pub state: UnitState,
    pub source: String, // 来源标签: PGI / manual / pending-approval

    // ===== 时间戳 =====
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handover_at: Option<DateTime<Utc>>,

    /// 在途数据里的原始日期（PGI/预计到达），仅展示
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_date: Option<DateTime<Utc>>,
}

impl ChassisUnit {
    /// 驻场天数（未记录入场时间返回 None）
    pub fn days_in_yard(&self, now: DateTime<Utc>) -> Option<i64> {
        self.received_at
            .map(|received| (now - received).num_days().max(0))
    }
}

// ==========================================
// InTransitUnit - 在途车架 (排产/PGI 数据源)
// ==========================================
// 生命周期引擎只消费 chassis + model + customer + dealer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InTransitUnit {
    pub chassis: String,
    pub model: String,
    pub customer: String,
    pub dealer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_date: Option<DateTime<Utc>>,
}
