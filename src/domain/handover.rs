// ==========================================
// 经销商车场运营系统 - 交付记录领域模型
// ==========================================
// 红线: 交付记录每次交付只创建一次，之后不可修改、不可删除
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// HandoverRecord - 交付审计记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverRecord {
    pub chassis: String,
    pub dealer_slug: String,
    pub dealer_name: String,
    pub model: String,
    pub customer: String,
    pub handover_at: DateTime<Utc>,
    pub source: String,
}

// ==========================================
// DispatchIntent - 交付意图日志
// ==========================================
// 用途: 交付 = 删除驻场记录 + 写交付记录，两步非原子
// 流程: 写意图 → 删驻场 → 写交付 → 清意图; 启动时清扫残留意图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchIntent {
    pub intent_id: String,
    pub created_at: DateTime<Utc>,
    pub handover: HandoverRecord,
}
