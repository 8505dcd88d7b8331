// ==========================================
// 经销商车场运营系统 - 对账报告领域模型
// ==========================================
// 红线: 每个车架最多一份对账报告
// 红线: 原因写入不清除备注，备注写入不清除原因（两类独立的部分写）
// ==========================================

use crate::domain::types::{ReconciliationReason, ReportSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ReconciliationReport - 对账报告(无效库存标记)
// ==========================================
// 与车架生命周期状态无关；只能手工删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub chassis: String,
    pub dealer_slug: String,

    // ===== 原因 =====
    // 仅保存过备注的报告没有原因
    pub reason: Option<ReconciliationReason>,
    pub custom_reason: Option<String>,

    // ===== 备注 =====
    pub note: Option<String>,

    // ===== 元信息 =====
    pub source: Option<ReportSource>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReconciliationReport {
    /// 展示用原因文本 (Other 显示自定义原因)
    pub fn display_reason(&self) -> Option<String> {
        match (self.reason, self.custom_reason.as_deref()) {
            (Some(ReconciliationReason::Other), Some(custom)) => Some(custom.to_string()),
            (Some(reason), _) => Some(reason.label().to_string()),
            (None, _) => None,
        }
    }
}

// ==========================================
// ReasonInput - 上报原因输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonInput {
    pub reason: ReconciliationReason,
    pub custom_reason: Option<String>,
}

impl ReasonInput {
    pub fn new(reason: ReconciliationReason) -> Self {
        Self {
            reason,
            custom_reason: None,
        }
    }

    pub fn other(custom_reason: impl Into<String>) -> Self {
        Self {
            reason: ReconciliationReason::Other,
            custom_reason: Some(custom_reason.into()),
        }
    }

    /// 规范化后的自定义原因 (仅 Other 保留，去除首尾空白，空串视为缺失)
    pub fn normalized_custom_reason(&self) -> Option<String> {
        if self.reason != ReconciliationReason::Other {
            return None;
        }
        self.custom_reason
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}
