// ==========================================
// 经销商车场运营系统 - 领域类型定义
// ==========================================
// 职责: 车架状态、类型分类、对账原因等枚举
// 红线: 来源标签仅用于展示/审计，不参与行为分支（默认值除外）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 车架状态 (Unit State)
// ==========================================
// 在途 → 待审批/在场 → 已交付(终态)
// 序列化格式: SCREAMING_SNAKE_CASE (与存储一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitState {
    InTransit,   // 在途 (PGI 之后)
    YardPending, // 手工添加，待审批
    YardStock,   // 已入场
    Dispatched,  // 已交付 (终态)
}

impl UnitState {
    /// 转换为存储字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::InTransit => "IN_TRANSIT",
            UnitState::YardPending => "YARD_PENDING",
            UnitState::YardStock => "YARD_STOCK",
            UnitState::Dispatched => "DISPATCHED",
        }
    }

    /// 从存储字符串解析（兼容历史写法）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "IN_TRANSIT" | "INTRANSIT" => Some(UnitState::InTransit),
            "YARD_PENDING" | "YARDPENDING" | "PENDING" => Some(UnitState::YardPending),
            "YARD_STOCK" | "YARDSTOCK" | "YARD_CUSTOMER" | "STOCK" => Some(UnitState::YardStock),
            "DISPATCHED" | "HANDED_OVER" => Some(UnitState::Dispatched),
            _ => None,
        }
    }

    /// 是否驻场（待审批或已入场）
    pub fn is_yard_resident(&self) -> bool {
        matches!(self, UnitState::YardPending | UnitState::YardStock)
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 车架类型 (Unit Type)
// ==========================================
// 读时派生: customer 为空或以 "stock" 结尾 → Stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    Stock,
    Customer,
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitType::Stock => write!(f, "Stock"),
            UnitType::Customer => write!(f, "Customer"),
        }
    }
}

// ==========================================
// 来源标签 (Provenance Tags)
// ==========================================
pub mod source_tags {
    /// 工厂 PGI 在途数据入场
    pub const PGI: &str = "PGI";
    /// 经销商手工添加
    pub const MANUAL: &str = "manual";
    /// 手工添加，待审批
    pub const PENDING_APPROVAL: &str = "pending-approval";
}

// ==========================================
// 对账原因 (Reconciliation Reason)
// ==========================================
// 固定枚举; Other 必须附带 customReason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconciliationReason {
    Sold,
    NeverReceived,
    Reallocated,
    Show,
    DispatchPoint,
    Other,
}

impl ReconciliationReason {
    /// 全部原因（界面下拉顺序）
    pub const ALL: [ReconciliationReason; 6] = [
        ReconciliationReason::Sold,
        ReconciliationReason::NeverReceived,
        ReconciliationReason::Reallocated,
        ReconciliationReason::Show,
        ReconciliationReason::DispatchPoint,
        ReconciliationReason::Other,
    ];

    /// 存储/展示标签
    pub fn label(&self) -> &'static str {
        match self {
            ReconciliationReason::Sold => "Sold",
            ReconciliationReason::NeverReceived => "Never received",
            ReconciliationReason::Reallocated => "Previously received but was reallocated",
            ReconciliationReason::Show => "Show",
            ReconciliationReason::DispatchPoint => "Dispatch point",
            ReconciliationReason::Other => "Other",
        }
    }

    /// 按标签解析（忽略大小写与首尾空白）
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.label().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for ReconciliationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 对账报告来源 (Report Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportSource {
    AddToYard,         // 手工入场时附带原因
    ReportInvalidStock, // 上报无效库存
}

impl ReportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSource::AddToYard => "add-to-yard",
            ReportSource::ReportInvalidStock => "report-invalid-stock",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "add-to-yard" => Some(ReportSource::AddToYard),
            "report-invalid-stock" => Some(ReportSource::ReportInvalidStock),
            _ => None,
        }
    }
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
