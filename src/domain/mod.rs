// ==========================================
// 经销商车场运营系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod chassis;
pub mod handover;
pub mod reconciliation;
pub mod tier;
pub mod types;

// 重导出核心类型
pub use chassis::{ChassisUnit, InTransitUnit};
pub use handover::{DispatchIntent, HandoverRecord};
pub use reconciliation::{ReasonInput, ReconciliationReport};
pub use tier::{
    TierAssessment, TierConfig, TierRequirement, TierTarget, TierWarning, DEFAULT_TIERS,
};
pub use types::{source_tags, ReconciliationReason, ReportSource, UnitState, UnitType};
