// ==========================================
// 经销商车场运营系统 - 引擎层
// ==========================================
// 职责: 车架生命周期状态机、对账报告、分层配额、只读聚合
// 红线: Engine 不直接访问存储路径以外的持久化细节，所有失败必须带原因
// ==========================================

pub mod aggregation;
pub mod classification;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod reconciliation;
pub mod tier_allocation;

// 重导出核心引擎
pub use aggregation::{
    classify_units, days_in_yard_buckets, kpi_counts, model_range_counts, tier_mix, DayBucket,
    DayBucketSummary, TierMix, YardKpi, YardSnapshot,
};
pub use classification::{model_range, unit_type, ClassifiedUnit};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LifecycleError, LifecycleResult};
pub use lifecycle::{
    AuditReport, ChassisLifecycleEngine, DispatchRequest, ManualAddOutcome, ManualAddRequest,
    ReceiveOutcome, ReceiveRequest, SweepReport,
};
pub use reconciliation::{ReconciliationReporter, ValidatedReason};
pub use tier_allocation::TierAllocationCalculator;
