// ==========================================
// 经销商车场运营系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite (文档树存储)
// 系统定位: 车架生命周期与车场分层配额核心
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 标识符规范化
pub mod identifier;

// 数据仓储层 - 文档存储与实体映射
pub mod repository;

// 引擎层 - 生命周期 / 对账 / 分层配额 / 聚合
pub mod engine;

// 在途数据源
pub mod feed;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ReconciliationReason, ReportSource, UnitState, UnitType};

// 领域实体
pub use domain::{
    ChassisUnit, DispatchIntent, HandoverRecord, InTransitUnit, ReasonInput,
    ReconciliationReport, TierAssessment, TierConfig, TierRequirement, TierTarget, TierWarning,
};

// 引擎
pub use engine::{
    ChassisLifecycleEngine, LifecycleError, ReconciliationReporter, TierAllocationCalculator,
};

// 存储
pub use repository::{DocumentStore, LifecycleStore, MemoryDocumentStore, SqliteDocumentStore};

// API
pub use api::{ApiError, YardApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "经销商车场运营系统";
