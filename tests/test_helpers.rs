// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、固定时钟、引擎装配等功能
// ==========================================

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use dealer_yard_ops::app::AppState;
use dealer_yard_ops::config::LifecyclePolicy;
use dealer_yard_ops::domain::InTransitUnit;
use dealer_yard_ops::engine::{ChassisLifecycleEngine, FixedClock, ReceiveRequest};
use dealer_yard_ops::repository::{LifecycleStore, MemoryDocumentStore};
use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 测试基准时间
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap()
}

/// 创建临时测试数据库路径
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();
    Ok((temp_file, db_path))
}

/// 内存存储 + 固定时钟的引擎
pub fn memory_engine(
    policy: LifecyclePolicy,
) -> (MemoryDocumentStore, Arc<FixedClock>, ChassisLifecycleEngine) {
    let memory = MemoryDocumentStore::new();
    let clock = Arc::new(FixedClock::new(base_time()));
    let engine = ChassisLifecycleEngine::new(
        LifecycleStore::new(Arc::new(memory.clone())),
        policy,
        clock.clone(),
    );
    (memory, clock, engine)
}

/// 基于临时 SQLite 文件的 AppState（固定时钟）
pub async fn create_test_state() -> (NamedTempFile, Arc<FixedClock>, AppState) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let clock = Arc::new(FixedClock::new(base_time()));
    let state = AppState::with_clock(db_path, clock.clone())
        .await
        .expect("Failed to create AppState");
    (temp_file, clock, state)
}

/// 入场请求
pub fn receive_request(chassis: &str, dealer: &str, model: &str, customer: &str) -> ReceiveRequest {
    ReceiveRequest {
        chassis: chassis.to_string(),
        dealer: dealer.to_string(),
        model: model.to_string(),
        customer: customer.to_string(),
        source_date: None,
    }
}

/// 在途车架
pub fn in_transit(chassis: &str, dealer: &str, model: &str) -> InTransitUnit {
    InTransitUnit {
        chassis: chassis.to_string(),
        model: model.to_string(),
        customer: String::new(),
        dealer: dealer.to_string(),
        forecast_date: None,
    }
}
