// ==========================================
// 经销商车场运营系统 - 在途数据源 (Schedule Feed)
// ==========================================
// 职责: 只读的在途车架流，按车架号查询
// 红线: 生命周期引擎只消费 chassis + model + customer + dealer
// ==========================================

use crate::domain::chassis::InTransitUnit;
use crate::feed::error::FeedResult;
use crate::identifier::normalize_chassis;
use crate::repository::lifecycle_store::LifecycleStore;
use async_trait::async_trait;

// ==========================================
// ScheduleFeed Trait
// ==========================================
// 实现者: StoreScheduleFeed（pgirecord）/ CsvScheduleFeed（排产导出文件）
#[async_trait]
pub trait ScheduleFeed: Send + Sync {
    /// 按车架号查询在途车架（车架号已规范化）
    async fn lookup(&self, chassis: &str) -> FeedResult<Option<InTransitUnit>>;

    /// 全部在途车架（按车架号排序）
    async fn list(&self) -> FeedResult<Vec<InTransitUnit>>;
}

// ==========================================
// StoreScheduleFeed - 基于 pgirecord 的数据源
// ==========================================
pub struct StoreScheduleFeed {
    store: LifecycleStore,
}

impl StoreScheduleFeed {
    pub fn new(store: LifecycleStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ScheduleFeed for StoreScheduleFeed {
    async fn lookup(&self, chassis: &str) -> FeedResult<Option<InTransitUnit>> {
        Ok(self.store.get_in_transit(&normalize_chassis(chassis)).await?)
    }

    async fn list(&self) -> FeedResult<Vec<InTransitUnit>> {
        Ok(self.store.list_in_transit().await?)
    }
}
