// ==========================================
// 经销商车场运营系统 - 在途数据源
// ==========================================
// 职责: 只读的在途车架数据（pgirecord / 排产 CSV）
// ==========================================

pub mod csv_feed;
pub mod error;
pub mod schedule_feed;

pub use csv_feed::CsvScheduleFeed;
pub use error::{FeedError, FeedResult};
pub use schedule_feed::{ScheduleFeed, StoreScheduleFeed};
