// ==========================================
// 经销商车场运营系统 - API层
// ==========================================
// 职责: 面向展示层的业务接口，统一错误与失败原因
// ==========================================

pub mod error;
pub mod yard_api;

pub use error::{ApiError, ApiResult, FailureResponse};
pub use yard_api::{parse_reason_input, YardApi, YardOverview};
