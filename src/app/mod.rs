// ==========================================
// 经销商车场运营系统 - 应用层
// ==========================================
// 职责: 从数据库路径装配存储、配置、引擎与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
