// ==========================================
// 经销商车场运营系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 存储错误 =====
    #[error("存储写入被拒绝: path={path}, {message}")]
    WriteRejected { path: String, message: String },

    #[error("存储读取失败: path={path}, {message}")]
    ReadRejected { path: String, message: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ===== 数据质量错误 =====
    #[error("无效的存储路径: {0}")]
    InvalidPath(String),

    #[error("记录序列化失败: {0}")]
    SerializationError(String),

    #[error("记录结构无法识别 (path={path}): {message}")]
    UnrecognizedRecord { path: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => RepositoryError::DatabaseQueryError(msg),
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
