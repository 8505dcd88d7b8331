// ==========================================
// 经销商车场运营系统 - 在途数据源错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 在途数据源错误
#[derive(Error, Debug)]
pub enum FeedError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 存储 =====
    #[error("在途数据读取失败: {0}")]
    StoreError(#[from] RepositoryError),
}

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        FeedError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for FeedError {
    fn from(err: csv::Error) -> Self {
        FeedError::CsvParseError(err.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
