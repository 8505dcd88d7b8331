// ==========================================
// 经销商车场运营系统 - API层错误类型
// ==========================================
// 职责: 把引擎/仓储/数据源错误转换为带失败原因的 API 错误
// 红线: 每个失败都必须带可展示的原因字符串
// ==========================================

use crate::engine::error::LifecycleError;
use crate::feed::error::FeedError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    MissingReason(String),

    #[error("数据验证失败: {0}")]
    MissingCustomReason(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("存储写入失败: {0}")]
    StoreWriteFailed(String),

    #[error("存储读取失败: {0}")]
    StoreReadFailed(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 错误码（稳定，供展示层分支）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::MissingReason(_) => "MISSING_REASON",
            ApiError::MissingCustomReason(_) => "MISSING_CUSTOM_REASON",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ApiError::StoreWriteFailed(_) => "STORE_WRITE_FAILED",
            ApiError::StoreReadFailed(_) => "STORE_READ_FAILED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// 展示层使用的失败信息
    pub fn to_failure(&self) -> FailureResponse {
        FailureResponse {
            code: self.code().to_string(),
            reason: self.to_string(),
        }
    }
}

/// 失败响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub code: String,
    pub reason: String,
}

// ==========================================
// 从 LifecycleError 转换
// ==========================================
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidIdentifier { .. } => ApiError::InvalidInput(err.to_string()),
            LifecycleError::MissingReason => ApiError::MissingReason(err.to_string()),
            LifecycleError::MissingCustomReason => ApiError::MissingCustomReason(err.to_string()),
            LifecycleError::NotInYard { .. } | LifecycleError::NotInTransit(_) => {
                ApiError::NotFound(err.to_string())
            }
            LifecycleError::AlreadyInYard { .. } | LifecycleError::AlreadyDispatched { .. } => {
                ApiError::BusinessRuleViolation(err.to_string())
            }
            LifecycleError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            LifecycleError::StoreWriteFailed(msg) => ApiError::StoreWriteFailed(msg),
            LifecycleError::StoreReadFailed(msg) => ApiError::StoreReadFailed(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ReadRejected { .. } | RepositoryError::UnrecognizedRecord { .. } => {
                ApiError::StoreReadFailed(err.to_string())
            }
            RepositoryError::InvalidPath(msg) => ApiError::InvalidInput(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            other => ApiError::StoreWriteFailed(other.to_string()),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::FileNotFound(path) => ApiError::NotFound(format!("文件不存在: {}", path)),
            FeedError::UnsupportedFormat(ext) => {
                ApiError::InvalidInput(format!("文件格式不支持: {}", ext))
            }
            other => ApiError::StoreReadFailed(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
