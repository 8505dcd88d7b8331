// ==========================================
// 经销商车场运营系统 - 引擎层错误类型
// ==========================================
// 红线: 标识符/原因校验失败在任何存储调用之前返回（无部分写入）
// 红线: 存储失败原样上抛，不自动重试、不做补偿事务
// ==========================================

use crate::identifier::IdentifierError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 生命周期引擎错误
#[derive(Error, Debug)]
pub enum LifecycleError {
    // ===== 输入校验 =====
    #[error("无效标识符 ({field}): {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("缺少对账原因")]
    MissingReason,

    #[error("原因为 Other 时必须填写自定义原因")]
    MissingCustomReason,

    // ===== 状态机 =====
    #[error("车架不在车场: dealer={dealer}, chassis={chassis}")]
    NotInYard { dealer: String, chassis: String },

    #[error("车架已在车场: dealer={dealer}, chassis={chassis}")]
    AlreadyInYard { dealer: String, chassis: String },

    #[error("车架已交付，交付记录不可覆盖: dealer={dealer}, chassis={chassis}")]
    AlreadyDispatched { dealer: String, chassis: String },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("在途数据中找不到车架: {0}")]
    NotInTransit(String),

    // ===== 存储 =====
    #[error("存储写入失败: {0}")]
    StoreWriteFailed(String),

    #[error("存储读取失败: {0}")]
    StoreReadFailed(String),
}

impl LifecycleError {
    /// 存储写入失败
    pub fn write(err: RepositoryError) -> Self {
        LifecycleError::StoreWriteFailed(err.to_string())
    }

    /// 存储读取失败
    pub fn read(err: RepositoryError) -> Self {
        LifecycleError::StoreReadFailed(err.to_string())
    }

    /// 是否为存储层错误（调用方可整体重试）
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            LifecycleError::StoreWriteFailed(_) | LifecycleError::StoreReadFailed(_)
        )
    }
}

impl From<IdentifierError> for LifecycleError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::EmptyChassis(value) => LifecycleError::InvalidIdentifier {
                field: "chassis",
                value,
            },
            IdentifierError::EmptyDealer(value) => LifecycleError::InvalidIdentifier {
                field: "dealer",
                value,
            },
        }
    }
}

/// Result 类型别名
pub type LifecycleResult<T> = Result<T, LifecycleError>;
