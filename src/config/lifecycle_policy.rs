use crate::domain::types::UnitState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 重复入场策略
///
/// 存储位置：config_kv（scope_id='global'，key='re_receive_policy'）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReReceivePolicy {
    /// 覆盖已有驻场记录（后写为准），记告警并在结果中标记
    #[default]
    Overwrite,
    /// 拒绝，返回 AlreadyInYard
    Reject,
}

impl ReReceivePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReReceivePolicy::Overwrite => "OVERWRITE",
            ReReceivePolicy::Reject => "REJECT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "OVERWRITE" => Some(ReReceivePolicy::Overwrite),
            "REJECT" => Some(ReReceivePolicy::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for ReReceivePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 生命周期策略（不可变快照，构造引擎时传入）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    /// 手工入场是否必须附带对账原因
    pub require_reason_on_manual_add: bool,

    /// 手工入场的默认初始状态（YardPending / YardStock）
    pub manual_add_state: UnitState,

    /// 重复入场策略
    #[serde(default)]
    pub re_receive_policy: ReReceivePolicy,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            require_reason_on_manual_add: true,
            manual_add_state: UnitState::YardStock,
            re_receive_policy: ReReceivePolicy::Overwrite,
        }
    }
}

impl LifecyclePolicy {
    /// 手工入场只允许进入待审批或在场库存
    pub fn is_valid_manual_state(state: UnitState) -> bool {
        matches!(state, UnitState::YardPending | UnitState::YardStock)
    }
}
