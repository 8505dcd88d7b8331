// ==========================================
// 经销商车场运营系统 - 车场分层配额领域模型
// ==========================================
// 职责: 分层目标配置（不可变快照）与派生的分层需求
// 红线: 分层需求是派生值，不落库
// 红线: 默认配比只是基线，可被配置按层覆盖
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// 内置基线分层
// ==========================================
// (tier_key, label, role, share)
pub const DEFAULT_TIERS: [(&str, &str, &str, f64); 4] = [
    ("A1", "Core", "主力走量车型", 0.4),
    ("A1+", "Flagship", "旗舰展示车型", 0.3),
    ("A2", "Supporting", "补充车型", 0.2),
    ("B1", "Niche", "小众车型", 0.1),
];

// ==========================================
// TierTarget - 单层目标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierTarget {
    pub label: String,
    pub role: String,
    pub minimum: u32,         // 下限 (硬下限，独立于配比计算)
    pub ceiling: Option<u32>, // 上限 (可选)
}

// ==========================================
// TierConfig - 分层配置快照
// ==========================================
// 调用时显式传入计算器，不使用全局可变状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierConfig {
    /// 配比覆盖 (tier → 占总容量比例)，未覆盖的层使用基线
    #[serde(default)]
    pub share_targets: BTreeMap<String, f64>,
    /// 每层下限/上限
    #[serde(default)]
    pub tier_targets: BTreeMap<String, TierTarget>,
    /// 车型系列 → 层 (用于统计当前结构)
    #[serde(default)]
    pub range_tiers: BTreeMap<String, String>,
}

impl TierConfig {
    /// 基线配比表
    pub fn baseline_shares() -> BTreeMap<String, f64> {
        DEFAULT_TIERS
            .iter()
            .map(|(key, _, _, share)| (key.to_string(), *share))
            .collect()
    }

    /// 生效配比: 覆盖值逐层替换基线值
    pub fn effective_shares(&self) -> BTreeMap<String, f64> {
        let mut shares = Self::baseline_shares();
        for (tier, share) in &self.share_targets {
            shares.insert(tier.clone(), *share);
        }
        shares
    }

    /// 某层的目标配置（未配置时回退到基线标签，下限为 0）
    pub fn target_for(&self, tier: &str) -> TierTarget {
        if let Some(target) = self.tier_targets.get(tier) {
            return target.clone();
        }
        DEFAULT_TIERS
            .iter()
            .find(|(key, _, _, _)| *key == tier)
            .map(|(_, label, role, _)| TierTarget {
                label: label.to_string(),
                role: role.to_string(),
                minimum: 0,
                ceiling: None,
            })
            .unwrap_or_else(|| TierTarget {
                label: tier.to_string(),
                role: String::new(),
                minimum: 0,
                ceiling: None,
            })
    }
}

// ==========================================
// TierRequirement - 分层需求(派生)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRequirement {
    pub tier: String,
    pub label: String,
    pub share: f64,
    pub target_count: u32,
    pub minimum: u32,
    pub ceiling: Option<u32>,
    pub current_count: u32,
    /// 当前数量 - 目标数量 (负数=缺口，正数=超出)
    pub gap: i64,
}

impl TierRequirement {
    pub fn is_shortfall(&self) -> bool {
        self.gap < 0
    }

    pub fn is_overflow(&self) -> bool {
        self.gap > 0
    }
}

// ==========================================
// TierWarning - 配置/结构软告警
// ==========================================
// 不阻断计算，由展示层提示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TierWarning {
    ShareSumExceedsOne { sum: f64 },
    InvalidShare { tier: String, value: f64 },
    BelowMinimum { tier: String, target: u32, minimum: u32 },
    AboveCeiling { tier: String, target: u32, ceiling: u32 },
}

impl fmt::Display for TierWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierWarning::ShareSumExceedsOne { sum } => {
                write!(f, "分层配比之和 {:.4} 超过 1.0", sum)
            }
            TierWarning::InvalidShare { tier, value } => {
                write!(f, "分层 {} 的配比 {} 无效，按 0 计算", tier, value)
            }
            TierWarning::BelowMinimum { tier, target, minimum } => {
                write!(f, "分层 {} 目标数量 {} 低于下限 {}", tier, target, minimum)
            }
            TierWarning::AboveCeiling { tier, target, ceiling } => {
                write!(f, "分层 {} 目标数量 {} 超过上限 {}", tier, target, ceiling)
            }
        }
    }
}

// ==========================================
// TierAssessment - 分层评估结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAssessment {
    pub baseline_volume: u32,
    pub requirements: Vec<TierRequirement>,
    pub warnings: Vec<TierWarning>,
}

impl TierAssessment {
    pub fn requirement(&self, tier: &str) -> Option<&TierRequirement> {
        self.requirements.iter().find(|r| r.tier == tier)
    }
}
