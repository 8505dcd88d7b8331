// ==========================================
// 经销商车场运营系统 - 分层配额计算器
// ==========================================
// 职责: 由车场基线容量 + 分层配置快照计算每层目标数量
// 输入: TierConfig 快照 + baseline volume (+ 当前各层数量)
// 输出: 目标数量 / 缺口与超出 / 软告警
// 红线: 纯函数，不读存储、不读全局状态
// 红线: 配比之和超过 1 不重新归一化；下限/上限违规只告警不截断
// ==========================================

use crate::domain::tier::{TierAssessment, TierConfig, TierRequirement, TierWarning};
use std::collections::{BTreeMap, BTreeSet};

/// 配比之和的浮点容差
const SHARE_SUM_EPSILON: f64 = 1e-9;

// ==========================================
// TierAllocationCalculator - 分层配额计算器
// ==========================================
/// 无状态计算器
#[derive(Debug, Default, Clone, Copy)]
pub struct TierAllocationCalculator;

impl TierAllocationCalculator {
    pub fn new() -> Self {
        Self
    }

    /// 计算每层目标数量
    ///
    /// # 规则
    /// - targetCount(tier) = round(volume * effectiveShare(tier))
    /// - 无效配比 (NaN / 超出 [0,1]) 按 0 计算
    pub fn compute_targets(&self, config: &TierConfig, volume: u32) -> BTreeMap<String, u32> {
        config
            .effective_shares()
            .into_iter()
            .map(|(tier, share)| {
                let share = sanitize_share(share).unwrap_or(0.0);
                (tier, target_count(volume, share))
            })
            .collect()
    }

    /// 评估分层结构
    ///
    /// # 参数
    /// - `config`: 分层配置快照
    /// - `volume`: 车场基线容量 (minVolume)
    /// - `current_counts`: 当前各层驻场数量
    ///
    /// # 返回
    /// 每层需求 (目标/下限/上限/当前/缺口) + 软告警
    pub fn assess(
        &self,
        config: &TierConfig,
        volume: u32,
        current_counts: &BTreeMap<String, u32>,
    ) -> TierAssessment {
        let shares = config.effective_shares();
        let mut warnings = Vec::new();

        // 1. 配比校验
        let mut share_sum = 0.0;
        let mut valid_shares: BTreeMap<String, f64> = BTreeMap::new();
        for (tier, share) in &shares {
            match sanitize_share(*share) {
                Some(valid) => {
                    share_sum += valid;
                    valid_shares.insert(tier.clone(), valid);
                }
                None => {
                    warnings.push(TierWarning::InvalidShare {
                        tier: tier.clone(),
                        value: *share,
                    });
                    valid_shares.insert(tier.clone(), 0.0);
                }
            }
        }
        if share_sum > 1.0 + SHARE_SUM_EPSILON {
            warnings.push(TierWarning::ShareSumExceedsOne { sum: share_sum });
        }

        // 2. 逐层需求（配比中的层 + 只配置了下限/上限的层）
        let tiers: BTreeSet<&String> = valid_shares.keys().chain(config.tier_targets.keys()).collect();

        let mut requirements = Vec::with_capacity(tiers.len());
        for tier in tiers {
            let share = valid_shares.get(tier).copied().unwrap_or(0.0);
            let target = config.target_for(tier);
            let target_count = target_count(volume, share);
            let current_count = current_counts.get(tier).copied().unwrap_or(0);

            if target_count < target.minimum {
                warnings.push(TierWarning::BelowMinimum {
                    tier: tier.clone(),
                    target: target_count,
                    minimum: target.minimum,
                });
            }
            if let Some(ceiling) = target.ceiling {
                if target_count > ceiling {
                    warnings.push(TierWarning::AboveCeiling {
                        tier: tier.clone(),
                        target: target_count,
                        ceiling,
                    });
                }
            }

            requirements.push(TierRequirement {
                tier: tier.clone(),
                label: target.label,
                share,
                target_count,
                minimum: target.minimum,
                ceiling: target.ceiling,
                current_count,
                gap: i64::from(current_count) - i64::from(target_count),
            });
        }

        if !warnings.is_empty() {
            tracing::debug!(
                volume = volume,
                warning_count = warnings.len(),
                "分层配置存在软告警"
            );
        }

        TierAssessment {
            baseline_volume: volume,
            requirements,
            warnings,
        }
    }
}

fn sanitize_share(share: f64) -> Option<f64> {
    if share.is_finite() && (0.0..=1.0).contains(&share) {
        Some(share)
    } else {
        None
    }
}

fn target_count(volume: u32, share: f64) -> u32 {
    (f64::from(volume) * share).round() as u32
}
