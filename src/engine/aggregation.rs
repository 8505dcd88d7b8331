// ==========================================
// 经销商车场运营系统 - 只读聚合视图
// ==========================================
// 职责: 驻场天数分桶 / KPI 计数 / 车型系列计数 / 分层结构
// 输入: YardSnapshot (最近一次本地快照) + now
// 红线: 纯函数、同步、无锁，可并发重算
// ==========================================

use crate::domain::chassis::{ChassisUnit, InTransitUnit};
use crate::domain::handover::HandoverRecord;
use crate::domain::reconciliation::ReconciliationReport;
use crate::domain::tier::TierConfig;
use crate::domain::types::{UnitState, UnitType};
use crate::engine::classification::{model_range, unit_type, ClassifiedUnit};
use crate::identifier::dealer_matches;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// YardSnapshot - 单个车场的快照
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YardSnapshot {
    pub dealer: String,
    pub units: Vec<ChassisUnit>,
    /// 全部在途记录（KPI 只统计属于本经销商的部分）
    pub in_transit: Vec<InTransitUnit>,
    pub reports: Vec<ReconciliationReport>,
    pub handovers: Vec<HandoverRecord>,
}

// ==========================================
// 驻场天数分桶
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub label: String,
    pub min_days: i64,
    /// None = 无上界（最后一桶）
    pub max_days: Option<i64>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucketSummary {
    pub buckets: Vec<DayBucket>,
    /// 没有入场时间的车架
    pub unknown: u32,
}

/// 驻场天数分桶
///
/// # 参数
/// - `bounds`: 各桶上界（含），如 [30, 60, 90, 180] → 0-30 / 31-60 / 61-90 / 91-180 / 181+
pub fn days_in_yard_buckets(
    units: &[ChassisUnit],
    bounds: &[i64],
    now: DateTime<Utc>,
) -> DayBucketSummary {
    let mut bounds: Vec<i64> = bounds.iter().copied().filter(|b| *b > 0).collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut buckets = Vec::with_capacity(bounds.len() + 1);
    let mut lower = 0;
    for bound in &bounds {
        buckets.push(DayBucket {
            label: format!("{}-{}", lower, bound),
            min_days: lower,
            max_days: Some(*bound),
            count: 0,
        });
        lower = bound + 1;
    }
    buckets.push(DayBucket {
        label: format!("{}+", lower),
        min_days: lower,
        max_days: None,
        count: 0,
    });

    let mut unknown = 0;
    for unit in units {
        let Some(days) = unit.days_in_yard(now) else {
            unknown += 1;
            continue;
        };
        let index = bounds
            .iter()
            .position(|bound| days <= *bound)
            .unwrap_or(bounds.len());
        buckets[index].count += 1;
    }

    DayBucketSummary { buckets, unknown }
}

// ==========================================
// KPI
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YardKpi {
    pub yard_total: u32,
    pub stock: u32,
    pub customer: u32,
    pub pending: u32,
    pub in_transit: u32,
    pub reported: u32,
    pub handovers: u32,
}

/// KPI 计数
pub fn kpi_counts(snapshot: &YardSnapshot) -> YardKpi {
    let mut kpi = YardKpi {
        yard_total: snapshot.units.len() as u32,
        reported: snapshot.reports.iter().filter(|r| r.reason.is_some()).count() as u32,
        handovers: snapshot.handovers.len() as u32,
        ..YardKpi::default()
    };

    for unit in &snapshot.units {
        match unit_type(&unit.customer) {
            UnitType::Stock => kpi.stock += 1,
            UnitType::Customer => kpi.customer += 1,
        }
        if unit.state == UnitState::YardPending {
            kpi.pending += 1;
        }
    }

    kpi.in_transit = snapshot
        .in_transit
        .iter()
        .filter(|u| dealer_matches(&u.dealer, &snapshot.dealer))
        .count() as u32;

    kpi
}

// ==========================================
// 车型系列 / 分层结构
// ==========================================

/// 带派生字段的车架列表
pub fn classify_units(units: &[ChassisUnit]) -> Vec<ClassifiedUnit> {
    units.iter().cloned().map(ClassifiedUnit::classify).collect()
}

/// 按车型系列计数
pub fn model_range_counts(units: &[ChassisUnit]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for unit in units {
        *counts
            .entry(model_range(&unit.model, &unit.chassis))
            .or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierMix {
    pub counts: BTreeMap<String, u32>,
    /// 车型系列未映射到任何分层的车架数
    pub unassigned: u32,
}

/// 当前分层结构（车型系列 → 层，经 range_tiers 映射）
pub fn tier_mix(units: &[ChassisUnit], config: &TierConfig) -> TierMix {
    let mut mix = TierMix::default();
    for (range, count) in model_range_counts(units) {
        match config.range_tiers.get(&range) {
            Some(tier) => *mix.counts.entry(tier.clone()).or_insert(0) += count,
            None => mix.unassigned += count,
        }
    }
    mix
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn unit(chassis: &str, model: &str, customer: &str, days: Option<i64>, now: DateTime<Utc>) -> ChassisUnit {
        ChassisUnit {
            chassis: chassis.to_string(),
            dealer_slug: "st-james".to_string(),
            model: model.to_string(),
            customer: customer.to_string(),
            state: UnitState::YardStock,
            source: "PGI".to_string(),
            received_at: days.map(|d| now - Duration::days(d)),
            dispatched_at: None,
            handover_at: None,
            source_date: None,
        }
    }

    #[test]
    fn test_day_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let units = vec![
            unit("C1", "SRP", "", Some(0), now),
            unit("C2", "SRP", "", Some(30), now),
            unit("C3", "SRP", "", Some(31), now),
            unit("C4", "SRP", "", Some(400), now),
            unit("C5", "SRP", "", None, now),
        ];
        let summary = days_in_yard_buckets(&units, &[30, 60, 90, 180], now);
        let counts: Vec<u32> = summary.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 0, 1]);
        assert_eq!(summary.buckets[4].label, "181+");
        assert_eq!(summary.unknown, 1);
    }

    #[test]
    fn test_kpi_and_tier_mix() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut pending = unit("C3", "NGC22", "John Smith", Some(2), now);
        pending.state = UnitState::YardPending;
        let snapshot = YardSnapshot {
            dealer: "st-james".to_string(),
            units: vec![
                unit("C1", "SRP19", "", Some(1), now),
                unit("C2", "SRC21", "Dealer Stock", Some(1), now),
                pending,
            ],
            in_transit: vec![
                InTransitUnit {
                    chassis: "T1".to_string(),
                    model: "SRP".to_string(),
                    customer: String::new(),
                    dealer: "St James".to_string(),
                    forecast_date: None,
                },
                InTransitUnit {
                    chassis: "T2".to_string(),
                    model: "SRP".to_string(),
                    customer: String::new(),
                    dealer: "Frankston".to_string(),
                    forecast_date: None,
                },
            ],
            reports: Vec::new(),
            handovers: Vec::new(),
        };

        let kpi = kpi_counts(&snapshot);
        assert_eq!(kpi.yard_total, 3);
        assert_eq!(kpi.stock, 2);
        assert_eq!(kpi.customer, 1);
        assert_eq!(kpi.pending, 1);
        assert_eq!(kpi.in_transit, 1);

        let mut config = TierConfig::default();
        config.range_tiers.insert("SRP".to_string(), "A1".to_string());
        config.range_tiers.insert("SRC".to_string(), "A1".to_string());
        let mix = tier_mix(&snapshot.units, &config);
        assert_eq!(mix.counts.get("A1"), Some(&2));
        assert_eq!(mix.unassigned, 1);
    }
}
