// ==========================================
// 经销商车场运营系统 - 车场 API
// ==========================================
// 职责: 展示层唯一入口（生命周期操作 / 对账报告 / 分层配额 / 聚合视图）
// 红线: 失败返回带原因的 ApiError，调用方据此保持原有展示
// 红线: 读取失败按"无数据"处理，不让展示层崩溃
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::error::{ApiError, ApiResult};
use crate::config::yard_config_trait::YardConfigReader;
use crate::config::DEFAULT_DAY_BUCKETS;
use crate::domain::handover::HandoverRecord;
use crate::domain::reconciliation::{ReasonInput, ReconciliationReport};
use crate::domain::tier::{TierAssessment, TierConfig};
use crate::domain::types::ReconciliationReason;
use crate::engine::aggregation::{
    classify_units, days_in_yard_buckets, kpi_counts, model_range_counts, tier_mix,
    DayBucketSummary, TierMix, YardKpi, YardSnapshot,
};
use crate::engine::classification::ClassifiedUnit;
use crate::engine::error::LifecycleError;
use crate::engine::lifecycle::{
    AuditReport, ChassisLifecycleEngine, DispatchRequest, ManualAddOutcome, ManualAddRequest,
    ReceiveOutcome, ReceiveRequest, SweepReport,
};
use crate::engine::tier_allocation::TierAllocationCalculator;
use crate::feed::schedule_feed::ScheduleFeed;
use crate::identifier::{normalize_dealer_slug, parse_dealer_key};
use crate::repository::document_store::SnapshotCallback;
use crate::repository::paths;
use crate::repository::subscription::Subscription;

// ==========================================
// YardOverview - 车场总览
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YardOverview {
    pub dealer: String,
    pub kpi: YardKpi,
    pub day_buckets: DayBucketSummary,
    pub model_ranges: BTreeMap<String, u32>,
    pub tier_mix: TierMix,
    pub tier_assessment: TierAssessment,
}

// ==========================================
// YardApi - 车场 API
// ==========================================

/// 车场API
///
/// 职责：
/// 1. 生命周期操作（入场、手工入场、审批、交付）
/// 2. 对账报告（上报、备注、删除）
/// 3. 分层配额与聚合视图
/// 4. 恢复清扫与审计
pub struct YardApi {
    engine: Arc<ChassisLifecycleEngine>,
    config: Arc<dyn YardConfigReader>,
    calculator: TierAllocationCalculator,
}

impl YardApi {
    /// 创建新的YardApi实例
    pub fn new(engine: Arc<ChassisLifecycleEngine>, config: Arc<dyn YardConfigReader>) -> Self {
        Self {
            engine,
            config,
            calculator: TierAllocationCalculator::new(),
        }
    }

    pub fn engine(&self) -> &Arc<ChassisLifecycleEngine> {
        &self.engine
    }

    // ==========================================
    // 生命周期操作
    // ==========================================

    pub async fn receive(&self, request: ReceiveRequest) -> ApiResult<ReceiveOutcome> {
        Ok(self.engine.receive(request).await?)
    }

    pub async fn receive_from_feed(
        &self,
        chassis: &str,
        dealer: &str,
        feed: &dyn ScheduleFeed,
    ) -> ApiResult<ReceiveOutcome> {
        Ok(self.engine.receive_from_feed(chassis, dealer, feed).await?)
    }

    pub async fn manual_add(&self, request: ManualAddRequest) -> ApiResult<ManualAddOutcome> {
        Ok(self.engine.manual_add(request).await?)
    }

    pub async fn approve_pending(&self, dealer: &str, chassis: &str) -> ApiResult<ClassifiedUnit> {
        let unit = self.engine.approve_pending(dealer, chassis).await?;
        Ok(ClassifiedUnit::classify(unit))
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> ApiResult<HandoverRecord> {
        Ok(self.engine.dispatch(request).await?)
    }

    // ==========================================
    // 对账报告
    // ==========================================

    /// 上报无效库存
    ///
    /// # 参数
    /// - reason_label: 原因展示文本（如 "Never received"，忽略大小写）
    /// - custom_reason: 原因为 Other 时必填
    pub async fn report_invalid(
        &self,
        dealer: &str,
        chassis: &str,
        reason_label: &str,
        custom_reason: Option<&str>,
    ) -> ApiResult<ReconciliationReport> {
        let input = parse_reason_input(reason_label, custom_reason)?;
        Ok(self.engine.report_invalid(dealer, chassis, &input).await?)
    }

    pub async fn annotate_note(
        &self,
        dealer: &str,
        chassis: &str,
        note: &str,
    ) -> ApiResult<Option<ReconciliationReport>> {
        Ok(self.engine.annotate_note(dealer, chassis, note).await?)
    }

    pub async fn get_report(
        &self,
        dealer: &str,
        chassis: &str,
    ) -> ApiResult<Option<ReconciliationReport>> {
        Ok(self.engine.reporter().get_report(dealer, chassis).await?)
    }

    pub async fn list_reports(&self, dealer: &str) -> ApiResult<Vec<ReconciliationReport>> {
        Ok(self.engine.reporter().list_reports(dealer).await?)
    }

    pub async fn remove_report(&self, dealer: &str, chassis: &str) -> ApiResult<bool> {
        Ok(self.engine.reporter().remove_report(dealer, chassis).await?)
    }

    // ==========================================
    // 快照与视图
    // ==========================================

    /// 加载车场快照（各集合读取失败时按空集合处理）
    pub async fn load_snapshot(&self, dealer: &str) -> ApiResult<YardSnapshot> {
        let dealer = self.resolve_dealer_or_stripped(dealer).await?;
        let store = self.engine.store();

        let (units, in_transit, reports, handovers) = futures::join!(
            store.list_yard_units(&dealer),
            store.list_in_transit(),
            store.list_reports(&dealer),
            store.list_handovers(&dealer),
        );

        Ok(YardSnapshot {
            units: or_empty(units, "yardstock", &dealer),
            in_transit: or_empty(in_transit, "pgirecord", &dealer),
            reports: or_empty(reports, "stockRectification", &dealer),
            handovers: or_empty(handovers, "handover", &dealer),
            dealer,
        })
    }

    /// 驻场车架（带类型 / 车型系列）
    pub async fn list_yard(&self, dealer: &str) -> ApiResult<Vec<ClassifiedUnit>> {
        let snapshot = self.load_snapshot(dealer).await?;
        Ok(classify_units(&snapshot.units))
    }

    /// 分层需求（当前结构 vs 目标）
    pub async fn tier_requirements(&self, dealer: &str) -> ApiResult<TierAssessment> {
        let snapshot = self.load_snapshot(dealer).await?;
        let tier_config = self.load_tier_config_or_default().await;
        let volume = self.min_volume_or_zero(&snapshot.dealer).await;
        let mix = tier_mix(&snapshot.units, &tier_config);
        Ok(self.calculator.assess(&tier_config, volume, &mix.counts))
    }

    /// 车场总览
    pub async fn overview(&self, dealer: &str) -> ApiResult<YardOverview> {
        let snapshot = self.load_snapshot(dealer).await?;
        let tier_config = self.load_tier_config_or_default().await;
        let volume = self.min_volume_or_zero(&snapshot.dealer).await;
        let bounds = match self.config.get_day_buckets().await {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!("读取驻场天数分桶失败，使用默认值: {}", e);
                DEFAULT_DAY_BUCKETS.to_vec()
            }
        };

        let now = self.engine.clock().now();
        let mix = tier_mix(&snapshot.units, &tier_config);
        let tier_assessment = self.calculator.assess(&tier_config, volume, &mix.counts);

        Ok(YardOverview {
            dealer: snapshot.dealer.clone(),
            kpi: kpi_counts(&snapshot),
            day_buckets: days_in_yard_buckets(&snapshot.units, &bounds, now),
            model_ranges: model_range_counts(&snapshot.units),
            tier_mix: mix,
            tier_assessment,
        })
    }

    /// 订阅车场驻场集合（返回值 drop 或 unsubscribe 后不再推送）
    pub async fn subscribe_yard(
        &self,
        dealer: &str,
        callback: SnapshotCallback,
    ) -> ApiResult<Subscription> {
        let dealer = self.resolve_dealer_or_stripped(dealer).await?;
        Ok(self
            .engine
            .store()
            .store()
            .subscribe(&paths::yard_dealer(&dealer), callback)?)
    }

    // ==========================================
    // 分层配置
    // ==========================================

    pub async fn get_tier_config(&self) -> ApiResult<TierConfig> {
        Ok(self.engine.store().load_tier_config().await?)
    }

    pub async fn save_tier_config(&self, config: &TierConfig) -> ApiResult<()> {
        Ok(self.engine.store().save_tier_config(config).await?)
    }

    // ==========================================
    // 恢复与审计
    // ==========================================

    pub async fn recover_pending_dispatches(&self) -> ApiResult<SweepReport> {
        Ok(self.engine.recover_pending_dispatches().await?)
    }

    pub async fn audit_yard(&self, dealer: &str) -> ApiResult<AuditReport> {
        Ok(self.engine.audit_yard(dealer).await?)
    }

    pub async fn list_yard_dealers(&self) -> ApiResult<Vec<String>> {
        Ok(self.engine.store().list_yard_dealers().await?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 经销商键解析；解析读取失败时按去后缀结果处理
    async fn resolve_dealer_or_stripped(&self, dealer: &str) -> ApiResult<String> {
        let key = parse_dealer_key(dealer).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        match self.engine.store().resolve_dealer(&key).await {
            Ok(resolved) => Ok(resolved),
            Err(e) => {
                warn!(dealer = %key, "解析经销商键失败，按去后缀处理: {}", e);
                Ok(normalize_dealer_slug(&key))
            }
        }
    }

    async fn load_tier_config_or_default(&self) -> TierConfig {
        match self.engine.store().load_tier_config().await {
            Ok(config) => config,
            Err(e) => {
                warn!("读取分层配置失败，使用基线配置: {}", e);
                TierConfig::default()
            }
        }
    }

    async fn min_volume_or_zero(&self, dealer: &str) -> u32 {
        match self.config.get_min_volume(dealer).await {
            Ok(volume) => volume,
            Err(e) => {
                warn!(dealer = %dealer, "读取车场容量失败，按 0 计算: {}", e);
                0
            }
        }
    }
}

/// 解析原因输入（展示文本 → 枚举）
pub fn parse_reason_input(reason_label: &str, custom_reason: Option<&str>) -> ApiResult<ReasonInput> {
    if reason_label.trim().is_empty() {
        return Err(LifecycleError::MissingReason.into());
    }
    let reason = ReconciliationReason::parse(reason_label).ok_or_else(|| {
        ApiError::InvalidInput(format!("未知的对账原因: {}", reason_label.trim()))
    })?;
    Ok(ReasonInput {
        reason,
        custom_reason: custom_reason.map(str::to_string),
    })
}

fn or_empty<T, E: std::fmt::Display>(result: Result<Vec<T>, E>, collection: &str, dealer: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(collection = %collection, dealer = %dealer, "读取失败，按无数据处理: {}", e);
            Vec::new()
        }
    }
}
