// ==========================================
// 经销商车场运营系统 - 对账报告引擎
// ==========================================
// 职责: 无效库存上报 / 备注 / 查询 / 手工删除
// 红线: 原因写入只动原因字段，备注写入只动备注字段（字段级部分写）
// 红线: 校验失败在任何存储调用之前返回
// 红线: createdAt 只在首次创建时写入，updatedAt 每次写入刷新
// ==========================================

use crate::domain::reconciliation::{ReasonInput, ReconciliationReport};
use crate::domain::types::{ReconciliationReason, ReportSource};
use crate::engine::clock::Clock;
use crate::engine::error::{LifecycleError, LifecycleResult};
use crate::identifier::{parse_chassis, parse_dealer_key};
use crate::repository::document_store::WriteBatch;
use crate::repository::lifecycle_store::LifecycleStore;
use crate::repository::paths;
use crate::repository::record_decoder::fields;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// ValidatedReason - 已校验的原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReason {
    pub reason: ReconciliationReason,
    pub custom_reason: Option<String>,
}

impl ValidatedReason {
    /// 校验原因输入（Other 必须带非空自定义原因）
    pub fn validate(input: &ReasonInput) -> LifecycleResult<Self> {
        let custom_reason = input.normalized_custom_reason();
        if input.reason == ReconciliationReason::Other && custom_reason.is_none() {
            return Err(LifecycleError::MissingCustomReason);
        }
        Ok(Self {
            reason: input.reason,
            custom_reason,
        })
    }
}

/// 原因相关字段的部分写
///
/// 只写 chassis / reason / customReason / source / updatedAt，
/// 新建报告时额外写 createdAt；从不触碰 note。
/// key 为报告的存储键（历史报告可能不是规范车架号）
pub(crate) fn stage_reason_writes(
    batch: WriteBatch,
    dealer: &str,
    key: &str,
    chassis: &str,
    reason: &ValidatedReason,
    source: ReportSource,
    now: DateTime<Utc>,
    is_new: bool,
) -> WriteBatch {
    let field = |name: &str| paths::rectification_field(dealer, key, name);
    let mut batch = batch
        .set(field(fields::CHASSIS), Value::String(chassis.to_string()))
        .set(field(fields::REASON), Value::String(reason.reason.label().to_string()))
        .set(field(fields::SOURCE), Value::String(source.as_str().to_string()))
        .set(field(fields::UPDATED_AT), timestamp(now));

    batch = match &reason.custom_reason {
        Some(custom) => batch.set(field(fields::CUSTOM_REASON), Value::String(custom.clone())),
        None => batch.remove(field(fields::CUSTOM_REASON)),
    };

    if is_new {
        batch = batch.set(field(fields::CREATED_AT), timestamp(now));
    }
    batch
}

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339())
}

// ==========================================
// ReconciliationReporter - 对账报告引擎
// ==========================================
#[derive(Clone)]
pub struct ReconciliationReporter {
    store: LifecycleStore,
    clock: Arc<dyn Clock>,
}

impl ReconciliationReporter {
    pub fn new(store: LifecycleStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// 查询对账报告
    pub async fn get_report(
        &self,
        dealer: &str,
        chassis: &str,
    ) -> LifecycleResult<Option<ReconciliationReport>> {
        let key = parse_dealer_key(dealer)?;
        let chassis = parse_chassis(chassis)?;
        let dealer = self.resolve_dealer(&key).await?;
        self.store
            .get_report(&dealer, &chassis)
            .await
            .map_err(LifecycleError::read)
    }

    /// 查询经销商全部对账报告
    pub async fn list_reports(&self, dealer: &str) -> LifecycleResult<Vec<ReconciliationReport>> {
        let key = parse_dealer_key(dealer)?;
        let dealer = self.resolve_dealer(&key).await?;
        self.store
            .list_reports(&dealer)
            .await
            .map_err(LifecycleError::read)
    }

    /// 上报/覆盖原因
    ///
    /// # 规则
    /// - Other 必须带非空自定义原因，否则 MissingCustomReason（无任何写入）
    /// - 已有备注保持不变
    /// - 非 Other 原因会清除旧的自定义原因
    #[instrument(skip(self, input), fields(dealer = %dealer, chassis = %chassis, reason = %input.reason))]
    pub async fn upsert_report(
        &self,
        dealer: &str,
        chassis: &str,
        input: &ReasonInput,
        source: ReportSource,
    ) -> LifecycleResult<ReconciliationReport> {
        let key = parse_dealer_key(dealer)?;
        let chassis = parse_chassis(chassis)?;
        let reason = ValidatedReason::validate(input)?;
        let dealer = self.resolve_dealer(&key).await?;

        let (report_key, existing) = self.locate(&dealer, &chassis).await?;
        let now = self.clock.now();

        let batch = stage_reason_writes(
            WriteBatch::new(),
            &dealer,
            &report_key,
            &chassis,
            &reason,
            source,
            now,
            existing.is_none(),
        );
        self.store
            .store()
            .commit(batch)
            .await
            .map_err(LifecycleError::write)?;

        info!(
            is_new = existing.is_none(),
            "对账原因已写入"
        );

        let mut report = existing.unwrap_or_else(|| empty_report(&dealer, &chassis, now));
        report.reason = Some(reason.reason);
        report.custom_reason = reason.custom_reason;
        report.source = Some(source);
        report.updated_at = Some(now);
        Ok(report)
    }

    /// 保存备注
    ///
    /// # 规则
    /// - 只写 note / updatedAt（新建时加 createdAt），不触碰原因字段
    /// - 空备注清除 note 字段；对不存在的报告保存空备注不产生写入，返回 None
    #[instrument(skip(self, note), fields(dealer = %dealer, chassis = %chassis))]
    pub async fn upsert_note(
        &self,
        dealer: &str,
        chassis: &str,
        note: &str,
    ) -> LifecycleResult<Option<ReconciliationReport>> {
        let key = parse_dealer_key(dealer)?;
        let chassis = parse_chassis(chassis)?;
        let note = note.trim();
        let dealer = self.resolve_dealer(&key).await?;

        let (report_key, existing) = self.locate(&dealer, &chassis).await?;

        if note.is_empty() && existing.is_none() {
            return Ok(None);
        }

        let now = self.clock.now();
        let field = |name: &str| paths::rectification_field(&dealer, &report_key, name);
        let mut batch = WriteBatch::new()
            .set(field(fields::CHASSIS), Value::String(chassis.clone()))
            .set(field(fields::UPDATED_AT), timestamp(now));
        batch = if note.is_empty() {
            batch.remove(field(fields::NOTE))
        } else {
            batch.set(field(fields::NOTE), Value::String(note.to_string()))
        };
        if existing.is_none() {
            batch = batch.set(field(fields::CREATED_AT), timestamp(now));
        }

        self.store
            .store()
            .commit(batch)
            .await
            .map_err(LifecycleError::write)?;
        info!(cleared = note.is_empty(), "对账备注已保存");

        let mut report = existing.unwrap_or_else(|| empty_report(&dealer, &chassis, now));
        report.note = if note.is_empty() {
            None
        } else {
            Some(note.to_string())
        };
        report.updated_at = Some(now);
        Ok(Some(report))
    }

    /// 手工删除对账报告
    ///
    /// # 返回
    /// - true: 删除了已有报告
    /// - false: 报告不存在
    #[instrument(skip(self), fields(dealer = %dealer, chassis = %chassis))]
    pub async fn remove_report(&self, dealer: &str, chassis: &str) -> LifecycleResult<bool> {
        let key = parse_dealer_key(dealer)?;
        let chassis = parse_chassis(chassis)?;
        let dealer = self.resolve_dealer(&key).await?;

        let (report_key, existing) = self.locate(&dealer, &chassis).await?;
        if existing.is_none() {
            return Ok(false);
        }

        self.store
            .remove_report(&dealer, &report_key)
            .await
            .map_err(LifecycleError::write)?;
        info!("对账报告已删除");
        Ok(true)
    }
}

impl ReconciliationReporter {
    async fn resolve_dealer(&self, key: &str) -> LifecycleResult<String> {
        self.store
            .resolve_dealer(key)
            .await
            .map_err(LifecycleError::read)
    }

    /// (存储键, 已有报告)；报告不存在时键为规范车架号
    async fn locate(
        &self,
        dealer: &str,
        chassis: &str,
    ) -> LifecycleResult<(String, Option<ReconciliationReport>)> {
        let found = self
            .store
            .locate_report(dealer, chassis)
            .await
            .map_err(LifecycleError::read)?;
        Ok(match found {
            Some((key, report)) => (key, Some(report)),
            None => (chassis.to_string(), None),
        })
    }
}

fn empty_report(dealer: &str, chassis: &str, now: DateTime<Utc>) -> ReconciliationReport {
    ReconciliationReport {
        chassis: chassis.to_string(),
        dealer_slug: dealer.to_string(),
        reason: None,
        custom_reason: None,
        note: None,
        source: None,
        created_at: Some(now),
        updated_at: Some(now),
    }
}
