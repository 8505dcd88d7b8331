// ==========================================
// 经销商车场运营系统 - 车架生命周期引擎
// ==========================================
// 状态机:
//   InTransit ──receive──▶ YardStock ──dispatch──▶ Dispatched (终态)
//   ∅ ──manual_add──▶ YardPending ──approve──▶ YardStock
//   ∅ ──manual_add──▶ YardStock
//   report_invalid / annotate_note: 不改变状态
// 红线: 标识符/原因校验在任何存储调用之前完成（无部分写入）
// 红线: 存储失败原样上抛，不自动重试
// 红线: 交付记录只创建一次，不覆盖
// 红线: 交付 = 写意图 → 删驻场 → 写交付 → 清意图，残留意图由清扫补齐
// ==========================================

use crate::config::lifecycle_policy::{LifecyclePolicy, ReReceivePolicy};
use crate::domain::chassis::ChassisUnit;
use crate::domain::handover::{DispatchIntent, HandoverRecord};
use crate::domain::reconciliation::{ReasonInput, ReconciliationReport};
use crate::domain::types::{source_tags, ReportSource, UnitState};
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::error::{LifecycleError, LifecycleResult};
use crate::engine::reconciliation::{stage_reason_writes, ReconciliationReporter, ValidatedReason};
use crate::feed::schedule_feed::ScheduleFeed;
use crate::identifier::{dealer_matches, parse_chassis, parse_dealer_key, prettify_dealer_name};
use crate::repository::document_store::WriteBatch;
use crate::repository::lifecycle_store::{encode_yard_unit, LifecycleStore};
use crate::repository::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 请求 / 结果
// ==========================================

/// 入场请求
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveRequest {
    pub chassis: String,
    pub dealer: String,
    pub model: String,
    pub customer: String,
    pub source_date: Option<DateTime<Utc>>,
}

/// 入场结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveOutcome {
    pub unit: ChassisUnit,
    /// 覆盖了已有驻场记录（重复入场）
    pub replaced_existing: bool,
    /// 清除了对应在途记录
    pub transit_cleared: bool,
}

/// 手工入场请求
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManualAddRequest {
    pub chassis: String,
    pub dealer: String,
    pub model: Option<String>,
    pub customer: Option<String>,
    pub reason: Option<ReasonInput>,
    /// 经销商指定的初始状态，缺省用策略值
    pub initial_state: Option<UnitState>,
}

/// 手工入场结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAddOutcome {
    pub unit: ChassisUnit,
    pub report: Option<ReconciliationReport>,
}

/// 交付请求
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispatchRequest {
    pub chassis: String,
    pub dealer: String,
    /// 缺省由 slug 生成展示名
    pub dealer_name: Option<String>,
    /// 交付时间覆盖值，缺省为当前时间
    pub handover_at: Option<DateTime<Utc>>,
}

/// 意图清扫结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub scanned: usize,
    /// 补写了交付记录的意图 (dealer/chassis)
    pub completed: Vec<String>,
    /// 驻场记录仍在，交付未生效，直接清除的意图
    pub rolled_back: Vec<String>,
    /// 交付记录已存在，只清除意图
    pub already_done: Vec<String>,
    /// 处理失败的意图 (key, 原因)
    pub failed: Vec<(String, String)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 车场审计结果（只读）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub dealer: String,
    pub yard_count: usize,
    /// 同时存在驻场记录和在途记录
    pub also_in_transit: Vec<String>,
    /// 同时存在驻场记录和交付记录
    pub also_handed_over: Vec<String>,
    /// 尚未清扫的交付意图
    pub pending_intents: Vec<String>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.also_in_transit.is_empty()
            && self.also_handed_over.is_empty()
            && self.pending_intents.is_empty()
    }
}

enum IntentResolution {
    Completed,
    RolledBack,
    AlreadyDone,
}

// ==========================================
// ChassisLifecycleEngine - 生命周期引擎
// ==========================================
#[derive(Clone)]
pub struct ChassisLifecycleEngine {
    store: LifecycleStore,
    reporter: ReconciliationReporter,
    policy: LifecyclePolicy,
    clock: Arc<dyn Clock>,
}

impl ChassisLifecycleEngine {
    pub fn new(store: LifecycleStore, policy: LifecyclePolicy, clock: Arc<dyn Clock>) -> Self {
        let reporter = ReconciliationReporter::new(store.clone(), clock.clone());
        Self {
            store,
            reporter,
            policy,
            clock,
        }
    }

    /// 使用系统时钟
    pub fn with_system_clock(store: LifecycleStore, policy: LifecyclePolicy) -> Self {
        Self::new(store, policy, Arc::new(SystemClock))
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    pub fn reporter(&self) -> &ReconciliationReporter {
        &self.reporter
    }

    pub fn store(&self) -> &LifecycleStore {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// 经销商标识解析（校验 + 历史后缀按已有数据处理）
    pub async fn resolve_dealer(&self, raw: &str) -> LifecycleResult<String> {
        let key = parse_dealer_key(raw)?;
        self.resolve_dealer_key(&key).await
    }

    async fn resolve_dealer_key(&self, key: &str) -> LifecycleResult<String> {
        self.store
            .resolve_dealer(key)
            .await
            .map_err(LifecycleError::read)
    }

    // ==========================================
    // 入场 (InTransit → YardStock)
    // ==========================================

    /// 入场
    ///
    /// # 规则
    /// - 写驻场记录 (receivedAt = now)，同一批次删除在途记录
    /// - 重复入场: Overwrite → 覆盖并告警; Reject → AlreadyInYard
    #[instrument(skip(self, request), fields(chassis = %request.chassis, dealer = %request.dealer))]
    pub async fn receive(&self, request: ReceiveRequest) -> LifecycleResult<ReceiveOutcome> {
        // 1. 标识符校验
        let chassis = parse_chassis(&request.chassis)?;
        let key = parse_dealer_key(&request.dealer)?;
        let dealer = self.resolve_dealer_key(&key).await?;

        self.receive_resolved(chassis, dealer, request).await
    }

    /// 入场（标识符已校验并解析）
    async fn receive_resolved(
        &self,
        chassis: String,
        dealer: String,
        request: ReceiveRequest,
    ) -> LifecycleResult<ReceiveOutcome> {
        // 2. 重复入场判定
        let existing = self
            .store
            .locate_yard_unit(&dealer, &chassis)
            .await
            .map_err(LifecycleError::read)?;
        if let Some((_, existing)) = &existing {
            match self.policy.re_receive_policy {
                ReReceivePolicy::Reject => {
                    return Err(LifecycleError::AlreadyInYard { dealer, chassis });
                }
                ReReceivePolicy::Overwrite => warn!(
                    previous_state = %existing.state,
                    previous_source = %existing.source,
                    "重复入场，覆盖已有驻场记录"
                ),
            }
        }

        let in_transit = self
            .store
            .get_in_transit(&chassis)
            .await
            .map_err(LifecycleError::read)?;

        // 3. 写入
        let unit = ChassisUnit {
            chassis: chassis.clone(),
            dealer_slug: dealer.clone(),
            model: request.model.trim().to_string(),
            customer: request.customer.trim().to_string(),
            state: UnitState::YardStock,
            source: source_tags::PGI.to_string(),
            received_at: Some(self.clock.now()),
            dispatched_at: None,
            handover_at: None,
            source_date: request.source_date,
        };
        let mut batch = WriteBatch::new()
            .set(paths::yard_unit(&dealer, &chassis), encode_yard_unit(&unit).map_err(LifecycleError::write)?)
            .remove(paths::pgi_record(&chassis));
        // 历史键（非规范车架号）与规范记录不能并存
        if let Some((stored_key, _)) = &existing {
            if *stored_key != chassis {
                batch = batch.remove(paths::yard_unit(&dealer, stored_key));
            }
        }
        self.store
            .store()
            .commit(batch)
            .await
            .map_err(LifecycleError::write)?;

        info!(
            replaced_existing = existing.is_some(),
            transit_cleared = in_transit.is_some(),
            "车架已入场"
        );

        Ok(ReceiveOutcome {
            unit,
            replaced_existing: existing.is_some(),
            transit_cleared: in_transit.is_some(),
        })
    }

    /// 从在途数据源入场（只取 model / customer / 预计日期）
    pub async fn receive_from_feed(
        &self,
        chassis: &str,
        dealer: &str,
        feed: &dyn ScheduleFeed,
    ) -> LifecycleResult<ReceiveOutcome> {
        let normalized = parse_chassis(chassis)?;
        let key = parse_dealer_key(dealer)?;
        let dealer_slug = self.resolve_dealer_key(&key).await?;

        let unit = feed
            .lookup(&normalized)
            .await
            .map_err(|e| LifecycleError::StoreReadFailed(e.to_string()))?
            .ok_or_else(|| LifecycleError::NotInTransit(normalized.clone()))?;

        if !unit.dealer.trim().is_empty() && !dealer_matches(&unit.dealer, &dealer_slug) {
            warn!(
                chassis = %normalized,
                feed_dealer = %unit.dealer,
                dealer = %dealer_slug,
                "在途数据的经销商与入场经销商不一致"
            );
        }

        let request = ReceiveRequest {
            chassis: normalized.clone(),
            dealer: dealer_slug.clone(),
            model: unit.model,
            customer: unit.customer,
            source_date: unit.forecast_date,
        };
        self.receive_resolved(normalized, dealer_slug, request).await
    }

    // ==========================================
    // 手工入场 (∅ → YardPending / YardStock)
    // ==========================================

    /// 手工入场
    ///
    /// # 规则
    /// - 策略要求原因时，缺少原因 → MissingReason
    /// - Other 缺少自定义原因 → MissingCustomReason
    /// - 驻场记录与对账报告在同一批次写入
    /// - 已在车场 → AlreadyInYard
    #[instrument(skip(self, request), fields(chassis = %request.chassis, dealer = %request.dealer))]
    pub async fn manual_add(&self, request: ManualAddRequest) -> LifecycleResult<ManualAddOutcome> {
        // 1. 输入校验
        let chassis = parse_chassis(&request.chassis)?;
        let key = parse_dealer_key(&request.dealer)?;

        let state = request.initial_state.unwrap_or(self.policy.manual_add_state);
        if !LifecyclePolicy::is_valid_manual_state(state) {
            return Err(LifecycleError::InvalidStateTransition {
                from: "NONE".to_string(),
                to: state.to_string(),
            });
        }

        let reason = match &request.reason {
            Some(input) => Some(ValidatedReason::validate(input)?),
            None if self.policy.require_reason_on_manual_add => {
                return Err(LifecycleError::MissingReason)
            }
            None => None,
        };

        // 2. 冲突检查
        let dealer = self.resolve_dealer_key(&key).await?;
        if self
            .store
            .get_yard_unit(&dealer, &chassis)
            .await
            .map_err(LifecycleError::read)?
            .is_some()
        {
            return Err(LifecycleError::AlreadyInYard { dealer, chassis });
        }

        let existing_report = match reason {
            Some(_) => self
                .store
                .locate_report(&dealer, &chassis)
                .await
                .map_err(LifecycleError::read)?,
            None => None,
        };

        // 3. 同批次写入
        let now = self.clock.now();
        let unit = ChassisUnit {
            chassis: chassis.clone(),
            dealer_slug: dealer.clone(),
            model: request.model.as_deref().map(str::trim).unwrap_or_default().to_string(),
            customer: request.customer.as_deref().map(str::trim).unwrap_or_default().to_string(),
            state,
            source: match state {
                UnitState::YardPending => source_tags::PENDING_APPROVAL,
                _ => source_tags::MANUAL,
            }
            .to_string(),
            received_at: Some(now),
            dispatched_at: None,
            handover_at: None,
            source_date: None,
        };

        let mut batch = WriteBatch::new().set(
            paths::yard_unit(&dealer, &chassis),
            encode_yard_unit(&unit).map_err(LifecycleError::write)?,
        );
        if let Some(reason) = &reason {
            let report_key = existing_report
                .as_ref()
                .map(|(key, _)| key.as_str())
                .unwrap_or(chassis.as_str());
            batch = stage_reason_writes(
                batch,
                &dealer,
                report_key,
                &chassis,
                reason,
                ReportSource::AddToYard,
                now,
                existing_report.is_none(),
            );
        }
        self.store
            .store()
            .commit(batch)
            .await
            .map_err(LifecycleError::write)?;

        info!(state = %state, with_reason = reason.is_some(), "车架已手工入场");

        let report = reason.map(|reason| {
            let mut report = existing_report.map(|(_, report)| report).unwrap_or_else(|| ReconciliationReport {
                chassis: chassis.clone(),
                dealer_slug: dealer.clone(),
                reason: None,
                custom_reason: None,
                note: None,
                source: None,
                created_at: Some(now),
                updated_at: None,
            });
            report.reason = Some(reason.reason);
            report.custom_reason = reason.custom_reason;
            report.source = Some(ReportSource::AddToYard);
            report.updated_at = Some(now);
            report
        });

        Ok(ManualAddOutcome { unit, report })
    }

    /// 审批待入场车架 (YardPending → YardStock)
    #[instrument(skip(self), fields(dealer = %dealer, chassis = %chassis))]
    pub async fn approve_pending(&self, dealer: &str, chassis: &str) -> LifecycleResult<ChassisUnit> {
        let chassis = parse_chassis(chassis)?;
        let key = parse_dealer_key(dealer)?;
        let dealer = self.resolve_dealer_key(&key).await?;

        let (stored_key, mut unit) = self
            .store
            .locate_yard_unit(&dealer, &chassis)
            .await
            .map_err(LifecycleError::read)?
            .ok_or_else(|| LifecycleError::NotInYard {
                dealer: dealer.clone(),
                chassis: chassis.clone(),
            })?;

        if unit.state != UnitState::YardPending {
            return Err(LifecycleError::InvalidStateTransition {
                from: unit.state.to_string(),
                to: UnitState::YardStock.to_string(),
            });
        }

        unit.state = UnitState::YardStock;
        unit.source = source_tags::MANUAL.to_string();
        if unit.received_at.is_none() {
            unit.received_at = Some(self.clock.now());
        }

        let mut batch = WriteBatch::new().set(
            paths::yard_unit(&dealer, &chassis),
            encode_yard_unit(&unit).map_err(LifecycleError::write)?,
        );
        if stored_key != chassis {
            batch = batch.remove(paths::yard_unit(&dealer, &stored_key));
        }
        self.store
            .store()
            .commit(batch)
            .await
            .map_err(LifecycleError::write)?;
        info!("待审批车架已入场");
        Ok(unit)
    }

    // ==========================================
    // 交付 (YardStock → Dispatched)
    // ==========================================

    /// 交付
    ///
    /// # 规则
    /// - 不在车场 → NotInYard；已有交付记录 → AlreadyDispatched
    /// - 待审批 → InvalidStateTransition
    /// - 写意图 → 删驻场 → 写交付 → 清意图
    ///
    /// # 失败
    /// - 删驻场失败: 尝试清意图，车架保持原状态
    /// - 写交付失败: 保留意图，由 recover_pending_dispatches 补写
    #[instrument(skip(self, request), fields(chassis = %request.chassis, dealer = %request.dealer))]
    pub async fn dispatch(&self, request: DispatchRequest) -> LifecycleResult<HandoverRecord> {
        // 1. 标识符校验
        let chassis = parse_chassis(&request.chassis)?;
        let key = parse_dealer_key(&request.dealer)?;
        let dealer = self.resolve_dealer_key(&key).await?;

        // 2. 状态校验
        let existing_handover = self
            .store
            .get_handover(&dealer, &chassis)
            .await
            .map_err(LifecycleError::read)?;
        if existing_handover.is_some() {
            return Err(LifecycleError::AlreadyDispatched { dealer, chassis });
        }

        let (stored_key, unit) = self
            .store
            .locate_yard_unit(&dealer, &chassis)
            .await
            .map_err(LifecycleError::read)?
            .ok_or_else(|| LifecycleError::NotInYard {
                dealer: dealer.clone(),
                chassis: chassis.clone(),
            })?;
        if unit.state != UnitState::YardStock {
            return Err(LifecycleError::InvalidStateTransition {
                from: unit.state.to_string(),
                to: UnitState::Dispatched.to_string(),
            });
        }

        let now = self.clock.now();
        let record = HandoverRecord {
            chassis: chassis.clone(),
            dealer_slug: dealer.clone(),
            dealer_name: request
                .dealer_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| prettify_dealer_name(&dealer)),
            model: unit.model.clone(),
            customer: unit.customer.clone(),
            handover_at: request.handover_at.unwrap_or(now),
            source: unit.source.clone(),
        };
        let intent = DispatchIntent {
            intent_id: Uuid::new_v4().to_string(),
            created_at: now,
            handover: record.clone(),
        };

        // 3. 写意图
        self.store
            .put_intent(&intent)
            .await
            .map_err(LifecycleError::write)?;

        // 4. 删驻场
        if let Err(e) = self.store.remove_yard_unit(&dealer, &stored_key).await {
            if let Err(clear_err) = self.store.clear_intent(&dealer, &chassis).await {
                warn!(intent_id = %intent.intent_id, "清除交付意图失败，留待清扫: {}", clear_err);
            }
            return Err(LifecycleError::write(e));
        }

        // 5. 写交付
        if let Err(e) = self.store.put_handover(&record).await {
            error!(
                intent_id = %intent.intent_id,
                "交付记录写入失败，驻场记录已删除，意图保留待恢复: {}", e
            );
            return Err(LifecycleError::write(e));
        }

        // 6. 清意图（失败不影响交付结果）
        if let Err(e) = self.store.clear_intent(&dealer, &chassis).await {
            warn!(intent_id = %intent.intent_id, "清除交付意图失败，留待清扫: {}", e);
        }

        info!(handover_at = %record.handover_at, "车架已交付");
        Ok(record)
    }

    // ==========================================
    // 对账报告 (不改变状态)
    // ==========================================

    /// 上报无效库存
    pub async fn report_invalid(
        &self,
        dealer: &str,
        chassis: &str,
        reason: &ReasonInput,
    ) -> LifecycleResult<ReconciliationReport> {
        self.reporter
            .upsert_report(dealer, chassis, reason, ReportSource::ReportInvalidStock)
            .await
    }

    /// 保存备注（不触碰原因）
    pub async fn annotate_note(
        &self,
        dealer: &str,
        chassis: &str,
        note: &str,
    ) -> LifecycleResult<Option<ReconciliationReport>> {
        self.reporter.upsert_note(dealer, chassis, note).await
    }

    // ==========================================
    // 恢复与审计
    // ==========================================

    /// 清扫残留交付意图（幂等）
    ///
    /// # 规则
    /// - 交付记录已存在 → 清意图
    /// - 驻场记录仍在 → 交付未生效，清意图（车架保持原状态）
    /// - 驻场记录已删、交付记录缺失 → 补写交付记录，清意图
    /// - 单条失败记入结果，不中断清扫
    #[instrument(skip(self))]
    pub async fn recover_pending_dispatches(&self) -> LifecycleResult<SweepReport> {
        let intents = self
            .store
            .list_intents()
            .await
            .map_err(LifecycleError::read)?;

        let mut report = SweepReport {
            scanned: intents.len(),
            ..SweepReport::default()
        };

        for intent in intents {
            let key = format!("{}/{}", intent.handover.dealer_slug, intent.handover.chassis);
            match self.resolve_intent(&intent).await {
                Ok(IntentResolution::Completed) => {
                    warn!(intent_id = %intent.intent_id, key = %key, "补写中断的交付记录");
                    report.completed.push(key);
                }
                Ok(IntentResolution::RolledBack) => {
                    info!(intent_id = %intent.intent_id, key = %key, "交付未生效，清除意图");
                    report.rolled_back.push(key);
                }
                Ok(IntentResolution::AlreadyDone) => report.already_done.push(key),
                Err(e) => {
                    error!(intent_id = %intent.intent_id, key = %key, "交付意图恢复失败: {}", e);
                    report.failed.push((key, e.to_string()));
                }
            }
        }

        if report.scanned > 0 {
            info!(
                scanned = report.scanned,
                completed = report.completed.len(),
                rolled_back = report.rolled_back.len(),
                failed = report.failed.len(),
                "交付意图清扫完成"
            );
        }
        Ok(report)
    }

    async fn resolve_intent(&self, intent: &DispatchIntent) -> LifecycleResult<IntentResolution> {
        let dealer = &intent.handover.dealer_slug;
        let chassis = &intent.handover.chassis;

        let resolution = if self
            .store
            .get_handover(dealer, chassis)
            .await
            .map_err(LifecycleError::read)?
            .is_some()
        {
            IntentResolution::AlreadyDone
        } else if self
            .store
            .get_yard_unit(dealer, chassis)
            .await
            .map_err(LifecycleError::read)?
            .is_some()
        {
            IntentResolution::RolledBack
        } else {
            self.store
                .put_handover(&intent.handover)
                .await
                .map_err(LifecycleError::write)?;
            IntentResolution::Completed
        };

        self.store
            .clear_intent(dealer, chassis)
            .await
            .map_err(LifecycleError::write)?;
        Ok(resolution)
    }

    /// 车场一致性审计（只读）
    #[instrument(skip(self), fields(dealer = %dealer))]
    pub async fn audit_yard(&self, dealer: &str) -> LifecycleResult<AuditReport> {
        let dealer = self.resolve_dealer(dealer).await?;

        let (units, in_transit, handovers, intents) = futures::try_join!(
            self.store.list_yard_units(&dealer),
            self.store.list_in_transit(),
            self.store.list_handovers(&dealer),
            self.store.list_intents(),
        )
        .map_err(LifecycleError::read)?;

        let transit: BTreeSet<&str> = in_transit.iter().map(|u| u.chassis.as_str()).collect();
        let handed_over: BTreeSet<&str> = handovers.iter().map(|h| h.chassis.as_str()).collect();

        let report = AuditReport {
            dealer: dealer.clone(),
            yard_count: units.len(),
            also_in_transit: units
                .iter()
                .filter(|u| transit.contains(u.chassis.as_str()))
                .map(|u| u.chassis.clone())
                .collect(),
            also_handed_over: units
                .iter()
                .filter(|u| handed_over.contains(u.chassis.as_str()))
                .map(|u| u.chassis.clone())
                .collect(),
            pending_intents: intents
                .iter()
                .filter(|i| i.handover.dealer_slug == dealer)
                .map(|i| i.handover.chassis.clone())
                .collect(),
        };

        if !report.is_consistent() {
            warn!(
                also_in_transit = report.also_in_transit.len(),
                also_handed_over = report.also_handed_over.len(),
                pending_intents = report.pending_intents.len(),
                "车场数据存在不一致"
            );
        }
        Ok(report)
    }
}
