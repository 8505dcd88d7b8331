// ==========================================
// 经销商车场运营系统 - 生命周期存储适配器
// ==========================================
// 职责: 外部文档存储的无类型记录 ⇄ 生命周期实体
//   - 车架 (yardstock / pgirecord)
//   - 交付记录 (handover)
//   - 对账报告 (stockRectification)
//   - 交付意图 (dispatchIntent)
//   - 分层配置 (tierConfig)
// 红线: Repository 不含业务逻辑，只做数据映射
// 红线: 无法识别的记录跳过并记日志（fail closed）
// ==========================================

use crate::domain::chassis::{ChassisUnit, InTransitUnit};
use crate::domain::handover::{DispatchIntent, HandoverRecord};
use crate::domain::reconciliation::ReconciliationReport;
use crate::domain::tier::{TierConfig, TierTarget};
use crate::domain::types::{source_tags, ReconciliationReason, ReportSource, UnitState};
use crate::identifier::{normalize_chassis, normalize_dealer_slug, prettify_dealer_name};
use crate::repository::document_store::DocumentStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::paths;
use crate::repository::record_decoder::{fields, parse_timestamp, value_as_f64, RecordDecoder};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 车架记录的可识别字段（至少出现一个才视为有效结构）
const UNIT_FIELDS: &[&str] = &[
    fields::CHASSIS,
    fields::MODEL,
    fields::CUSTOMER,
    fields::DEALER,
    fields::STATE,
    fields::SOURCE,
    fields::RECEIVED_AT,
];

const REPORT_FIELDS: &[&str] = &[
    fields::REASON,
    fields::CUSTOM_REASON,
    fields::NOTE,
    fields::SOURCE,
    fields::CREATED_AT,
];

// ==========================================
// LifecycleStore - 存储适配器
// ==========================================
#[derive(Clone)]
pub struct LifecycleStore {
    store: Arc<dyn DocumentStore>,
    decoder: RecordDecoder,
}

impl LifecycleStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            decoder: RecordDecoder::new(),
        }
    }

    /// 底层文档存储
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // ==========================================
    // 键解析
    // ==========================================

    /// 解析经销商键
    ///
    /// # 规则
    /// - 无历史后缀 → 原样返回
    /// - 该键下已有数据 → 原样返回（引擎写出的 slug 再次传入时保持不变）
    /// - 否则去除历史 6 位后缀
    pub async fn resolve_dealer(&self, key: &str) -> RepositoryResult<String> {
        let stripped = normalize_dealer_slug(key);
        if stripped == key || stripped.is_empty() {
            return Ok(key.to_string());
        }
        if self.has_dealer_data(key).await? {
            debug!(dealer = %key, "经销商键已有数据，保留原样");
            return Ok(key.to_string());
        }
        Ok(stripped)
    }

    async fn has_dealer_data(&self, dealer: &str) -> RepositoryResult<bool> {
        let yard = paths::yard_dealer(dealer);
        let reports = paths::rectification_dealer(dealer);
        let handovers = paths::handover_dealer(dealer);
        let intents = paths::dispatch_intent_dealer(dealer);
        let (yard, reports, handovers, intents) = futures::try_join!(
            self.store.get(&yard),
            self.store.get(&reports),
            self.store.get(&handovers),
            self.store.get(&intents),
        )?;
        Ok(yard.is_some() || reports.is_some() || handovers.is_some() || intents.is_some())
    }

    /// 按车架号定位记录，返回实际存储键
    ///
    /// 精确路径未命中时，在经销商子节点中按规范化后的键匹配（历史数据用小写等形式作键）
    async fn locate(
        &self,
        dealer_path: &str,
        exact_path: &str,
        chassis: &str,
    ) -> RepositoryResult<Option<(String, Value)>> {
        if let Some(value) = self.store.get(exact_path).await? {
            return Ok(Some((chassis.to_string(), value)));
        }
        let siblings = self.store.get(dealer_path).await?;
        Ok(children(siblings).find(|(key, _)| key != chassis && normalize_chassis(key) == chassis))
    }

    // ==========================================
    // 车架 (yardstock)
    // ==========================================

    /// 查询驻场车架及其存储键
    pub async fn locate_yard_unit(
        &self,
        dealer: &str,
        chassis: &str,
    ) -> RepositoryResult<Option<(String, ChassisUnit)>> {
        let found = self
            .locate(&paths::yard_dealer(dealer), &paths::yard_unit(dealer, chassis), chassis)
            .await?;
        Ok(found.and_then(|(key, v)| self.decode_yard_unit(dealer, &key, &v).map(|unit| (key, unit))))
    }

    /// 查询驻场车架
    pub async fn get_yard_unit(
        &self,
        dealer: &str,
        chassis: &str,
    ) -> RepositoryResult<Option<ChassisUnit>> {
        Ok(self.locate_yard_unit(dealer, chassis).await?.map(|(_, unit)| unit))
    }

    /// 查询经销商全部驻场车架（按车架号排序）
    pub async fn list_yard_units(&self, dealer: &str) -> RepositoryResult<Vec<ChassisUnit>> {
        let value = self.store.get(&paths::yard_dealer(dealer)).await?;
        let mut units: Vec<ChassisUnit> = children(value)
            .filter_map(|(key, v)| self.decode_yard_unit(dealer, &key, &v))
            .collect();
        units.sort_by(|a, b| a.chassis.cmp(&b.chassis));
        Ok(units)
    }

    /// 删除驻场车架
    pub async fn remove_yard_unit(&self, dealer: &str, chassis: &str) -> RepositoryResult<()> {
        self.store.remove(&paths::yard_unit(dealer, chassis)).await
    }

    /// 存在驻场记录的经销商
    pub async fn list_yard_dealers(&self) -> RepositoryResult<Vec<String>> {
        let value = self.store.get(paths::YARD_STOCK).await?;
        Ok(children(value).map(|(key, _)| key).collect())
    }

    // ==========================================
    // 在途 (pgirecord)
    // ==========================================

    pub async fn get_in_transit(&self, chassis: &str) -> RepositoryResult<Option<InTransitUnit>> {
        let value = self.store.get(&paths::pgi_record(chassis)).await?;
        Ok(value.and_then(|v| self.decode_in_transit(chassis, &v)))
    }

    pub async fn list_in_transit(&self) -> RepositoryResult<Vec<InTransitUnit>> {
        let value = self.store.get(paths::PGI_RECORD).await?;
        let mut units: Vec<InTransitUnit> = children(value)
            .filter_map(|(key, v)| self.decode_in_transit(&key, &v))
            .collect();
        units.sort_by(|a, b| a.chassis.cmp(&b.chassis));
        Ok(units)
    }

    pub async fn put_in_transit(&self, unit: &InTransitUnit) -> RepositoryResult<()> {
        self.store
            .set(&paths::pgi_record(&unit.chassis), serde_json::to_value(unit)?)
            .await
    }

    pub async fn remove_in_transit(&self, chassis: &str) -> RepositoryResult<()> {
        self.store.remove(&paths::pgi_record(chassis)).await
    }

    // ==========================================
    // 交付记录 (handover)
    // ==========================================

    pub async fn get_handover(
        &self,
        dealer: &str,
        chassis: &str,
    ) -> RepositoryResult<Option<HandoverRecord>> {
        let found = self
            .locate(&paths::handover_dealer(dealer), &paths::handover_unit(dealer, chassis), chassis)
            .await?;
        Ok(found.and_then(|(key, v)| self.decode_handover(dealer, &key, &v)))
    }

    pub async fn list_handovers(&self, dealer: &str) -> RepositoryResult<Vec<HandoverRecord>> {
        let value = self.store.get(&paths::handover_dealer(dealer)).await?;
        let mut records: Vec<HandoverRecord> = children(value)
            .filter_map(|(key, v)| self.decode_handover(dealer, &key, &v))
            .collect();
        records.sort_by(|a, b| a.handover_at.cmp(&b.handover_at));
        Ok(records)
    }

    pub async fn put_handover(&self, record: &HandoverRecord) -> RepositoryResult<()> {
        self.store
            .set(
                &paths::handover_unit(&record.dealer_slug, &record.chassis),
                serde_json::to_value(record)?,
            )
            .await
    }

    // ==========================================
    // 对账报告 (stockRectification)
    // ==========================================

    /// 查询对账报告及其存储键
    pub async fn locate_report(
        &self,
        dealer: &str,
        chassis: &str,
    ) -> RepositoryResult<Option<(String, ReconciliationReport)>> {
        let found = self
            .locate(
                &paths::rectification_dealer(dealer),
                &paths::rectification_report(dealer, chassis),
                chassis,
            )
            .await?;
        Ok(found.and_then(|(key, v)| self.decode_report(dealer, &key, &v).map(|report| (key, report))))
    }

    pub async fn get_report(
        &self,
        dealer: &str,
        chassis: &str,
    ) -> RepositoryResult<Option<ReconciliationReport>> {
        Ok(self.locate_report(dealer, chassis).await?.map(|(_, report)| report))
    }

    pub async fn list_reports(&self, dealer: &str) -> RepositoryResult<Vec<ReconciliationReport>> {
        let value = self.store.get(&paths::rectification_dealer(dealer)).await?;
        let mut reports: Vec<ReconciliationReport> = children(value)
            .filter_map(|(key, v)| self.decode_report(dealer, &key, &v))
            .collect();
        reports.sort_by(|a, b| a.chassis.cmp(&b.chassis));
        Ok(reports)
    }

    pub async fn remove_report(&self, dealer: &str, chassis: &str) -> RepositoryResult<()> {
        self.store
            .remove(&paths::rectification_report(dealer, chassis))
            .await
    }

    // ==========================================
    // 交付意图 (dispatchIntent)
    // ==========================================

    pub async fn put_intent(&self, intent: &DispatchIntent) -> RepositoryResult<()> {
        self.store
            .set(
                &paths::dispatch_intent(&intent.handover.dealer_slug, &intent.handover.chassis),
                serde_json::to_value(intent)?,
            )
            .await
    }

    pub async fn clear_intent(&self, dealer: &str, chassis: &str) -> RepositoryResult<()> {
        self.store.remove(&paths::dispatch_intent(dealer, chassis)).await
    }

    /// 全部残留意图（按创建时间排序）
    pub async fn list_intents(&self) -> RepositoryResult<Vec<DispatchIntent>> {
        let value = self.store.get(paths::DISPATCH_INTENT).await?;
        let mut intents = Vec::new();
        for (dealer, dealer_value) in children(value) {
            for (chassis, raw) in children(Some(dealer_value)) {
                match serde_json::from_value::<DispatchIntent>(raw) {
                    Ok(intent) => intents.push(intent),
                    Err(e) => warn!(
                        dealer = %dealer,
                        chassis = %chassis,
                        "交付意图结构无法识别，跳过: {}", e
                    ),
                }
            }
        }
        intents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(intents)
    }

    // ==========================================
    // 分层配置 (tierConfig)
    // ==========================================

    /// 读取分层配置快照（不存在时返回基线配置）
    pub async fn load_tier_config(&self) -> RepositoryResult<TierConfig> {
        match self.store.get(paths::TIER_CONFIG).await? {
            None => Ok(TierConfig::default()),
            Some(Value::Object(map)) => Ok(self.decode_tier_config(&map)),
            Some(other) => Err(RepositoryError::UnrecognizedRecord {
                path: paths::TIER_CONFIG.to_string(),
                message: format!("期望对象，实际为 {}", other),
            }),
        }
    }

    pub async fn save_tier_config(&self, config: &TierConfig) -> RepositoryResult<()> {
        self.store
            .set(paths::TIER_CONFIG, serde_json::to_value(config)?)
            .await
    }

    // ==========================================
    // 解码
    // ==========================================

    /// 解码车架记录
    ///
    /// 状态缺失时: 来源为 pending-approval → YardPending，否则 YardStock
    pub fn decode_yard_unit(&self, dealer: &str, key: &str, value: &Value) -> Option<ChassisUnit> {
        let map = self.recognized_object(value, UNIT_FIELDS, &paths::yard_unit(dealer, key))?;
        let d = &self.decoder;

        let chassis = normalize_chassis(&d.get_string(map, fields::CHASSIS).unwrap_or_else(|| key.to_string()));
        if chassis.is_empty() {
            warn!(dealer = %dealer, key = %key, "车架号为空，跳过记录");
            return None;
        }

        let source = d
            .get_string(map, fields::SOURCE)
            .unwrap_or_else(|| source_tags::PGI.to_string());
        let state = d
            .get_string(map, fields::STATE)
            .and_then(|s| UnitState::parse(&s))
            .unwrap_or(if source == source_tags::PENDING_APPROVAL {
                UnitState::YardPending
            } else {
                UnitState::YardStock
            });

        Some(ChassisUnit {
            chassis,
            dealer_slug: dealer.to_string(),
            model: d.get_string(map, fields::MODEL).unwrap_or_default(),
            customer: d.get_string(map, fields::CUSTOMER).unwrap_or_default(),
            state,
            source,
            received_at: d.get_datetime(map, fields::RECEIVED_AT),
            dispatched_at: d.get_datetime(map, fields::DISPATCHED_AT),
            // 驻场记录不回退到 createdAt
            handover_at: map.get(fields::HANDOVER_AT).and_then(parse_timestamp),
            source_date: d.get_datetime(map, fields::SOURCE_DATE),
        })
    }

    /// 解码在途记录
    pub fn decode_in_transit(&self, key: &str, value: &Value) -> Option<InTransitUnit> {
        let map = self.recognized_object(value, UNIT_FIELDS, &paths::pgi_record(key))?;
        let d = &self.decoder;

        let chassis = normalize_chassis(&d.get_string(map, fields::CHASSIS).unwrap_or_else(|| key.to_string()));
        if chassis.is_empty() {
            warn!(key = %key, "在途记录车架号为空，跳过");
            return None;
        }

        Some(InTransitUnit {
            chassis,
            model: d.get_string(map, fields::MODEL).unwrap_or_default(),
            customer: d.get_string(map, fields::CUSTOMER).unwrap_or_default(),
            dealer: d.get_string(map, fields::DEALER).unwrap_or_default(),
            forecast_date: d.get_datetime(map, fields::FORECAST_DATE),
        })
    }

    /// 解码交付记录（交付时间缺失则跳过）
    pub fn decode_handover(&self, dealer: &str, key: &str, value: &Value) -> Option<HandoverRecord> {
        let path = paths::handover_unit(dealer, key);
        let map = self.recognized_object(value, UNIT_FIELDS, &path)?;
        let d = &self.decoder;

        let handover_at = match d.get_datetime(map, fields::HANDOVER_AT) {
            Some(ts) => ts,
            None => {
                warn!(path = %path, "交付记录缺少交付时间，跳过");
                return None;
            }
        };

        Some(HandoverRecord {
            chassis: normalize_chassis(&d.get_string(map, fields::CHASSIS).unwrap_or_else(|| key.to_string())),
            dealer_slug: dealer.to_string(),
            dealer_name: d
                .get_string(map, fields::DEALER_NAME)
                .unwrap_or_else(|| prettify_dealer_name(dealer)),
            model: d.get_string(map, fields::MODEL).unwrap_or_default(),
            customer: d.get_string(map, fields::CUSTOMER).unwrap_or_default(),
            handover_at,
            source: d
                .get_string(map, fields::SOURCE)
                .unwrap_or_else(|| source_tags::PGI.to_string()),
        })
    }

    /// 解码对账报告
    ///
    /// 原因不在固定枚举内的历史数据按 Other 处理，原文作为自定义原因
    pub fn decode_report(
        &self,
        dealer: &str,
        key: &str,
        value: &Value,
    ) -> Option<ReconciliationReport> {
        let path = paths::rectification_report(dealer, key);
        let map = self.recognized_object(value, REPORT_FIELDS, &path)?;
        let d = &self.decoder;

        let raw_reason = d.get_string(map, fields::REASON);
        let mut custom_reason = d.get_string(map, fields::CUSTOM_REASON);
        let reason = raw_reason.as_deref().map(|raw| match ReconciliationReason::parse(raw) {
            Some(reason) => reason,
            None => {
                debug!(path = %path, reason = %raw, "历史原因不在固定枚举内，按 Other 处理");
                if custom_reason.is_none() {
                    custom_reason = Some(raw.to_string());
                }
                ReconciliationReason::Other
            }
        });

        Some(ReconciliationReport {
            chassis: normalize_chassis(&d.get_string(map, fields::CHASSIS).unwrap_or_else(|| key.to_string())),
            dealer_slug: dealer.to_string(),
            reason,
            custom_reason,
            note: d.get_string(map, fields::NOTE),
            source: d
                .get_string(map, fields::SOURCE)
                .and_then(|s| ReportSource::parse(&s)),
            created_at: d.get_datetime(map, fields::CREATED_AT),
            updated_at: d.get_datetime(map, fields::UPDATED_AT),
        })
    }

    /// 解码分层配置
    pub fn decode_tier_config(&self, map: &Map<String, Value>) -> TierConfig {
        let d = &self.decoder;
        let mut config = TierConfig::default();

        if let Some(Value::Object(shares)) = d.get_value(map, fields::SHARE_TARGETS) {
            for (tier, raw) in shares {
                match value_as_f64(raw) {
                    Some(share) => {
                        config.share_targets.insert(tier.clone(), share);
                    }
                    None => warn!(tier = %tier, "分层配比不是数值，忽略覆盖"),
                }
            }
        }

        if let Some(Value::Object(targets)) = d.get_value(map, fields::TIER_TARGETS) {
            for (tier, raw) in targets {
                let Value::Object(target_map) = raw else {
                    warn!(tier = %tier, "分层目标结构无法识别，跳过");
                    continue;
                };
                config.tier_targets.insert(
                    tier.clone(),
                    TierTarget {
                        label: d
                            .get_string(target_map, fields::LABEL)
                            .unwrap_or_else(|| tier.clone()),
                        role: d.get_string(target_map, fields::ROLE).unwrap_or_default(),
                        minimum: d.get_u32(target_map, fields::MINIMUM).unwrap_or(0),
                        ceiling: d.get_u32(target_map, fields::CEILING),
                    },
                );
            }
        }

        if let Some(Value::Object(ranges)) = d.get_value(map, fields::RANGE_TIERS) {
            for (range, tier) in ranges {
                if let Some(tier) = tier.as_str() {
                    config
                        .range_tiers
                        .insert(range.trim().to_ascii_uppercase(), tier.to_string());
                }
            }
        }

        config
    }

    /// 校验对象结构：非对象或没有任何可识别字段 → 跳过并告警
    fn recognized_object<'a>(
        &self,
        value: &'a Value,
        known: &[&str],
        path: &str,
    ) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) if self.decoder.has_any(map, known) => Some(map),
            Value::Object(_) => {
                warn!(path = %path, "记录不含任何可识别字段，跳过");
                None
            }
            other => {
                warn!(path = %path, value = %other, "记录不是对象，跳过");
                None
            }
        }
    }
}

// ==========================================
// 编码
// ==========================================

/// 车架记录编码为规范字段
pub fn encode_yard_unit(unit: &ChassisUnit) -> RepositoryResult<Value> {
    Ok(serde_json::to_value(unit)?)
}

/// 展开子节点 (key, value)
fn children(value: Option<Value>) -> impl Iterator<Item = (String, Value)> {
    let map: BTreeMap<String, Value> = match value {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    };
    map.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_store::MemoryDocumentStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn adapter() -> (MemoryDocumentStore, LifecycleStore) {
        let memory = MemoryDocumentStore::new();
        let store = LifecycleStore::new(Arc::new(memory.clone()));
        (memory, store)
    }

    #[tokio::test]
    async fn test_decode_legacy_yard_record() {
        let (memory, store) = adapter();
        memory
            .set(
                "yardstock/st-james/1tpq205",
                json!({
                    "chassisNumber": "1tpq205",
                    "Model": "SRP19",
                    "customerName": "",
                    "dateReceived": "01/03/2025"
                }),
            )
            .await
            .unwrap();

        let units = store.list_yard_units("st-james").await.unwrap();
        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.chassis, "1TPQ205");
        assert_eq!(unit.model, "SRP19");
        assert_eq!(unit.customer, "");
        assert_eq!(unit.state, UnitState::YardStock);
        assert_eq!(unit.source, "PGI");
        assert_eq!(
            unit.received_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_lookup_finds_lowercase_legacy_key() {
        let (memory, store) = adapter();
        memory
            .set("yardstock/st-james/1tpq205", json!({"chassisNumber": "1tpq205", "Model": "SRP19"}))
            .await
            .unwrap();
        memory
            .set("stockRectification/st-james/1tpq205", json!({"reason": "Show"}))
            .await
            .unwrap();

        let (key, unit) = store.locate_yard_unit("st-james", "1TPQ205").await.unwrap().unwrap();
        assert_eq!(key, "1tpq205");
        assert_eq!(unit.chassis, "1TPQ205");

        let (key, report) = store.locate_report("st-james", "1TPQ205").await.unwrap().unwrap();
        assert_eq!(key, "1tpq205");
        assert_eq!(report.reason, Some(ReconciliationReason::Show));

        assert!(store.get_yard_unit("st-james", "OTHER1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_dealer_keeps_key_with_data() {
        let (memory, store) = adapter();
        assert_eq!(store.resolve_dealer("green-valley-x1y2z3").await.unwrap(), "green-valley");
        assert_eq!(store.resolve_dealer("green-valley").await.unwrap(), "green");
        assert_eq!(store.resolve_dealer("st-james").await.unwrap(), "st-james");

        memory
            .set("yardstock/green-valley/C1", json!({"model": "SRP19"}))
            .await
            .unwrap();
        assert_eq!(store.resolve_dealer("green-valley").await.unwrap(), "green-valley");
    }

    #[tokio::test]
    async fn test_unrecognized_records_are_skipped() {
        let (memory, store) = adapter();
        memory.set("yardstock/d/C1", json!({"model": "SRP"})).await.unwrap();
        memory.set("yardstock/d/C2", json!({"foo": "bar"})).await.unwrap();
        memory.set("yardstock/d/C3", json!("garbage")).await.unwrap();

        let units = store.list_yard_units("d").await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].chassis, "C1");
    }

    #[tokio::test]
    async fn test_pending_source_defaults_state() {
        let (memory, store) = adapter();
        memory
            .set("yardstock/d/C9", json!({"source": "pending-approval"}))
            .await
            .unwrap();
        let unit = store.get_yard_unit("d", "C9").await.unwrap().unwrap();
        assert_eq!(unit.state, UnitState::YardPending);
    }

    #[tokio::test]
    async fn test_legacy_free_text_reason_becomes_other() {
        let (memory, store) = adapter();
        memory
            .set(
                "stockRectification/d/C1",
                json!({"reason": "Written off", "notes": "hail damage"}),
            )
            .await
            .unwrap();
        let report = store.get_report("d", "C1").await.unwrap().unwrap();
        assert_eq!(report.reason, Some(ReconciliationReason::Other));
        assert_eq!(report.custom_reason.as_deref(), Some("Written off"));
        assert_eq!(report.note.as_deref(), Some("hail damage"));
    }

    #[tokio::test]
    async fn test_tier_config_variants() {
        let (memory, store) = adapter();
        memory
            .set(
                "tierConfig",
                json!({
                    "shares": {"A1": "0.5", "B1": 0.05},
                    "targets": {"A1": {"name": "Core", "min": 4, "cap": 30}},
                    "modelTiers": {"srp": "A1"}
                }),
            )
            .await
            .unwrap();

        let config = store.load_tier_config().await.unwrap();
        assert_eq!(config.share_targets.get("A1"), Some(&0.5));
        assert_eq!(config.share_targets.get("B1"), Some(&0.05));
        let a1 = config.tier_targets.get("A1").unwrap();
        assert_eq!(a1.label, "Core");
        assert_eq!(a1.minimum, 4);
        assert_eq!(a1.ceiling, Some(30));
        assert_eq!(config.range_tiers.get("SRP").map(String::as_str), Some("A1"));
    }

    #[tokio::test]
    async fn test_missing_tier_config_is_baseline() {
        let (_memory, store) = adapter();
        let config = store.load_tier_config().await.unwrap();
        assert_eq!(config, TierConfig::default());
    }
}
