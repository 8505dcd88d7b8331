// ==========================================
// 经销商车场运营系统 - 历史字段名解码器
// ==========================================
// 职责: 把存储中同一概念的多种历史字段名映射到唯一规范字段
// 红线: 完全无法识别的结构一律跳过并记日志（fail closed），不静默补默认值
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// 规范字段名
pub mod fields {
    pub const CHASSIS: &str = "chassis";
    pub const MODEL: &str = "model";
    pub const CUSTOMER: &str = "customer";
    pub const DEALER: &str = "dealer";
    pub const DEALER_SLUG: &str = "dealerSlug";
    pub const DEALER_NAME: &str = "dealerName";
    pub const STATE: &str = "state";
    pub const SOURCE: &str = "source";
    pub const RECEIVED_AT: &str = "receivedAt";
    pub const DISPATCHED_AT: &str = "dispatchedAt";
    pub const HANDOVER_AT: &str = "handoverAt";
    pub const SOURCE_DATE: &str = "sourceDate";
    pub const FORECAST_DATE: &str = "forecastDate";
    pub const REASON: &str = "reason";
    pub const CUSTOM_REASON: &str = "customReason";
    pub const NOTE: &str = "note";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const SHARE_TARGETS: &str = "shareTargets";
    pub const TIER_TARGETS: &str = "tierTargets";
    pub const RANGE_TIERS: &str = "rangeTiers";
    pub const LABEL: &str = "label";
    pub const ROLE: &str = "role";
    pub const MINIMUM: &str = "minimum";
    pub const CEILING: &str = "ceiling";
}

/// 规范字段 → 历史别名（按优先级）
fn aliases(key: &str) -> &'static [&'static str] {
    match key {
        fields::CHASSIS => &["chassis", "chassisNo", "chassisNumber", "Chassis", "chassis_no"],
        fields::MODEL => &["model", "Model", "modelName", "modelCode"],
        fields::CUSTOMER => &["customer", "Customer", "customerName", "customer_name"],
        fields::DEALER => &["dealer", "Dealer", "dealerName", "dealer_name"],
        fields::DEALER_SLUG => &["dealerSlug", "dealer_slug", "dealerId"],
        fields::DEALER_NAME => &["dealerName", "dealer_name", "dealer", "Dealer"],
        fields::STATE => &["state", "status"],
        fields::SOURCE => &["source", "Source"],
        fields::RECEIVED_AT => &["receivedAt", "received_at", "dateReceived", "receivedDate", "createdAt"],
        fields::DISPATCHED_AT => &["dispatchedAt", "dispatched_at", "dispatchDate"],
        fields::HANDOVER_AT => &["handoverAt", "handover_at", "handoverDate", "createdAt"],
        fields::SOURCE_DATE => &["sourceDate", "pgiDate", "PGIDate", "pgi_date"],
        fields::FORECAST_DATE => &["forecastDate", "forecastProductionDate", "Forecast Production Date", "eta"],
        fields::REASON => &["reason", "Reason"],
        fields::CUSTOM_REASON => &["customReason", "custom_reason", "otherReason"],
        fields::NOTE => &["note", "notes", "Note"],
        fields::CREATED_AT => &["createdAt", "created_at", "reportedAt"],
        fields::UPDATED_AT => &["updatedAt", "updated_at"],
        fields::SHARE_TARGETS => &["shareTargets", "share_targets", "shares", "tierShares"],
        fields::TIER_TARGETS => &["tierTargets", "tier_targets", "targets"],
        fields::RANGE_TIERS => &["rangeTiers", "range_tiers", "modelTiers"],
        fields::LABEL => &["label", "name"],
        fields::ROLE => &["role", "description"],
        fields::MINIMUM => &["minimum", "min", "minCount"],
        fields::CEILING => &["ceiling", "max", "maxCount", "cap"],
        _ => &[],
    }
}

// ==========================================
// RecordDecoder
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordDecoder;

impl RecordDecoder {
    pub fn new() -> Self {
        Self
    }

    /// 取原始值（按别名顺序第一个非 null）
    pub fn get_value<'a>(&self, map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
        aliases(key)
            .iter()
            .filter_map(|alias| map.get(*alias))
            .find(|v| !v.is_null())
    }

    /// 是否包含任一别名字段
    pub fn has_any(&self, map: &Map<String, Value>, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.get_value(map, key).is_some())
    }

    /// 取字符串（数字转字符串；去除首尾空白；空串视为缺失）
    pub fn get_string(&self, map: &Map<String, Value>, key: &str) -> Option<String> {
        aliases(key).iter().find_map(|alias| {
            let text = match map.get(*alias)? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        })
    }

    /// 取浮点数（兼容数字字符串）
    pub fn get_f64(&self, map: &Map<String, Value>, key: &str) -> Option<f64> {
        self.get_value(map, key).and_then(value_as_f64)
    }

    /// 取非负整数（兼容数字字符串，小数向下取整）
    pub fn get_u32(&self, map: &Map<String, Value>, key: &str) -> Option<u32> {
        self.get_f64(map, key)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.floor().min(u32::MAX as f64) as u32)
    }

    /// 取时间戳
    pub fn get_datetime(&self, map: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
        aliases(key)
            .iter()
            .filter_map(|alias| map.get(*alias))
            .find_map(parse_timestamp)
    }
}

/// 解析数值（数字或数字字符串）
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 解析时间戳
///
/// 支持:
/// - RFC 3339 (`2025-03-01T10:00:00Z`)
/// - `YYYY-MM-DD HH:MM:SS`
/// - `YYYY-MM-DD`
/// - `DD/MM/YYYY`
/// - 毫秒时间戳 (数字)
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(Utc.from_utc_datetime(&dt));
            }
            ["%Y-%m-%d", "%d/%m/%Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_alias_lookup_prefers_canonical() {
        let decoder = RecordDecoder::new();
        let map = as_map(json!({"chassisNumber": "old", "chassis": "new"}));
        assert_eq!(decoder.get_string(&map, fields::CHASSIS), Some("new".to_string()));

        let legacy = as_map(json!({"customerName": "  John Smith "}));
        assert_eq!(
            decoder.get_string(&legacy, fields::CUSTOMER),
            Some("John Smith".to_string())
        );
    }

    #[test]
    fn test_blank_string_is_missing() {
        let decoder = RecordDecoder::new();
        let map = as_map(json!({"customer": "   "}));
        assert_eq!(decoder.get_string(&map, fields::CUSTOMER), None);
    }

    #[test]
    fn test_timestamp_formats() {
        let iso = parse_timestamp(&json!("2025-03-01T10:00:00Z")).unwrap();
        assert_eq!(iso.to_rfc3339(), "2025-03-01T10:00:00+00:00");

        let au = parse_timestamp(&json!("01/03/2025")).unwrap();
        assert_eq!(au.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        let millis = parse_timestamp(&json!(1_740_823_200_000_i64)).unwrap();
        assert_eq!(millis.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        assert!(parse_timestamp(&json!("not a date")).is_none());
    }

    #[test]
    fn test_numeric_fields() {
        let decoder = RecordDecoder::new();
        let map = as_map(json!({"min": "3", "cap": 7.9}));
        assert_eq!(decoder.get_u32(&map, fields::MINIMUM), Some(3));
        assert_eq!(decoder.get_u32(&map, fields::CEILING), Some(7));
    }
}
