// ==========================================
// 经销商车场运营系统 - CSV 在途数据源
// ==========================================
// 支持: 排产导出的 CSV 文件（表头按历史别名识别）
// 规则: 空行跳过；车架号为空的行跳过并告警；重复车架号后行覆盖前行
// ==========================================

use crate::domain::chassis::InTransitUnit;
use crate::feed::error::{FeedError, FeedResult};
use crate::feed::schedule_feed::ScheduleFeed;
use crate::identifier::normalize_chassis;
use crate::repository::record_decoder::{fields, RecordDecoder};
use async_trait::async_trait;
use csv::ReaderBuilder;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

// ==========================================
// CsvScheduleFeed
// ==========================================
/// 启动时一次性载入，之后只读
#[derive(Debug, Clone, Default)]
pub struct CsvScheduleFeed {
    units: BTreeMap<String, InTransitUnit>,
}

impl CsvScheduleFeed {
    /// 从 CSV 文件载入
    pub fn from_path(path: &Path) -> FeedResult<Self> {
        if !path.exists() {
            return Err(FeedError::FileNotFound(path.display().to_string()));
        }

        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(FeedError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        let feed = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            units = feed.len(),
            "在途 CSV 已载入"
        );
        Ok(feed)
    }

    /// 从任意读取器载入（表头必需）
    pub fn from_reader<R: std::io::Read>(reader: R) -> FeedResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let decoder = RecordDecoder::new();
        let mut units = BTreeMap::new();

        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut row = Map::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), Value::String(value.trim().to_string()));
                }
            }

            // 跳过完全空白的行
            if row.values().all(|v| v.as_str().map_or(true, str::is_empty)) {
                continue;
            }

            let chassis = decoder
                .get_string(&row, fields::CHASSIS)
                .map(|raw| normalize_chassis(&raw))
                .unwrap_or_default();
            if chassis.is_empty() {
                tracing::warn!(row = row_idx + 2, "在途行缺少车架号，跳过");
                continue;
            }

            let unit = InTransitUnit {
                chassis: chassis.clone(),
                model: decoder.get_string(&row, fields::MODEL).unwrap_or_default(),
                customer: decoder.get_string(&row, fields::CUSTOMER).unwrap_or_default(),
                dealer: decoder.get_string(&row, fields::DEALER).unwrap_or_default(),
                forecast_date: decoder.get_datetime(&row, fields::FORECAST_DATE),
            };
            if units.insert(chassis.clone(), unit).is_some() {
                tracing::warn!(chassis = %chassis, row = row_idx + 2, "车架号重复，后行覆盖前行");
            }
        }

        Ok(Self { units })
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[async_trait]
impl ScheduleFeed for CsvScheduleFeed {
    async fn lookup(&self, chassis: &str) -> FeedResult<Option<InTransitUnit>> {
        Ok(self.units.get(&normalize_chassis(chassis)).cloned())
    }

    async fn list(&self) -> FeedResult<Vec<InTransitUnit>> {
        Ok(self.units.values().cloned().collect())
    }
}
