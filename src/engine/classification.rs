// ==========================================
// 经销商车场运营系统 - 车架读时分类
// ==========================================
// 纯函数，不是状态迁移:
// - 类型: customer 为空或以 "stock" 结尾（忽略大小写）→ Stock，否则 Customer
// - 车型系列: model 前 3 个字符大写 → 车架号前 3 个字符 → "OTHER"
// ==========================================

use crate::domain::chassis::ChassisUnit;
use crate::domain::types::UnitType;
use serde::{Deserialize, Serialize};

/// 无法识别车型系列时的兜底值
pub const OTHER_RANGE: &str = "OTHER";

const RANGE_PREFIX_LEN: usize = 3;

/// 按客户字段判定库存车/客户车
pub fn unit_type(customer: &str) -> UnitType {
    let customer = customer.trim();
    if customer.is_empty() || customer.to_lowercase().ends_with("stock") {
        UnitType::Stock
    } else {
        UnitType::Customer
    }
}

/// 车型系列
pub fn model_range(model: &str, chassis: &str) -> String {
    prefix(model)
        .or_else(|| prefix(chassis))
        .unwrap_or_else(|| OTHER_RANGE.to_string())
}

fn prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .chars()
            .take(RANGE_PREFIX_LEN)
            .collect::<String>()
            .to_uppercase(),
    )
}

// ==========================================
// ClassifiedUnit - 带派生字段的车架视图
// ==========================================
// 交给展示层的只读对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedUnit {
    #[serde(flatten)]
    pub unit: ChassisUnit,
    pub unit_type: UnitType,
    pub model_range: String,
}

impl ClassifiedUnit {
    pub fn classify(unit: ChassisUnit) -> Self {
        let unit_type = unit_type(&unit.customer);
        let model_range = model_range(&unit.model, &unit.chassis);
        Self {
            unit,
            unit_type,
            model_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_type() {
        assert_eq!(unit_type("ABC Pty Ltd Stock"), UnitType::Stock);
        assert_eq!(unit_type("John Smith"), UnitType::Customer);
        assert_eq!(unit_type(""), UnitType::Stock);
        assert_eq!(unit_type("  dealer STOCK  "), UnitType::Stock);
        assert_eq!(unit_type("Stockton Family"), UnitType::Customer);
    }

    #[test]
    fn test_model_range_fallbacks() {
        assert_eq!(model_range("srp19", "1TPQ205"), "SRP");
        assert_eq!(model_range("  ", "1tpq205"), "1TP");
        assert_eq!(model_range("", ""), OTHER_RANGE);
        assert_eq!(model_range("X", "1TPQ205"), "X");
    }
}
