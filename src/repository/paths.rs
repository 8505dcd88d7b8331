// ==========================================
// 经销商车场运营系统 - 存储路径约定
// ==========================================

pub const YARD_STOCK: &str = "yardstock";
pub const HANDOVER: &str = "handover";
pub const PGI_RECORD: &str = "pgirecord";
pub const STOCK_RECTIFICATION: &str = "stockRectification";
pub const TIER_CONFIG: &str = "tierConfig";
pub const DISPATCH_INTENT: &str = "dispatchIntent";

pub fn yard_dealer(dealer: &str) -> String {
    format!("{}/{}", YARD_STOCK, dealer)
}

pub fn yard_unit(dealer: &str, chassis: &str) -> String {
    format!("{}/{}/{}", YARD_STOCK, dealer, chassis)
}

pub fn handover_dealer(dealer: &str) -> String {
    format!("{}/{}", HANDOVER, dealer)
}

pub fn handover_unit(dealer: &str, chassis: &str) -> String {
    format!("{}/{}/{}", HANDOVER, dealer, chassis)
}

pub fn pgi_record(chassis: &str) -> String {
    format!("{}/{}", PGI_RECORD, chassis)
}

pub fn rectification_dealer(dealer: &str) -> String {
    format!("{}/{}", STOCK_RECTIFICATION, dealer)
}

pub fn rectification_report(dealer: &str, chassis: &str) -> String {
    format!("{}/{}/{}", STOCK_RECTIFICATION, dealer, chassis)
}

/// 对账报告的单个字段（部分写）
pub fn rectification_field(dealer: &str, chassis: &str, field: &str) -> String {
    format!("{}/{}/{}/{}", STOCK_RECTIFICATION, dealer, chassis, field)
}

pub fn dispatch_intent(dealer: &str, chassis: &str) -> String {
    format!("{}/{}/{}", DISPATCH_INTENT, dealer, chassis)
}

pub fn dispatch_intent_dealer(dealer: &str) -> String {
    format!("{}/{}", DISPATCH_INTENT, dealer)
}
