// ==========================================
// 经销商车场运营系统 - 标识符规范化
// ==========================================
// 职责: 经销商 slug 与车架号的确定性规范化（纯函数）
// 红线: 规范化失败必须在任何存储调用之前拒绝
// ==========================================

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// 历史标识符尾部的 6 位随机后缀 (`-xxxxxx`)
static LEGACY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)-([a-z0-9]{6})$").expect("Invalid legacy suffix regex"));

/// 标识符错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("车架号为空或无法规范化: {0:?}")]
    EmptyChassis(String),

    #[error("经销商标识为空或无法规范化: {0:?}")]
    EmptyDealer(String),
}

/// 车架号规范化: 去除空白与非法字符，转大写
///
/// 只保留 ASCII 字母数字与 '-'，保证可以安全作为存储路径段
pub fn normalize_chassis(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .map(|c| c.to_ascii_uppercase())
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

/// 规范化并校验车架号
pub fn parse_chassis(raw: &str) -> Result<String, IdentifierError> {
    let chassis = normalize_chassis(raw);
    if chassis.is_empty() {
        return Err(IdentifierError::EmptyChassis(raw.to_string()));
    }
    Ok(chassis)
}

/// slug 化: 小写，非 [a-z0-9] 连续段替换为 '-'，去除首尾 '-'
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// 经销商 slug 规范化: slug 化后去除历史 6 位后缀
pub fn normalize_dealer_slug(raw: &str) -> String {
    let slug = slugify(raw);
    match LEGACY_SUFFIX.captures(&slug) {
        Some(caps) => caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or(slug),
        None => slug,
    }
}

/// 规范化并校验经销商 slug
pub fn parse_dealer_slug(raw: &str) -> Result<String, IdentifierError> {
    let slug = normalize_dealer_slug(raw);
    if slug.is_empty() {
        return Err(IdentifierError::EmptyDealer(raw.to_string()));
    }
    Ok(slug)
}

/// 校验经销商键（只做 slug 化，不去除历史后缀）
///
/// 用于已规范化的 slug（存储中的键、引擎返回给调用方的值），
/// 历史后缀是否去除由存储适配器按已有数据决定
pub fn parse_dealer_key(raw: &str) -> Result<String, IdentifierError> {
    let key = slugify(raw);
    if key.is_empty() {
        return Err(IdentifierError::EmptyDealer(raw.to_string()));
    }
    Ok(key)
}

/// 原始经销商名称是否指向该 slug（去后缀前后任一形式相同即可）
pub fn dealer_matches(raw: &str, slug: &str) -> bool {
    slugify(raw) == slug || normalize_dealer_slug(raw) == slug
}

/// 经销商展示名: '-' 换成空格，每个单词首字母大写（仅展示）
pub fn prettify_dealer_name(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
